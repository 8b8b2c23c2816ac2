use crate::header::Header;
use exec_primitives::{Address, Hash256, U256};

/// Types that can serialize themselves to canonical RLP.
pub trait Encodable {
    fn rlp_append(&self, out: &mut Vec<u8>);

    fn rlp_encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.rlp_append(&mut out);
        out
    }
}

pub fn encode_bytes(data: &[u8], out: &mut Vec<u8>) {
    if data.len() == 1 && data[0] < 0x80 {
        out.push(data[0]);
    } else {
        Header::encode_length_to(data.len(), 0x80, out);
        out.extend_from_slice(data);
    }
}

/// Append an already-encoded list payload with its list header.
pub fn encode_list_payload(payload: &[u8], out: &mut Vec<u8>) {
    Header::encode_length_to(payload.len(), 0xc0, out);
    out.extend_from_slice(payload);
}

/// Encode a homogeneous list of encodable items.
pub fn encode_list<T: Encodable>(items: &[T]) -> Vec<u8> {
    let mut payload = Vec::new();
    for item in items {
        item.rlp_append(&mut payload);
    }
    let mut out = Vec::with_capacity(payload.len() + 9);
    encode_list_payload(&payload, &mut out);
    out
}

/// Builder for heterogeneous lists (structs with mixed-type fields), used
/// by every `rlp_append` impl for a multi-field record.
#[derive(Default)]
pub struct ListEncoder {
    payload: Vec<u8>,
}

impl ListEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, item: &dyn Encodable) -> Self {
        item.rlp_append(&mut self.payload);
        self
    }

    pub fn raw_field(mut self, already_encoded: &[u8]) -> Self {
        self.payload.extend_from_slice(already_encoded);
        self
    }

    pub fn finish(self, out: &mut Vec<u8>) {
        encode_list_payload(&self.payload, out);
    }
}

impl Encodable for u64 {
    fn rlp_append(&self, out: &mut Vec<u8>) {
        let full = self.to_be_bytes();
        let start = full.iter().position(|&b| b != 0).unwrap_or(full.len() - 1);
        let minimal = if *self == 0 { &[][..] } else { &full[start..] };
        encode_bytes(minimal, out);
    }
}

impl Encodable for u8 {
    fn rlp_append(&self, out: &mut Vec<u8>) {
        (*self as u64).rlp_append(out);
    }
}

impl Encodable for bool {
    fn rlp_append(&self, out: &mut Vec<u8>) {
        (*self as u64).rlp_append(out);
    }
}

impl Encodable for Vec<u8> {
    fn rlp_append(&self, out: &mut Vec<u8>) {
        encode_bytes(self, out);
    }
}

impl Encodable for [u8] {
    fn rlp_append(&self, out: &mut Vec<u8>) {
        encode_bytes(self, out);
    }
}

impl Encodable for U256 {
    fn rlp_append(&self, out: &mut Vec<u8>) {
        encode_bytes(&self.to_minimal_big_endian(), out);
    }
}

impl Encodable for Address {
    fn rlp_append(&self, out: &mut Vec<u8>) {
        encode_bytes(self.as_bytes(), out);
    }
}

impl Encodable for Hash256 {
    fn rlp_append(&self, out: &mut Vec<u8>) {
        encode_bytes(self.as_bytes(), out);
    }
}

impl<T: Encodable> Encodable for Option<T> {
    fn rlp_append(&self, out: &mut Vec<u8>) {
        match self {
            Some(v) => v.rlp_append(out),
            None => encode_bytes(&[], out),
        }
    }
}
