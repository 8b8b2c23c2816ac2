use crate::error::{RlpError, RlpResult};
use crate::header::Header;
use exec_primitives::{Address, Hash256, U256};

/// Cursor-based decoder over an in-memory RLP buffer. Each `get_*`/`next_*`
/// call advances the cursor past the item it decodes, so struct decoders
/// read fields in declaration order without tracking offsets by hand.
pub struct Rlp<'a> {
    buf: &'a [u8],
}

impl<'a> Rlp<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Rlp { buf }
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Enter a list item, returning a sub-decoder scoped to its payload and
    /// advancing past the whole list in the parent buffer.
    pub fn list(&mut self) -> RlpResult<Rlp<'a>> {
        let (header, header_len) = Header::decode(self.buf)?;
        if !header.list {
            return Err(RlpError::TypeUnexpected {
                expected: "list",
                found: "string",
            });
        }
        let start = header_len;
        let end = start + header.payload_length;
        let payload = &self.buf[start..end];
        self.buf = &self.buf[end..];
        Ok(Rlp::new(payload))
    }

    /// Decode the next item as a raw byte string (no further interpretation).
    pub fn bytes(&mut self) -> RlpResult<&'a [u8]> {
        let (header, header_len) = Header::decode(self.buf)?;
        if header.list {
            return Err(RlpError::TypeUnexpected {
                expected: "string",
                found: "list",
            });
        }
        let value = if header_len == 0 {
            &self.buf[0..1]
        } else {
            let start = header_len;
            let end = start + header.payload_length;
            &self.buf[start..end]
        };
        let total = if header_len == 0 { 1 } else { header_len + header.payload_length };
        self.buf = &self.buf[total..];
        Ok(value)
    }

    pub fn u64(&mut self) -> RlpResult<u64> {
        let bytes = self.bytes()?;
        if bytes.len() > 8 {
            return Err(RlpError::Overflow);
        }
        if !bytes.is_empty() && bytes[0] == 0 {
            return Err(RlpError::LeadingZero);
        }
        let mut padded = [0u8; 8];
        padded[8 - bytes.len()..].copy_from_slice(bytes);
        Ok(u64::from_be_bytes(padded))
    }

    pub fn u8(&mut self) -> RlpResult<u8> {
        let v = self.u64()?;
        u8::try_from(v).map_err(|_| RlpError::Overflow)
    }

    pub fn bool(&mut self) -> RlpResult<bool> {
        Ok(self.u64()? != 0)
    }

    pub fn u256(&mut self) -> RlpResult<U256> {
        let bytes = self.bytes()?;
        if bytes.len() > 32 {
            return Err(RlpError::Overflow);
        }
        if !bytes.is_empty() && bytes[0] == 0 {
            return Err(RlpError::LeadingZero);
        }
        Ok(U256::from_big_endian(bytes))
    }

    pub fn address(&mut self) -> RlpResult<Address> {
        let bytes = self.bytes()?;
        let arr: [u8; 20] = bytes.try_into().map_err(|_| RlpError::ArrayLengthUnexpected {
            expected: 20,
            found: bytes.len(),
        })?;
        Ok(Address(arr))
    }

    pub fn hash256(&mut self) -> RlpResult<Hash256> {
        let bytes = self.bytes()?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| RlpError::ArrayLengthUnexpected {
            expected: 32,
            found: bytes.len(),
        })?;
        Ok(Hash256(arr))
    }

    /// Decode an optional field encoded as the empty string for `None`.
    pub fn option_bytes(&mut self) -> RlpResult<Option<Vec<u8>>> {
        let bytes = self.bytes()?;
        Ok(if bytes.is_empty() {
            None
        } else {
            Some(bytes.to_vec())
        })
    }

    pub fn remaining(&self) -> &'a [u8] {
        self.buf
    }

    /// Assert the cursor has consumed its whole buffer — call at the end of
    /// every top-level decode to reject trailing garbage.
    pub fn finish(self) -> RlpResult<()> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(RlpError::InputTooLong)
        }
    }
}

/// Types that can be parsed back out of canonical RLP.
pub trait Decodable: Sized {
    fn rlp_decode(rlp: &mut Rlp<'_>) -> RlpResult<Self>;

    fn rlp_decode_complete(buf: &[u8]) -> RlpResult<Self> {
        let mut rlp = Rlp::new(buf);
        let value = Self::rlp_decode(&mut rlp)?;
        rlp.finish()?;
        Ok(value)
    }
}

impl Decodable for u64 {
    fn rlp_decode(rlp: &mut Rlp<'_>) -> RlpResult<Self> {
        rlp.u64()
    }
}

impl Decodable for bool {
    fn rlp_decode(rlp: &mut Rlp<'_>) -> RlpResult<Self> {
        Ok(rlp.u64()? != 0)
    }
}

impl Decodable for U256 {
    fn rlp_decode(rlp: &mut Rlp<'_>) -> RlpResult<Self> {
        rlp.u256()
    }
}

impl Decodable for Address {
    fn rlp_decode(rlp: &mut Rlp<'_>) -> RlpResult<Self> {
        rlp.address()
    }
}

impl Decodable for Hash256 {
    fn rlp_decode(rlp: &mut Rlp<'_>) -> RlpResult<Self> {
        rlp.hash256()
    }
}

impl Decodable for Vec<u8> {
    fn rlp_decode(rlp: &mut Rlp<'_>) -> RlpResult<Self> {
        Ok(rlp.bytes()?.to_vec())
    }
}

impl<T: Decodable> Decodable for Vec<T> {
    fn rlp_decode(rlp: &mut Rlp<'_>) -> RlpResult<Self> {
        let mut inner = rlp.list()?;
        let mut items = Vec::new();
        while !inner.is_empty() {
            items.push(T::rlp_decode(&mut inner)?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::Encodable;

    #[test]
    fn round_trips_u64_list() {
        let values: Vec<u64> = vec![0, 1, 127, 128, 300, 1 << 40];
        let encoded = crate::encode::encode_list(&values);
        let decoded: Vec<u64> = Vec::rlp_decode_complete(&encoded).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn round_trips_u256() {
        let v = U256::from_u64(0xdead_beef);
        let encoded = v.rlp_encode();
        let decoded = U256::rlp_decode_complete(&encoded).unwrap();
        assert_eq!(decoded, v);
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut encoded = 5u64.rlp_encode();
        encoded.push(0xff);
        let err = u64::rlp_decode_complete(&encoded).unwrap_err();
        assert_eq!(err, RlpError::InputTooLong);
    }

    #[test]
    fn rejects_leading_zero_integer() {
        let bytes = vec![0x82, 0x00, 0x01];
        let err = u64::rlp_decode_complete(&bytes).unwrap_err();
        assert_eq!(err, RlpError::LeadingZero);
    }

    #[test]
    fn address_round_trips() {
        let addr = Address([0x11; 20]);
        let encoded = addr.rlp_encode();
        let decoded = Address::rlp_decode_complete(&encoded).unwrap();
        assert_eq!(decoded, addr);
    }
}
