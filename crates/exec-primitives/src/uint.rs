//! 256/512-bit unsigned integers with the EVM-specific operations the
//! big-integer primitive (`spec.md` component A) needs beyond what a plain
//! big-integer crate provides: `SIGNEXTEND`, arithmetic shift right, and
//! big-endian wire conversions that round-trip through the RLP codec.

use primitive_types::{U256 as PU256, U512 as PU512};
use serde::{Deserialize, Serialize};

/// 256-bit unsigned integer, little-endian limb storage (inherited from
/// `primitive_types`), big-endian on the wire.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct U256(pub PU256);

/// 512-bit unsigned integer, used as the double-width accumulator for
/// `MULMOD`/`ADDMOD` style modular arithmetic without overflow.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct U512(pub PU512);

impl U256 {
    pub const ZERO: U256 = U256(PU256::zero());
    pub const ONE: U256 = U256(PU256([1, 0, 0, 0]));
    pub const MAX: U256 = U256(PU256::MAX);

    pub fn from_u64(v: u64) -> Self {
        U256(PU256::from(v))
    }

    /// Decode a big-endian byte string. Longer than 32 bytes is an error at
    /// the RLP layer; this constructor truncates the low 32 bytes only when
    /// the caller has already validated length (used internally by the RLP
    /// decoder after its own overflow check).
    pub fn from_big_endian(bytes: &[u8]) -> Self {
        U256(PU256::from_big_endian(bytes))
    }

    pub fn to_big_endian(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        self.0.to_big_endian(&mut out);
        out
    }

    /// Minimal big-endian encoding with no leading zero bytes, per the RLP
    /// canonical integer rule (`spec.md` §4.B) — zero encodes as empty.
    pub fn to_minimal_big_endian(&self) -> Vec<u8> {
        if self.is_zero() {
            return Vec::new();
        }
        let full = self.to_big_endian();
        let first_nonzero = full.iter().position(|&b| b != 0).unwrap();
        full[first_nonzero..].to_vec()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn bit(&self, index: usize) -> bool {
        self.0.bit(index)
    }

    pub fn bits(&self) -> u32 {
        self.0.bits() as u32
    }

    pub fn popcount(&self) -> u32 {
        (0..256).filter(|&i| self.0.bit(i)).count() as u32
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(U256)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(U256)
    }

    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        self.0.checked_mul(rhs.0).map(U256)
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        U256(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        U256(self.0.saturating_sub(rhs.0))
    }

    pub fn overflowing_add(self, rhs: Self) -> (Self, bool) {
        let (v, o) = self.0.overflowing_add(rhs.0);
        (U256(v), o)
    }

    pub fn overflowing_mul(self, rhs: Self) -> (Self, bool) {
        let (v, o) = self.0.overflowing_mul(rhs.0);
        (U256(v), o)
    }

    /// `ADDMOD`: `(self + rhs) % modulus`, computed in 512-bit space so the
    /// intermediate sum never overflows.
    pub fn add_mod(self, rhs: Self, modulus: Self) -> Self {
        if modulus.is_zero() {
            return U256::ZERO;
        }
        let wide = PU512::from(self.0) + PU512::from(rhs.0);
        U256((wide % PU512::from(modulus.0)).try_into().unwrap_or_default())
    }

    /// `MULMOD`: `(self * rhs) % modulus`, computed in 512-bit space.
    pub fn mul_mod(self, rhs: Self, modulus: Self) -> Self {
        if modulus.is_zero() {
            return U256::ZERO;
        }
        let wide = PU512::from(self.0) * PU512::from(rhs.0);
        U256((wide % PU512::from(modulus.0)).try_into().unwrap_or_default())
    }

    /// `EXP`: modular exponentiation by repeated squaring, matching the
    /// EVM's wraparound-on-overflow semantics (no modulus; it's implicit
    /// 2^256).
    pub fn pow_wrapping(self, mut exp: U256) -> Self {
        let mut base = self;
        let mut result = U256::ONE;
        while !exp.is_zero() {
            if exp.bit(0) {
                result = result.overflowing_mul(base).0;
            }
            base = base.overflowing_mul(base).0;
            exp = U256(exp.0 >> 1);
        }
        result
    }

    /// `SIGNEXTEND(byte_index, value)`: sign-extend `value` treating byte
    /// `byte_index` (0 = least significant) as the sign byte.
    pub fn signextend(byte_index: U256, value: U256) -> U256 {
        if byte_index >= U256::from_u64(32) {
            return value;
        }
        let byte_index = byte_index.0.as_u32() as usize;
        let bit_index = byte_index * 8 + 7;
        let sign_bit = value.bit(bit_index);
        let bytes = value.to_big_endian();
        let mut out = [0xffu8; 32];
        let keep_from = 32 - (byte_index + 1);
        out[keep_from..].copy_from_slice(&bytes[keep_from..]);
        if !sign_bit {
            out[..keep_from].iter_mut().for_each(|b| *b = 0);
        }
        U256::from_big_endian(&out)
    }

    /// `SAR`: arithmetic (sign-preserving) shift right by `shift` bits.
    pub fn arithmetic_shift_right(self, shift: U256) -> U256 {
        let negative = self.bit(255);
        if shift >= U256::from_u64(256) {
            return if negative { U256::MAX } else { U256::ZERO };
        }
        let shift = shift.0.as_u32() as usize;
        if !negative {
            return U256(self.0 >> shift);
        }
        // Sign-extend by filling in ones above the shifted bit width.
        let shifted = self.0 >> shift;
        let mask = if shift == 0 {
            PU256::zero()
        } else {
            PU256::MAX << (256 - shift)
        };
        U256(shifted | mask)
    }
}

impl std::ops::Add for U256 {
    type Output = U256;
    fn add(self, rhs: Self) -> Self::Output {
        U256(self.0 + rhs.0)
    }
}

impl std::ops::Sub for U256 {
    type Output = U256;
    fn sub(self, rhs: Self) -> Self::Output {
        U256(self.0 - rhs.0)
    }
}

impl std::ops::Mul for U256 {
    type Output = U256;
    fn mul(self, rhs: Self) -> Self::Output {
        U256(self.0 * rhs.0)
    }
}

impl std::ops::Div for U256 {
    type Output = U256;
    fn div(self, rhs: Self) -> Self::Output {
        U256(self.0 / rhs.0)
    }
}

impl std::ops::Rem for U256 {
    type Output = U256;
    fn rem(self, rhs: Self) -> Self::Output {
        U256(self.0 % rhs.0)
    }
}

impl From<u64> for U256 {
    fn from(v: u64) -> Self {
        U256::from_u64(v)
    }
}

impl From<u128> for U256 {
    fn from(v: u128) -> Self {
        U256(PU256::from(v))
    }
}
