//! 256-bit field elements carried by Groth16 proofs and their public signals.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::{Address, TypesError};

/// A 256-bit unsigned integer, stored big-endian.
///
/// Proof generators emit these as decimal strings; the ledger accepts either
/// decimal or `0x` hex and always renders hex.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldElement([u8; 32]);

impl FieldElement {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_u64(v: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&v.to_be_bytes());
        Self(bytes)
    }

    /// Build an element from little-endian packed bytes, the layout circuits
    /// use for revealed data (`bytes[0]` is the least significant byte).
    pub fn from_packed_bytes(packed: &[u8]) -> Result<Self, TypesError> {
        if packed.len() > 32 {
            return Err(TypesError::InvalidFieldElement(format!(
                "{} packed bytes exceed 32",
                packed.len()
            )));
        }
        let mut bytes = [0u8; 32];
        for (i, b) in packed.iter().enumerate() {
            bytes[31 - i] = *b;
        }
        Ok(Self(bytes))
    }

    pub fn as_be_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The value as a `u64`, if it fits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.0[..24].iter().any(|b| *b != 0) {
            return None;
        }
        let mut low = [0u8; 8];
        low.copy_from_slice(&self.0[24..]);
        Some(u64::from_be_bytes(low))
    }

    /// Byte `index` of the little-endian packing (`(self >> 8*index) & 0xff`).
    pub fn packed_byte(&self, index: usize) -> u8 {
        if index >= 32 {
            return 0;
        }
        self.0[31 - index]
    }

    /// Parse a decimal or `0x`-prefixed hex string.
    pub fn parse(s: &str) -> Result<Self, TypesError> {
        let s = s.trim();
        if let Some(digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            return Self::parse_hex(digits);
        }
        Self::parse_decimal(s)
    }

    fn parse_hex(digits: &str) -> Result<Self, TypesError> {
        if digits.is_empty() || digits.len() > 64 {
            return Err(TypesError::InvalidFieldElement(format!(
                "hex length {} out of range",
                digits.len()
            )));
        }
        let padded = format!("{digits:0>64}");
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|e| TypesError::InvalidFieldElement(format!("0x{digits}: {e}")))?;
        Ok(Self(bytes))
    }

    fn parse_decimal(digits: &str) -> Result<Self, TypesError> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TypesError::InvalidFieldElement(digits.to_string()));
        }
        let mut bytes = [0u8; 32];
        for d in digits.bytes() {
            // bytes = bytes * 10 + d, big-endian, carrying from the low end.
            let mut carry = (d - b'0') as u16;
            for b in bytes.iter_mut().rev() {
                let v = (*b as u16) * 10 + carry;
                *b = (v & 0xff) as u8;
                carry = v >> 8;
            }
            if carry != 0 {
                return Err(TypesError::InvalidFieldElement(format!(
                    "{digits}: exceeds 256 bits"
                )));
            }
        }
        Ok(Self(bytes))
    }
}

impl From<Address> for FieldElement {
    fn from(address: Address) -> Self {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(address.as_bytes());
        Self(bytes)
    }
}

impl FromStr for FieldElement {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_u64() {
            Some(v) => write!(f, "FieldElement({v})"),
            None => write!(f, "FieldElement(0x{}..)", hex::encode(&self.0[..4])),
        }
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            struct FieldVisitor;

            impl Visitor<'_> for FieldVisitor {
                type Value = FieldElement;

                fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str("a field element as a decimal or 0x-hex string")
                }

                fn visit_str<E: de::Error>(self, v: &str) -> Result<FieldElement, E> {
                    FieldElement::parse(v).map_err(E::custom)
                }

                fn visit_u64<E: de::Error>(self, v: u64) -> Result<FieldElement, E> {
                    Ok(FieldElement::from_u64(v))
                }
            }

            deserializer.deserialize_any(FieldVisitor)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(Self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_and_hex_agree() {
        let a = FieldElement::parse("255").unwrap();
        let b = FieldElement::parse("0xff").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_u64(), Some(255));
    }

    #[test]
    fn large_decimal_parses() {
        // 2^64
        let v = FieldElement::parse("18446744073709551616").unwrap();
        assert_eq!(v.to_u64(), None);
        assert_eq!(v.as_be_bytes()[23], 1);
    }

    #[test]
    fn decimal_overflow_rejected() {
        let too_big = "9".repeat(80);
        assert!(FieldElement::parse(&too_big).is_err());
    }

    #[test]
    fn packed_bytes_are_little_endian() {
        let v = FieldElement::from_packed_bytes(b"ABC").unwrap();
        assert_eq!(v.packed_byte(0), b'A');
        assert_eq!(v.packed_byte(2), b'C');
        assert_eq!(v.to_u64(), Some(0x43_42_41));
    }

    #[test]
    fn address_is_right_aligned() {
        let addr = Address::new([0x11; 20]);
        let f = FieldElement::from(addr);
        assert!(f.as_be_bytes()[..12].iter().all(|b| *b == 0));
        assert_eq!(f.as_be_bytes()[12], 0x11);
    }
}
