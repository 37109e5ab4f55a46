//! Wei amounts.
//!
//! Amounts are fixed-point integers (u128) to avoid floating-point errors.
//! The smallest unit is 1 wei; 1 ETH = 10^18 wei.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Sub};

use crate::TypesError;

/// Number of wei in one ether.
pub const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;

const ETH_DECIMALS: usize = 18;

/// A value in wei.
///
/// Serialized as a decimal string in human-readable formats (JSON, TOML) so
/// that 128-bit values survive JavaScript clients, and as a raw integer in
/// binary formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Wei(u128);

impl Wei {
    pub const ZERO: Self = Self(0);

    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Whole ether to wei.
    pub const fn from_eth(eth: u128) -> Self {
        Self(eth * WEI_PER_ETH)
    }

    /// Thousandths of an ether to wei (`from_milli_eth(200)` is 0.2 ETH).
    pub const fn from_milli_eth(milli: u128) -> Self {
        Self(milli * (WEI_PER_ETH / 1000))
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Parse a decimal ether amount such as `"0.2"` or `"15"`.
    pub fn parse_eth(s: &str) -> Result<Self, TypesError> {
        let s = s.trim();
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(TypesError::InvalidAmount(s.to_string()));
        }
        if frac.len() > ETH_DECIMALS {
            return Err(TypesError::InvalidAmount(format!(
                "{s}: more than {ETH_DECIMALS} decimal places"
            )));
        }
        let parse_digits = |digits: &str| -> Result<u128, TypesError> {
            if digits.is_empty() {
                return Ok(0);
            }
            if !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(TypesError::InvalidAmount(s.to_string()));
            }
            digits
                .parse::<u128>()
                .map_err(|e| TypesError::InvalidAmount(format!("{s}: {e}")))
        };
        let whole_wei = parse_digits(whole)?
            .checked_mul(WEI_PER_ETH)
            .ok_or_else(|| TypesError::InvalidAmount(format!("{s}: overflow")))?;
        let padded = format!("{frac:0<width$}", width = ETH_DECIMALS);
        let frac_wei = parse_digits(&padded)?;
        whole_wei
            .checked_add(frac_wei)
            .map(Self)
            .ok_or_else(|| TypesError::InvalidAmount(format!("{s}: overflow")))
    }

    /// Render as a decimal ether string without trailing zeros (`"0.2"`).
    pub fn to_eth_string(&self) -> String {
        let whole = self.0 / WEI_PER_ETH;
        let frac = self.0 % WEI_PER_ETH;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{frac:0>width$}", width = ETH_DECIMALS);
        format!("{whole}.{}", frac.trim_end_matches('0'))
    }
}

impl Add for Wei {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Wei {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ETH", self.to_eth_string())
    }
}

impl From<u128> for Wei {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}

impl Serialize for Wei {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.0.to_string())
        } else {
            serializer.serialize_u128(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Wei {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            struct WeiVisitor;

            impl Visitor<'_> for WeiVisitor {
                type Value = Wei;

                fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str("a wei amount as a decimal string or integer")
                }

                fn visit_str<E: de::Error>(self, v: &str) -> Result<Wei, E> {
                    v.trim().parse::<u128>().map(Wei).map_err(E::custom)
                }

                fn visit_u64<E: de::Error>(self, v: u64) -> Result<Wei, E> {
                    Ok(Wei(v as u128))
                }

                fn visit_u128<E: de::Error>(self, v: u128) -> Result<Wei, E> {
                    Ok(Wei(v))
                }

                fn visit_i64<E: de::Error>(self, v: i64) -> Result<Wei, E> {
                    u128::try_from(v).map(Wei).map_err(E::custom)
                }
            }

            deserializer.deserialize_any(WeiVisitor)
        } else {
            u128::deserialize(deserializer).map(Self)
        }
    }
}
