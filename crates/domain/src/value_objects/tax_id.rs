//! 14-digit company tax identifier with a two-pass mod-11 checksum.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A validated company tax identifier.
///
/// Stored as the 14 raw digits; punctuation is stripped on parse. The last
/// two digits are check digits derived from the preceding ones, so any
/// single-digit typo is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaxId(String);

impl TaxId {
    /// Number of digits in a normalized tax id.
    pub const LENGTH: usize = 14;

    /// Parses and validates a tax id, accepting formatted input such as
    /// `11.222.333/0001-81`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let digits: Vec<u8> = raw
            .chars()
            .filter_map(|c| c.to_digit(10))
            .map(|d| d as u8)
            .collect();

        if !Self::checksum_matches(&digits) {
            return Err(ValidationError::InvalidTaxId(raw.to_string()));
        }

        Ok(Self(digits.iter().map(|d| char::from(b'0' + d)).collect()))
    }

    /// Returns true if `raw` would parse.
    pub fn is_valid(raw: &str) -> bool {
        Self::parse(raw).is_ok()
    }

    /// Returns the 14 raw digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Renders as `NN.NNN.NNN/NNNN-NN`.
    pub fn formatted(&self) -> String {
        let d = &self.0;
        format!(
            "{}.{}.{}/{}-{}",
            &d[0..2],
            &d[2..5],
            &d[5..8],
            &d[8..12],
            &d[12..14]
        )
    }

    fn checksum_matches(digits: &[u8]) -> bool {
        if digits.len() != Self::LENGTH {
            return false;
        }

        let Some(&first) = digits.first() else {
            return false;
        };
        if digits.iter().all(|&d| d == first) {
            return false;
        }

        let (body, checks) = digits.split_at(Self::LENGTH - 2);
        let first_check = check_digit(body);
        if first_check != checks[0] {
            return false;
        }

        let second_check = check_digit(&digits[..Self::LENGTH - 1]);
        second_check == checks[1]
    }
}

/// Computes one check digit over `prefix`.
///
/// Weights start at `len - 7` on the most significant digit and count down,
/// wrapping from 2 back to 9.
fn check_digit(prefix: &[u8]) -> u8 {
    let mut weight = prefix.len() as u32 - 7;
    let mut sum = 0u32;

    for &digit in prefix {
        sum += u32::from(digit) * weight;
        weight -= 1;
        if weight < 2 {
            weight = 9;
        }
    }

    let remainder = sum % 11;
    if remainder < 2 { 0 } else { (11 - remainder) as u8 }
}

impl std::fmt::Display for TaxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaxId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TaxId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TaxId> for String {
    fn from(id: TaxId) -> Self {
        id.0
    }
}
