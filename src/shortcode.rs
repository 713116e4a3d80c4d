use rand::RngExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of characters in every short code.
pub const CODE_LENGTH: usize = 6;

/// Case-sensitive letters followed by digits (62 symbols).
pub const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("short code must be exactly {len} characters from [A-Za-z0-9], got {0:?}", len = CODE_LENGTH)]
pub struct InvalidShortCode(pub String);

/// A validated short code.
///
/// Holds exactly [`CODE_LENGTH`] ASCII alphanumerics. Construction goes through
/// [`ShortCode::parse`] for untrusted input or [`ShortCode::random`] for fresh codes,
/// so a `ShortCode` in hand is always well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShortCode(String);

impl ShortCode {
    /// Validates `code` against the fixed length and alphabet.
    pub fn parse(code: &str) -> Result<Self, InvalidShortCode> {
        if code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            Ok(Self(code.to_string()))
        } else {
            Err(InvalidShortCode(code.to_string()))
        }
    }

    /// Draws [`CODE_LENGTH`] independent uniform symbols from [`ALPHABET`].
    pub fn random<R: RngExt + ?Sized>(rng: &mut R) -> Self {
        let code = (0..CODE_LENGTH)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShortCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ShortCode {
    type Error = InvalidShortCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShortCode> for String {
    fn from(code: ShortCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_alphanumeric_six_chars() {
        let code = ShortCode::parse("aB3xZ9").unwrap();
        assert_eq!(code.as_str(), "aB3xZ9");
        assert_eq!(code.to_string(), "aB3xZ9");
    }

    #[test]
    fn test_parse_rejects_bad_length_and_symbols() {
        for bad in ["", "abc", "abcdefg", "abc-12", "abc_12", "abc 12", "ábcdef", "../etc"] {
            assert!(ShortCode::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_random_codes_use_alphabet_and_length() {
        let mut rng = rand::rng();
        for _ in 0..1000 {
            let code = ShortCode::random(&mut rng);
            assert_eq!(code.as_str().len(), CODE_LENGTH);
            assert!(code.as_str().bytes().all(|b| ALPHABET.contains(&b)));
            assert!(ShortCode::parse(code.as_str()).is_ok());
        }
    }

    #[test]
    fn test_random_codes_cover_all_symbol_classes() {
        let mut rng = rand::rng();
        let mut upper = false;
        let mut lower = false;
        let mut digit = false;
        for _ in 0..1000 {
            for b in ShortCode::random(&mut rng).as_str().bytes() {
                upper |= b.is_ascii_uppercase();
                lower |= b.is_ascii_lowercase();
                digit |= b.is_ascii_digit();
            }
        }
        assert!(upper && lower && digit);
    }

    #[test]
    fn test_serde_validates() {
        let code: ShortCode = serde_json::from_str("\"aB3xZ9\"").unwrap();
        assert_eq!(code.as_str(), "aB3xZ9");
        assert!(serde_json::from_str::<ShortCode>("\"nope\"").is_err());
    }
}
