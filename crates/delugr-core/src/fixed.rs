//! The device's fixed-point parameter encoding: a signed 32-bit integer
//! stored as an 8-hex-digit token, remapped onto a 0-50 scale.

use serde::Serialize;

use crate::error::ParseError;

/// A decoded fixed-point value. Keeps the original hex token alongside the
/// 0-50 decimal so round-trip display and debugging stay possible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixedPoint {
    hex: String,
    decimal: u8,
}

impl FixedPoint {
    /// Decodes an 8-hex-digit two's-complement token, with or without a
    /// `0x` prefix. The full i32 range maps linearly onto `[0, 50]` with
    /// half-up rounding; malformed tokens are an error, never a clamp.
    pub fn decode(token: &str) -> Result<Self, ParseError> {
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);

        if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseError::InvalidFixedPoint {
                value: token.to_string(),
            });
        }

        let raw = u32::from_str_radix(digits, 16).map_err(|_| ParseError::InvalidFixedPoint {
            value: token.to_string(),
        })?;

        // Shift the signed range to [0, 2^32), scale by 50, round half-up.
        let shifted = (raw as i32) as i64 + 0x8000_0000;
        let decimal = ((shifted as u64 * 50 + 0x8000_0000) >> 32) as u8;

        Ok(FixedPoint {
            hex: token.to_string(),
            decimal,
        })
    }

    pub fn decimal(&self) -> u8 {
        self.decimal
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_anchors() {
        assert_eq!(FixedPoint::decode("0x80000000").unwrap().decimal(), 0);
        assert_eq!(FixedPoint::decode("0x7FFFFFFF").unwrap().decimal(), 50);
        assert_eq!(FixedPoint::decode("0x00000000").unwrap().decimal(), 25);
    }

    #[test]
    fn test_decode_without_prefix() {
        assert_eq!(FixedPoint::decode("00000000").unwrap().decimal(), 25);
        assert_eq!(FixedPoint::decode("C0000000").unwrap().decimal(), 13);
    }

    #[test]
    fn test_decode_keeps_original_token() {
        let v = FixedPoint::decode("0x4CCCCCA8").unwrap();
        assert_eq!(v.hex(), "0x4CCCCCA8");
        assert_eq!(v.decimal(), 40);
    }

    #[test]
    fn test_decode_rejects_malformed_tokens() {
        assert!(FixedPoint::decode("").is_err());
        assert!(FixedPoint::decode("0x123").is_err());
        assert!(FixedPoint::decode("0x123456789").is_err());
        assert!(FixedPoint::decode("0xZZZZZZZZ").is_err());
        assert!(FixedPoint::decode("25").is_err());
    }

    #[test]
    fn test_decode_is_total_over_valid_tokens() {
        for raw in [0u32, 1, 0x7FFF_FFFF, 0x8000_0000, 0x8000_0001, 0xFFFF_FFFF] {
            let token = format!("0x{raw:08X}");
            let v = FixedPoint::decode(&token).unwrap();
            assert!(v.decimal() <= 50);
        }
    }
}
