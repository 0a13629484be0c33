//! Codec for the upstream's 24-hex-character Mongo-style foreign ids. The
//! first 4 bytes (big-endian) encode a Unix timestamp in seconds, the
//! remaining 8 bytes are opaque.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForeignId([u8; 12]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    WrongLength,
    InvalidHex,
}

impl ForeignId {
    pub fn parse(hex: &str) -> Result<Self, ParseError> {
        if hex.len() != 24 {
            return Err(ParseError::WrongLength);
        }
        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let s = &hex[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(s, 16).map_err(|_| ParseError::InvalidHex)?;
        }
        Ok(Self(bytes))
    }

    pub fn as_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Decodes the big-endian 32-bit timestamp prefix into `registered_since`.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let seconds = u32::from_be_bytes(self.0[0..4].try_into().unwrap());
        DateTime::from_timestamp(seconds as i64, 0).expect("u32 seconds is always in range")
    }

    /// Re-encodes a timestamp into the 4-byte prefix this id would carry,
    /// used to verify the round-trip property of §8.3.
    pub fn encode_timestamp(instant: DateTime<Utc>) -> [u8; 4] {
        (instant.timestamp() as u32).to_be_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn decodes_known_timestamp() {
        let id = ForeignId::parse("6390db9a9401bed7d6409dbb").unwrap();
        let expected = Utc.with_ymd_and_hms(2022, 12, 7, 18, 29, 46).unwrap();
        assert_eq!(id.timestamp(), expected);
    }

    #[test]
    fn round_trips_timestamp_prefix() {
        let id = ForeignId::parse("6390db9a9401bed7d6409dbb").unwrap();
        let prefix = &id.as_hex()[0..8];
        let reencoded = ForeignId::encode_timestamp(id.timestamp());
        let reencoded_hex: String =
            reencoded.iter().map(|b| format!("{:02x}", b)).collect();
        assert_eq!(reencoded_hex, prefix);
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(ForeignId::parse("abc"), Err(ParseError::WrongLength));
    }
}
