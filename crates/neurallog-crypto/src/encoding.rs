//! Base64 codecs for opaque byte strings
//!
//! Two alphabets are used on the wire: standard Base64 for JSON record
//! fields and serialized Shamir shares, URL-safe Base64 without padding for
//! encrypted log names and search tokens.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;

use crate::errors::Result;

/// Encode with the standard alphabet (padded).
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a standard-alphabet string.
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(encoded)?)
}

/// Encode with the URL-safe alphabet, no padding.
pub fn encode_url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode a URL-safe-alphabet string without padding.
pub fn decode_url(encoded: &str) -> Result<Vec<u8>> {
    Ok(URL_SAFE_NO_PAD.decode(encoded)?)
}

/// Serde adapter storing a byte vector as a standard-Base64 string.
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(&encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_standard_round_trip() {
        let data = b"NeuralLog opaque bytes \x00\xff\x10";
        assert_eq!(decode(&encode(data)).unwrap(), data);
    }

    #[test]
    fn test_url_safe_has_no_padding() {
        // 32 raw bytes encode to 43 characters URL-safe, never '='
        let token = encode_url(&[0xfbu8; 32]);
        assert_eq!(token.len(), 43);
        assert!(!token.contains('='));
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("not base64!!").is_err());
        assert!(decode_url("####").is_err());
    }

    proptest! {
        #[test]
        fn prop_url_safe_round_trip(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(decode_url(&encode_url(&bytes)).unwrap(), bytes);
        }

        #[test]
        fn prop_standard_round_trip(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(decode(&encode(&bytes)).unwrap(), bytes);
        }
    }
}
