//! Deterministic search tokens
//!
//! One HMAC per query word lets the server match encrypted entries by
//! equality without learning the words. Tokenization is lowercase plus a
//! Unicode-whitespace split; stemming and stop-wording are out of scope
//! for v1.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use neurallog_crypto::encoding;

type HmacSha256 = Hmac<Sha256>;

/// Produce one URL-safe Base64 token per word of `query`, in order.
/// Duplicates are preserved; callers may dedupe.
pub fn generate_tokens(query: &str, search_key: &[u8; 32]) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            let mut mac =
                HmacSha256::new_from_slice(search_key).expect("HMAC key of any length");
            mac.update(word.as_bytes());
            encoding::encode_url(&mac.finalize().into_bytes())
        })
        .collect()
}
