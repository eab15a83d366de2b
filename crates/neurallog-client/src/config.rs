//! Client configuration

use serde::{Deserialize, Serialize};

use neurallog_crypto::kdf::PBKDF2_DEFAULT_ITERATIONS;
use neurallog_crypto::zkp::CLIENT_TOKEN_TTL_SECS;
use neurallog_keys::DEFAULT_KEK_VERSION;

/// Tunables for a client session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// PBKDF2 iteration count for recovery-phrase stretching.
    pub pbkdf2_iterations: u32,
    /// Version label used when a tenant initializes without history.
    pub default_kek_version: String,
    /// Lifetime of client-assembled tokens, in seconds.
    pub token_ttl_secs: i64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: PBKDF2_DEFAULT_ITERATIONS,
            default_kek_version: DEFAULT_KEK_VERSION.to_string(),
            token_ttl_secs: CLIENT_TOKEN_TTL_SECS,
        }
    }
}
