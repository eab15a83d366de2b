//! Client-side cryptographic engine for the NeuralLog zero-knowledge logging SDK
//!
//! Everything in this crate runs locally: plaintext and key material never
//! leave the process. The key hierarchy and log-record formats built on top
//! of these primitives live in `neurallog-keys` and `neurallog-client`.

pub mod aead;
pub mod encoding;
pub mod errors;
pub mod kdf;
pub mod keypair;
pub mod mnemonic;
pub mod shamir;
pub mod zkp;

pub use errors::{CryptoError, Result};
pub use keypair::KeyPair;
pub use shamir::SecretShare;
pub use zkp::ClientTokenClaims;
