//! Versioned key hierarchy for the NeuralLog client SDK
//!
//! Derives `master secret -> master KEK -> operational KEKs -> per-purpose
//! subkeys` and tracks which KEK version is current. All key material lives
//! in process memory only and is zeroized on teardown.

pub mod errors;
pub mod hierarchy;
pub mod kek_blob;

pub use errors::{KeyError, Result};
pub use hierarchy::{Credential, KeyHierarchy, KeyPurpose, DEFAULT_KEK_VERSION};
