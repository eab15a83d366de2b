//! NeuralLog client: encrypted log records and orchestration
//!
//! Ties the key hierarchy to the wire formats: envelope encryption of log
//! payloads and names, deterministic search tokens, and the session facade
//! that sequences encrypt-name -> encrypt-data -> tokenize -> emit against
//! the transport collaborators. The collaborators themselves are trait
//! seams; nothing in this crate performs I/O beyond them.

pub mod collaborators;
pub mod config;
pub mod errors;
pub mod payload;
pub mod search;
pub mod session;

pub use collaborators::{
    ApiKeyVerification, AuthProvider, KekProvision, KekVersionInfo, KekVersionStatus,
    LogEntrySummary, LogServer,
};
pub use config::ClientConfig;
pub use errors::{ClientError, Result};
pub use payload::{EncryptedLogPayload, LogData};
pub use session::{DecryptedRecord, LogSession};
