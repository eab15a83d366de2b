//! Error types for the client layer

use thiserror::Error;

use neurallog_crypto::CryptoError;
use neurallog_keys::KeyError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("failed to decrypt log data: {0}")]
    DecryptLogDataFailed(#[source] CryptoError),

    #[error("failed to decrypt log name: {0}")]
    DecryptLogNameFailed(String),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("collaborator call failed: {0}")]
    Collaborator(String),
}

impl ClientError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DecryptLogDataFailed(_) => "decrypt_log_data_failed",
            Self::DecryptLogNameFailed(_) => "decrypt_log_name_failed",
            Self::Key(inner) => inner.code(),
            Self::Crypto(inner) => inner.code(),
            Self::Collaborator(_) => "collaborator_failed",
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
