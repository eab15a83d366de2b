//! Error types for key hierarchy operations

use thiserror::Error;

use neurallog_crypto::CryptoError;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("key hierarchy is not initialized")]
    NotInitialized,

    #[error("no KEK version is currently active")]
    NoActiveKekVersion,

    #[error("unknown KEK version: {0}")]
    UnknownKekVersion(String),

    #[error("invalid KEK version: {0}")]
    VersionInvalid(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl KeyError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::NoActiveKekVersion => "no_active_kek_version",
            Self::UnknownKekVersion(_) => "unknown_kek_version",
            Self::VersionInvalid(_) => "version_invalid",
            Self::Crypto(inner) => inner.code(),
        }
    }
}

pub type Result<T> = std::result::Result<T, KeyError>;
