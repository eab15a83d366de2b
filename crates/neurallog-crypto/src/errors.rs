//! Error types for the crypto engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("PBKDF2 derivation failed: {0}")]
    Pbkdf2Failed(String),

    #[error("HKDF derivation failed: {0}")]
    HkdfFailed(String),

    #[error("AEAD operation failed: {0}")]
    AeadFailed(String),

    #[error("Malformed input: {0}")]
    FormatInvalid(String),

    #[error("Base64 decoding failed: {0}")]
    Base64Invalid(#[from] base64::DecodeError),

    #[error("Invalid mnemonic phrase: {0}")]
    MnemonicInvalid(String),

    #[error("Key pair operation failed: {0}")]
    KeyPairFailed(String),

    #[error("Shamir parameters rejected: {0}")]
    ShamirBadParams(String),

    #[error("Shamir shares have mismatched lengths")]
    ShamirMismatchedShareLengths,

    #[error("Shamir shares contain duplicate x coordinate {0}")]
    ShamirDuplicateX(u8),

    #[error("no inverse exists for the given share points")]
    ShamirNoModularInverse,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl CryptoError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigInvalid(_) => "config_invalid",
            Self::Pbkdf2Failed(_) | Self::HkdfFailed(_) => "derive_failed",
            Self::AeadFailed(_) => "aead_failed",
            Self::FormatInvalid(_) | Self::Base64Invalid(_) => "format_invalid",
            Self::MnemonicInvalid(_) => "mnemonic_invalid",
            Self::KeyPairFailed(_) => "keypair_failed",
            Self::ShamirBadParams(_) => "shamir_bad_params",
            Self::ShamirMismatchedShareLengths => "shamir_mismatched_share_lengths",
            Self::ShamirDuplicateX(_) => "shamir_duplicate_x",
            Self::ShamirNoModularInverse => "shamir_no_modular_inverse",
            Self::SerializationError(_) => "format_invalid",
        }
    }

    /// True for any of the Shamir engine rejection kinds.
    pub fn is_shamir(&self) -> bool {
        matches!(
            self,
            Self::ShamirBadParams(_)
                | Self::ShamirMismatchedShareLengths
                | Self::ShamirDuplicateX(_)
                | Self::ShamirNoModularInverse
        )
    }
}

pub type Result<T> = std::result::Result<T, CryptoError>;
