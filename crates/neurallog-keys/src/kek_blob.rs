//! Provisioning blobs: operational KEKs wrapped for a single user
//!
//! Recovery and admin-promotion flows hand an operational KEK to another
//! user by hybrid-encrypting it under that user's public wrapping key. The
//! registry collaborator stores the resulting blobs opaquely.

use zeroize::Zeroizing;

use neurallog_crypto::errors::CryptoError;
use neurallog_crypto::keypair::{self, KeyPair};

use crate::errors::Result;
use crate::hierarchy::KeyHierarchy;

/// Wrap the operational KEK for `version` under a recipient's SPKI public
/// key, producing the provisioning blob format.
pub fn wrap_for_user(
    hierarchy: &KeyHierarchy,
    version: &str,
    recipient_spki: &[u8],
) -> Result<Vec<u8>> {
    let kek = hierarchy.operational_kek(version)?;
    Ok(keypair::encrypt_for(recipient_spki, kek)?)
}

/// Unwrap a provisioning blob with the recipient key pair and install the
/// contained KEK under `version`. An already-present version is preserved
/// untouched.
pub fn unwrap_into(
    hierarchy: &mut KeyHierarchy,
    version: &str,
    blob: &[u8],
    recipient: &KeyPair,
) -> Result<()> {
    let plaintext = Zeroizing::new(recipient.decrypt(blob)?);
    if plaintext.len() != 32 {
        return Err(CryptoError::FormatInvalid(format!(
            "provisioned KEK is {} bytes, expected 32",
            plaintext.len()
        ))
        .into());
    }
    let mut kek = [0u8; 32];
    kek.copy_from_slice(&plaintext);
    hierarchy.register_version(version, kek)
}
