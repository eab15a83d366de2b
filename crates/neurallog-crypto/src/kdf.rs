//! Key derivation primitives
//! PBKDF2-HMAC-SHA-256 for phrase stretching, HKDF-SHA-256 for the key
//! hierarchy. Every derivation in the SDK names an explicit salt and info
//! string so that no two purposes can collide.

use hkdf::Hkdf;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::errors::{CryptoError, Result};

/// Default PBKDF2 iteration count for recovery-phrase stretching.
pub const PBKDF2_DEFAULT_ITERATIONS: u32 = 100_000;

/// Length of every derived key in the hierarchy.
pub const DERIVED_KEY_LEN: usize = 32;

/// Stretch a password or recovery phrase with PBKDF2-HMAC-SHA-256.
///
/// String salts are UTF-8 encoded verbatim by the caller.
pub fn pbkdf2_derive(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    length: usize,
) -> Result<Vec<u8>> {
    if iterations == 0 {
        return Err(CryptoError::Pbkdf2Failed(
            "iteration count must be non-zero".into(),
        ));
    }
    if length == 0 {
        return Err(CryptoError::Pbkdf2Failed(
            "output length must be non-zero".into(),
        ));
    }

    let mut okm = vec![0u8; length];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut okm);
    Ok(okm)
}

/// Extract-then-expand with HKDF-SHA-256.
pub fn hkdf_derive(ikm: &[u8], salt: &[u8], info: &[u8], length: usize) -> Result<Vec<u8>> {
    if length == 0 {
        return Err(CryptoError::HkdfFailed("output length must be non-zero".into()));
    }

    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = vec![0u8; length];
    hk.expand(info, &mut okm)
        .map_err(|_| CryptoError::HkdfFailed(format!("cannot expand to {} bytes", length)))?;
    Ok(okm)
}

/// HKDF-SHA-256 convenience for the 32-byte keys used throughout the hierarchy.
pub fn hkdf_derive_key(ikm: &[u8], salt: &[u8], info: &[u8]) -> Result<[u8; DERIVED_KEY_LEN]> {
    let okm = hkdf_derive(ikm, salt, info, DERIVED_KEY_LEN)?;
    let mut key = [0u8; DERIVED_KEY_LEN];
    key.copy_from_slice(&okm);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pbkdf2_deterministic() {
        let a = pbkdf2_derive(b"open sesame", b"neurallog:acme", 1000, 32).unwrap();
        let b = pbkdf2_derive(b"open sesame", b"neurallog:acme", 1000, 32).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_pbkdf2_salt_separates() {
        let a = pbkdf2_derive(b"open sesame", b"neurallog:acme", 1000, 32).unwrap();
        let b = pbkdf2_derive(b"open sesame", b"neurallog:globex", 1000, 32).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_pbkdf2_rejects_zero_iterations() {
        let err = pbkdf2_derive(b"pw", b"salt", 0, 32).unwrap_err();
        assert_eq!(err.code(), "derive_failed");
    }

    #[test]
    fn test_hkdf_deterministic_and_separated() {
        let ikm = [7u8; 32];
        let a = hkdf_derive_key(&ikm, b"NeuralLog-LogKey", b"logs").unwrap();
        let b = hkdf_derive_key(&ikm, b"NeuralLog-LogKey", b"logs").unwrap();
        let c = hkdf_derive_key(&ikm, b"NeuralLog-LogNameKey", b"log-names").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_hkdf_rejects_oversized_output() {
        // HKDF-SHA-256 tops out at 255 * 32 bytes
        let err = hkdf_derive(&[1u8; 32], b"salt", b"info", 255 * 32 + 1).unwrap_err();
        assert_eq!(err.code(), "derive_failed");
    }
}
