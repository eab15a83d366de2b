//! AES-256-GCM primitive shared by the envelope formats
//!
//! Every ciphertext in the SDK is AES-256-GCM with a 12-byte random IV and
//! the 16-byte tag appended to the ciphertext. No associated data is used.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;

use crate::errors::{CryptoError, Result};

/// IV length in bytes (96-bit GCM nonce).
pub const IV_LEN: usize = 12;

/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Draw a fresh random IV from the OS RNG.
pub fn generate_iv() -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    rand::rngs::OsRng.fill_bytes(&mut iv);
    iv
}

/// Encrypt, returning `ciphertext || tag`.
pub fn seal(key: &[u8; 32], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CryptoError::AeadFailed(e.to_string()))?;
    cipher
        .encrypt(Nonce::from_slice(iv), plaintext)
        .map_err(|e| CryptoError::AeadFailed(e.to_string()))
}

/// Decrypt `ciphertext || tag`; fails closed on any tampering.
pub fn open(key: &[u8; 32], iv: &[u8; IV_LEN], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < TAG_LEN {
        return Err(CryptoError::AeadFailed("ciphertext shorter than tag".into()));
    }
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CryptoError::AeadFailed(e.to_string()))?;
    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| CryptoError::AeadFailed("authentication failed".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_round_trip() {
        let key = [0x42u8; 32];
        let iv = generate_iv();
        let sealed = seal(&key, &iv, b"log line").unwrap();
        assert_eq!(sealed.len(), b"log line".len() + TAG_LEN);
        assert_eq!(open(&key, &iv, &sealed).unwrap(), b"log line");
    }

    #[test]
    fn test_open_rejects_bit_flip() {
        let key = [0x42u8; 32];
        let iv = generate_iv();
        let mut sealed = seal(&key, &iv, b"log line").unwrap();
        for i in 0..sealed.len() {
            sealed[i] ^= 0x01;
            assert!(open(&key, &iv, &sealed).is_err(), "flip at byte {} accepted", i);
            sealed[i] ^= 0x01;
        }
    }

    #[test]
    fn test_open_rejects_wrong_key_and_iv() {
        let key = [0x42u8; 32];
        let iv = generate_iv();
        let sealed = seal(&key, &iv, b"log line").unwrap();

        let wrong_key = [0x43u8; 32];
        assert!(open(&wrong_key, &iv, &sealed).is_err());

        let mut wrong_iv = iv;
        wrong_iv[0] ^= 0x80;
        assert!(open(&key, &wrong_iv, &sealed).is_err());
    }

    #[test]
    fn test_open_rejects_truncated_input() {
        let key = [0u8; 32];
        let err = open(&key, &[0u8; IV_LEN], &[0u8; TAG_LEN - 1]).unwrap_err();
        assert_eq!(err.code(), "aead_failed");
    }
}
