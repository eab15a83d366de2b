//! Hybrid public-key encryption
//!
//! Wraps a fresh AES-256-GCM key under an RSA-OAEP-SHA-256 recipient key
//! and seals the body symmetrically. Packed output:
//!
//! ```text
//! u32_le(wrapped_key_len) || IV(12) || wrapped_key || ciphertext || tag
//! ```
//!
//! Key pairs derived from hierarchy material are fully deterministic: the
//! RSA generator is driven by a ChaCha20 stream seeded via HKDF, so the
//! same `(operational KEK, password, user, purpose)` always reproduces the
//! same key pair on any platform.

use rand::rngs::OsRng;
use rand::RngCore;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use crate::aead;
use crate::errors::{CryptoError, Result};
use crate::kdf;

/// RSA modulus size for wrapping keys.
pub const RSA_MODULUS_BITS: usize = 2048;

const KEY_PAIR_SEED_SALT: &str = "NeuralLog-KeyPair";

/// An RSA-2048 wrapping key pair.
pub struct KeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl KeyPair {
    /// Generate a random key pair from the OS RNG.
    pub fn generate() -> Result<Self> {
        Self::from_rng(&mut OsRng)
    }

    /// Deterministically derive a key pair from hierarchy material.
    ///
    /// Identical inputs produce identical key pairs; the seed never leaves
    /// this function.
    pub fn derive(
        operational_kek: &[u8; 32],
        user_password: &str,
        user_id: &str,
        purpose: &str,
    ) -> Result<Self> {
        let mut ikm = Zeroizing::new(Vec::with_capacity(32 + user_password.len()));
        ikm.extend_from_slice(operational_kek);
        ikm.extend_from_slice(user_password.as_bytes());

        let info = format!("{}:{}", user_id, purpose);
        let mut seed = kdf::hkdf_derive_key(&ikm, KEY_PAIR_SEED_SALT.as_bytes(), info.as_bytes())?;

        let mut rng = ChaCha20Rng::from_seed(seed);
        seed.zeroize();
        Self::from_rng(&mut rng)
    }

    fn from_rng<R: rsa::rand_core::CryptoRngCore>(rng: &mut R) -> Result<Self> {
        let private = RsaPrivateKey::new(rng, RSA_MODULUS_BITS)
            .map_err(|e| CryptoError::KeyPairFailed(e.to_string()))?;
        let public = RsaPublicKey::from(&private);
        Ok(Self { private, public })
    }

    /// Export the public key as DER-encoded SPKI.
    pub fn public_key_der(&self) -> Result<Vec<u8>> {
        self.public
            .to_public_key_der()
            .map(|document| document.as_bytes().to_vec())
            .map_err(|e| CryptoError::KeyPairFailed(e.to_string()))
    }

    /// Unwrap and decrypt a blob produced by [`encrypt_for`].
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>> {
        let (wrapped_key, iv, body) = unpack(blob)?;

        let symmetric_key = Zeroizing::new(
            self.private
                .decrypt(Oaep::new::<Sha256>(), wrapped_key)
                .map_err(|e| CryptoError::KeyPairFailed(format!("key unwrap failed: {}", e)))?,
        );
        if symmetric_key.len() != 32 {
            return Err(CryptoError::FormatInvalid(format!(
                "wrapped key is {} bytes, expected 32",
                symmetric_key.len()
            )));
        }
        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(&symmetric_key);

        aead::open(&key, &iv, body)
    }
}

/// Encrypt `plaintext` for the holder of the given SPKI public key.
pub fn encrypt_for(recipient_spki: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let public = RsaPublicKey::from_public_key_der(recipient_spki)
        .map_err(|e| CryptoError::FormatInvalid(format!("bad SPKI public key: {}", e)))?;

    let mut symmetric_key = [0u8; 32];
    OsRng.fill_bytes(&mut symmetric_key);
    let iv = aead::generate_iv();

    let sealed = aead::seal(&symmetric_key, &iv, plaintext)?;
    let wrapped_key = public
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), symmetric_key.as_slice())
        .map_err(|e| CryptoError::KeyPairFailed(format!("key wrap failed: {}", e)))?;
    symmetric_key.zeroize();

    let mut blob =
        Vec::with_capacity(4 + aead::IV_LEN + wrapped_key.len() + sealed.len());
    blob.extend_from_slice(&(wrapped_key.len() as u32).to_le_bytes());
    blob.extend_from_slice(&iv);
    blob.extend_from_slice(&wrapped_key);
    blob.extend_from_slice(&sealed);
    Ok(blob)
}

fn unpack(blob: &[u8]) -> Result<(&[u8], [u8; aead::IV_LEN], &[u8])> {
    if blob.len() < 4 + aead::IV_LEN {
        return Err(CryptoError::FormatInvalid("blob shorter than header".into()));
    }
    let wrapped_len = u32::from_le_bytes([blob[0], blob[1], blob[2], blob[3]]) as usize;

    let mut iv = [0u8; aead::IV_LEN];
    iv.copy_from_slice(&blob[4..4 + aead::IV_LEN]);

    let body_start = 4 + aead::IV_LEN + wrapped_len;
    if blob.len() < body_start + aead::TAG_LEN {
        return Err(CryptoError::FormatInvalid(
            "blob truncated inside wrapped key or body".into(),
        ));
    }
    let wrapped_key = &blob[4 + aead::IV_LEN..body_start];
    let body = &blob[body_start..];
    Ok((wrapped_key, iv, body))
}
