//! Challenge-response proofs of API-key possession
//!
//! An API key is `{keyId}.{secret}`. Proofs demonstrate knowledge of the
//! secret without transmitting it: the server issues a challenge, the
//! client answers with an HMAC keyed by the secret. Client tokens are the
//! self-signed variant used before a server round trip is available.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::encoding;
use crate::errors::{CryptoError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Client tokens expire one hour after issuance.
pub const CLIENT_TOKEN_TTL_SECS: i64 = 3600;

fn split_api_key(api_key: &str) -> Result<(&str, &str)> {
    match api_key.split_once('.') {
        Some((key_id, secret)) if !key_id.is_empty() && !secret.is_empty() => {
            Ok((key_id, secret))
        }
        _ => Err(CryptoError::FormatInvalid(
            "API key must be of the form {keyId}.{secret}".into(),
        )),
    }
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC key of any length");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Answer a server challenge: `{keyId}.{base64(HMAC(secret, challenge))}`.
pub fn prove_challenge(api_key: &str, challenge: &str) -> Result<String> {
    let (key_id, secret) = split_api_key(api_key)?;
    let mac = hmac_sha256(secret.as_bytes(), challenge.as_bytes());
    Ok(format!("{}.{}", key_id, encoding::encode(&mac)))
}

/// Recompute and compare a proof, in constant time over the MAC bytes.
pub fn verify_challenge(api_key: &str, challenge: &str, proof: &str) -> Result<bool> {
    let (key_id, secret) = split_api_key(api_key)?;
    let Some((proof_key_id, proof_mac)) = proof.split_once('.') else {
        return Err(CryptoError::FormatInvalid(
            "proof must be of the form {keyId}.{base64}".into(),
        ));
    };
    if proof_key_id != key_id {
        return Ok(false);
    }
    let expected = encoding::decode(proof_mac)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC key of any length");
    mac.update(challenge.as_bytes());
    Ok(mac.verify_slice(&expected).is_ok())
}

/// Claims carried by a client-assembled token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientTokenClaims {
    pub sub: String,
    pub tenant: String,
    pub scopes: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Assemble a signed client token: Base64 of `claimsJson.signature` where
/// the signature is `base64(HMAC(secret, claimsJson))`.
pub fn build_client_token(
    api_key: &str,
    user_id: &str,
    tenant_id: &str,
    scopes: &[String],
    issued_at: i64,
) -> Result<String> {
    build_client_token_with_ttl(
        api_key,
        user_id,
        tenant_id,
        scopes,
        issued_at,
        CLIENT_TOKEN_TTL_SECS,
    )
}

/// [`build_client_token`] with an explicit time-to-live.
pub fn build_client_token_with_ttl(
    api_key: &str,
    user_id: &str,
    tenant_id: &str,
    scopes: &[String],
    issued_at: i64,
    ttl_secs: i64,
) -> Result<String> {
    if ttl_secs <= 0 {
        return Err(CryptoError::ConfigInvalid(format!(
            "token TTL must be positive, got {}",
            ttl_secs
        )));
    }
    let (_, secret) = split_api_key(api_key)?;

    let claims = ClientTokenClaims {
        sub: user_id.to_string(),
        tenant: tenant_id.to_string(),
        scopes: scopes.to_vec(),
        iat: issued_at,
        exp: issued_at + ttl_secs,
    };
    let payload = serde_json::to_string(&claims)?;
    let signature = encoding::encode(&hmac_sha256(secret.as_bytes(), payload.as_bytes()));
    Ok(encoding::encode(format!("{}.{}", payload, signature).as_bytes()))
}

/// Check a token's signature (constant time) and return its claims.
///
/// Expiry is the caller's concern; the claims carry `iat` and `exp`.
pub fn verify_client_token(api_key: &str, token: &str) -> Result<ClientTokenClaims> {
    let (_, secret) = split_api_key(api_key)?;
    let decoded = encoding::decode(token)?;
    let text = String::from_utf8(decoded)
        .map_err(|_| CryptoError::FormatInvalid("token payload is not UTF-8".into()))?;

    // Base64 signatures contain no '.', so the last dot is the separator
    let Some((payload, signature)) = text.rsplit_once('.') else {
        return Err(CryptoError::FormatInvalid("token carries no signature".into()));
    };
    let expected = encoding::decode(signature)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC key of any length");
    mac.update(payload.as_bytes());
    mac.verify_slice(&expected)
        .map_err(|_| CryptoError::FormatInvalid("token signature mismatch".into()))?;

    Ok(serde_json::from_str(payload)?)
}
