//! Envelope encryption of log payloads and log names
//!
//! Both formats are AES-256-GCM under per-purpose subkeys and carry enough
//! metadata to locate their decrypting KEK version without external hints:
//! payload records name the version in a JSON field, encrypted names embed
//! it behind a one-byte length prefix.

use serde::{Deserialize, Serialize};

use neurallog_crypto::errors::CryptoError;
use neurallog_crypto::{aead, encoding};
use neurallog_keys::{KeyHierarchy, KeyPurpose};

use crate::errors::{ClientError, Result};

/// The only payload algorithm in v1.
pub const LOG_ALGORITHM: &str = "aes-256-gcm";

/// Wire record for an encrypted log payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedLogPayload {
    pub encrypted: bool,
    pub algorithm: String,
    /// Standard Base64 of the 12-byte IV.
    pub iv: String,
    /// Standard Base64 of `ciphertext || tag`.
    pub data: String,
    #[serde(rename = "kekVersion")]
    pub kek_version: String,
}

/// Log payload content as seen at the API boundary. The engine itself
/// only ever touches bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogData {
    Json(serde_json::Value),
    Text(String),
    Bytes(Vec<u8>),
}

impl LogData {
    fn to_plaintext(&self) -> Result<Vec<u8>> {
        match self {
            // serde_json orders object keys, so this is deterministic
            Self::Json(value) => Ok(serde_json::to_vec(value).map_err(CryptoError::from)?),
            Self::Text(text) => Ok(text.as_bytes().to_vec()),
            Self::Bytes(bytes) => Ok(bytes.clone()),
        }
    }

    fn from_plaintext(bytes: Vec<u8>) -> Self {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&bytes) {
            return Self::Json(value);
        }
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text(text),
            Err(error) => Self::Bytes(error.into_bytes()),
        }
    }
}

impl From<serde_json::Value> for LogData {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<&str> for LogData {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Encrypt a payload under the current KEK version's log key.
pub fn encrypt_log_data(hierarchy: &KeyHierarchy, data: &LogData) -> Result<EncryptedLogPayload> {
    let (version, _) = hierarchy.current_kek()?;
    let log_key = hierarchy.subkey(version, KeyPurpose::Logs)?;

    let plaintext = data.to_plaintext()?;
    let iv = aead::generate_iv();
    let sealed = aead::seal(&log_key, &iv, &plaintext)?;

    Ok(EncryptedLogPayload {
        encrypted: true,
        algorithm: LOG_ALGORITHM.to_string(),
        iv: encoding::encode(&iv),
        data: encoding::encode(&sealed),
        kek_version: version.to_string(),
    })
}

/// Decrypt a payload record, selecting the KEK by its `kekVersion` field.
pub fn decrypt_log_data(hierarchy: &KeyHierarchy, record: &EncryptedLogPayload) -> Result<LogData> {
    if !record.encrypted {
        return Err(CryptoError::FormatInvalid("record is not encrypted".into()).into());
    }
    if record.algorithm != LOG_ALGORITHM {
        return Err(CryptoError::FormatInvalid(format!(
            "unsupported algorithm {:?}",
            record.algorithm
        ))
        .into());
    }

    // Fails with UnknownKekVersion before any ciphertext is touched
    let log_key = hierarchy.subkey(&record.kek_version, KeyPurpose::Logs)?;

    let iv_bytes = encoding::decode(&record.iv)?;
    let iv: [u8; aead::IV_LEN] = iv_bytes.as_slice().try_into().map_err(|_| {
        CryptoError::FormatInvalid(format!("IV is {} bytes, expected 12", iv_bytes.len()))
    })?;
    let ciphertext = encoding::decode(&record.data)?;

    let plaintext =
        aead::open(&log_key, &iv, &ciphertext).map_err(ClientError::DecryptLogDataFailed)?;
    Ok(LogData::from_plaintext(plaintext))
}

/// Encrypt a log name under the current version's log-name key.
///
/// Output is URL-safe Base64 (no padding) of
/// `len(1) || version || IV(12) || ciphertext || tag`.
pub fn encrypt_log_name(hierarchy: &KeyHierarchy, name: &str) -> Result<String> {
    let (version, _) = hierarchy.current_kek()?;
    if version.len() > u8::MAX as usize {
        return Err(CryptoError::FormatInvalid(
            "version label exceeds the one-byte length prefix".into(),
        )
        .into());
    }
    let name_key = hierarchy.subkey(version, KeyPurpose::LogNames)?;

    let iv = aead::generate_iv();
    let sealed = aead::seal(&name_key, &iv, name.as_bytes())?;

    let mut packed = Vec::with_capacity(1 + version.len() + aead::IV_LEN + sealed.len());
    packed.push(version.len() as u8);
    packed.extend_from_slice(version.as_bytes());
    packed.extend_from_slice(&iv);
    packed.extend_from_slice(&sealed);
    Ok(encoding::encode_url(&packed))
}

/// Decrypt an encrypted log name, selecting the KEK by the embedded
/// version prefix.
pub fn decrypt_log_name(hierarchy: &KeyHierarchy, encrypted_name: &str) -> Result<String> {
    let packed = encoding::decode_url(encrypted_name)
        .map_err(|e| ClientError::DecryptLogNameFailed(e.to_string()))?;

    let Some((&version_len, rest)) = packed.split_first() else {
        return Err(ClientError::DecryptLogNameFailed("empty packing".into()));
    };
    let version_len = version_len as usize;
    if rest.len() < version_len + aead::IV_LEN + aead::TAG_LEN {
        return Err(ClientError::DecryptLogNameFailed(
            "packing truncated inside version or IV".into(),
        ));
    }
    let version = std::str::from_utf8(&rest[..version_len])
        .map_err(|_| ClientError::DecryptLogNameFailed("version is not UTF-8".into()))?;
    let iv: [u8; aead::IV_LEN] = rest[version_len..version_len + aead::IV_LEN]
        .try_into()
        .expect("slice is IV_LEN bytes");
    let ciphertext = &rest[version_len + aead::IV_LEN..];

    let name_key = hierarchy.subkey(version, KeyPurpose::LogNames)?;
    let plaintext = aead::open(&name_key, &iv, ciphertext)
        .map_err(|e| ClientError::DecryptLogNameFailed(e.to_string()))?;
    String::from_utf8(plaintext)
        .map_err(|_| ClientError::DecryptLogNameFailed("name is not UTF-8".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurallog_keys::Credential;
    use serde_json::json;

    fn hierarchy(versions: &[&str]) -> KeyHierarchy {
        KeyHierarchy::initialize_with_iterations(
            "acme",
            Credential::RecoveryPhrase("open sesame"),
            versions,
            1_000,
        )
        .unwrap()
    }

    #[test]
    fn test_log_name_round_trip() {
        let h = hierarchy(&["v1"]);
        let encrypted = encrypt_log_name(&h, "auth-events").unwrap();
        assert!(!encrypted.contains('='));
        assert_eq!(decrypt_log_name(&h, &encrypted).unwrap(), "auth-events");
    }

    #[test]
    fn test_log_name_round_trip_unicode() {
        let h = hierarchy(&["v1"]);
        let name = "journal-d'accès-日誌";
        let encrypted = encrypt_log_name(&h, name).unwrap();
        assert_eq!(decrypt_log_name(&h, &encrypted).unwrap(), name);
    }

    #[test]
    fn test_log_data_round_trip_json() {
        let h = hierarchy(&["v1"]);
        let data = LogData::Json(json!({"level": "info", "msg": "hi"}));
        let record = encrypt_log_data(&h, &data).unwrap();

        assert!(record.encrypted);
        assert_eq!(record.algorithm, "aes-256-gcm");
        assert_eq!(record.kek_version, "v1");
        assert_eq!(decrypt_log_data(&h, &record).unwrap(), data);
    }

    #[test]
    fn test_log_data_round_trip_text() {
        let h = hierarchy(&["v1"]);
        let data = LogData::from("connection reset by peer");
        let record = encrypt_log_data(&h, &data).unwrap();
        assert_eq!(decrypt_log_data(&h, &record).unwrap(), data);
    }

    #[test]
    fn test_record_serializes_with_camel_case_version() {
        let h = hierarchy(&["v1"]);
        let record = encrypt_log_data(&h, &LogData::from("x")).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["kekVersion"], "v1");
        assert_eq!(value["encrypted"], true);
    }

    #[test]
    fn test_decrypt_selects_version_from_record() {
        // Encrypt under v1, rotate to v2, decrypt still succeeds
        let mut h = hierarchy(&["v1", "v2"]);
        h.set_current("v1").unwrap();
        let record = encrypt_log_data(&h, &LogData::from("old entry")).unwrap();
        let name = encrypt_log_name(&h, "rotation-log").unwrap();

        h.set_current("v2").unwrap();
        assert_eq!(
            decrypt_log_data(&h, &record).unwrap(),
            LogData::from("old entry")
        );
        assert_eq!(decrypt_log_name(&h, &name).unwrap(), "rotation-log");
    }

    #[test]
    fn test_unknown_version_fails_closed() {
        let h1 = hierarchy(&["v1"]);
        let record = encrypt_log_data(&h1, &LogData::from("secret")).unwrap();
        let name = encrypt_log_name(&h1, "secret-log").unwrap();

        let h2 = hierarchy(&["v2"]);
        let err = decrypt_log_data(&h2, &record).unwrap_err();
        assert_eq!(err.code(), "unknown_kek_version");
        let err = decrypt_log_name(&h2, &name).unwrap_err();
        assert_eq!(err.code(), "unknown_kek_version");
    }

    #[test]
    fn test_tampered_record_fails() {
        let h = hierarchy(&["v1"]);
        let record = encrypt_log_data(&h, &LogData::from("payload")).unwrap();

        // Flip one bit inside the ciphertext
        let mut data = neurallog_crypto::encoding::decode(&record.data).unwrap();
        data[0] ^= 0x01;
        let tampered = EncryptedLogPayload {
            data: neurallog_crypto::encoding::encode(&data),
            ..record.clone()
        };
        let err = decrypt_log_data(&h, &tampered).unwrap_err();
        assert_eq!(err.code(), "decrypt_log_data_failed");

        // Flip one bit inside the IV
        let mut iv = neurallog_crypto::encoding::decode(&record.iv).unwrap();
        iv[3] ^= 0x40;
        let tampered = EncryptedLogPayload {
            iv: neurallog_crypto::encoding::encode(&iv),
            ..record.clone()
        };
        assert!(decrypt_log_data(&h, &tampered).is_err());
    }

    #[test]
    fn test_malformed_record_rejected() {
        let h = hierarchy(&["v1"]);
        let good = encrypt_log_data(&h, &LogData::from("x")).unwrap();

        let wrong_algorithm = EncryptedLogPayload {
            algorithm: "aes-128-cbc".to_string(),
            ..good.clone()
        };
        assert_eq!(
            decrypt_log_data(&h, &wrong_algorithm).unwrap_err().code(),
            "format_invalid"
        );

        let not_encrypted = EncryptedLogPayload {
            encrypted: false,
            ..good.clone()
        };
        assert!(decrypt_log_data(&h, &not_encrypted).is_err());

        let short_iv = EncryptedLogPayload {
            iv: neurallog_crypto::encoding::encode(&[0u8; 4]),
            ..good
        };
        assert!(decrypt_log_data(&h, &short_iv).is_err());
    }

    #[test]
    fn test_malformed_name_packing_rejected() {
        let h = hierarchy(&["v1"]);

        for bad in ["", "AA", "%%%not-base64%%%"] {
            let err = decrypt_log_name(&h, bad).unwrap_err();
            assert!(
                matches!(err, ClientError::DecryptLogNameFailed(_)),
                "{:?}",
                bad
            );
        }

        // Length byte pointing past the buffer
        let packed = neurallog_crypto::encoding::encode_url(&[200u8, b'v', b'1']);
        assert!(decrypt_log_name(&h, &packed).is_err());
    }

    #[test]
    fn test_numeric_text_comes_back_as_json() {
        // A plaintext that parses as JSON is surfaced as JSON, matching
        // the parse-else-string decrypt contract
        let h = hierarchy(&["v1"]);
        let record = encrypt_log_data(&h, &LogData::from("1234")).unwrap();
        assert_eq!(
            decrypt_log_data(&h, &record).unwrap(),
            LogData::Json(json!(1234))
        );
    }

    proptest::proptest! {
        #[test]
        fn prop_log_name_round_trip(name in "[a-zA-Z0-9 _./-]{1,64}") {
            let h = hierarchy(&["v1"]);
            let encrypted = encrypt_log_name(&h, &name).unwrap();
            proptest::prop_assert_eq!(decrypt_log_name(&h, &encrypted).unwrap(), name);
        }
    }
}
