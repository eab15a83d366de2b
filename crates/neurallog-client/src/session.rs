//! The orchestration session
//!
//! A session owns one key hierarchy plus the transport collaborators and
//! sequences the encrypt-name -> encrypt-data -> tokenize -> emit path (and
//! its inverse). It makes no cryptographic decisions of its own.
//!
//! Sessions follow the single-writer model: operations take `&mut self`
//! and one session is never shared across threads without external
//! locking.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use neurallog_crypto::zkp;
use neurallog_keys::hierarchy::Credential;
use neurallog_keys::{kek_blob, KeyHierarchy, KeyPurpose};

use crate::collaborators::{AuthProvider, KekProvision, LogServer};
use crate::config::ClientConfig;
use crate::errors::Result;
use crate::payload::{self, EncryptedLogPayload, LogData};
use crate::search;

/// Text fed to the search tokenizer for a payload: string content
/// verbatim, string and number leaves for JSON, nothing for raw bytes.
fn searchable_text(data: &LogData) -> Option<String> {
    fn collect(value: &serde_json::Value, out: &mut Vec<String>) {
        match value {
            serde_json::Value::String(s) => out.push(s.clone()),
            serde_json::Value::Number(n) => out.push(n.to_string()),
            serde_json::Value::Array(items) => items.iter().for_each(|v| collect(v, out)),
            serde_json::Value::Object(map) => map.values().for_each(|v| collect(v, out)),
            _ => {}
        }
    }

    match data {
        LogData::Text(text) => Some(text.clone()),
        LogData::Json(value) => {
            let mut words = Vec::new();
            collect(value, &mut words);
            Some(words.join(" "))
        }
        LogData::Bytes(_) => None,
    }
}

/// One record of a decrypted batch. A record that fails to decrypt turns
/// into the sentinel instead of aborting the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DecryptedRecord {
    Data(LogData),
    Failed {
        error: String,
        #[serde(rename = "encryptedWithVersion")]
        encrypted_with_version: String,
    },
}

impl DecryptedRecord {
    fn from_record(hierarchy: &KeyHierarchy, record: &EncryptedLogPayload) -> Self {
        match payload::decrypt_log_data(hierarchy, record) {
            Ok(data) => Self::Data(data),
            Err(error) => {
                tracing::warn!(code = error.code(), "log record failed to decrypt");
                Self::Failed {
                    error: "Failed to decrypt log".to_string(),
                    encrypted_with_version: if record.kek_version.is_empty() {
                        "unknown".to_string()
                    } else {
                        record.kek_version.clone()
                    },
                }
            }
        }
    }

    /// The decrypted payload, if this record survived.
    pub fn data(&self) -> Option<&LogData> {
        match self {
            Self::Data(data) => Some(data),
            Self::Failed { .. } => None,
        }
    }
}

/// One decrypted search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub record: DecryptedRecord,
}

/// A live client session: hierarchy, collaborators, and the per-session
/// cache mapping plaintext log names to the ciphertext the server keys
/// entries by.
pub struct LogSession<A, L> {
    config: ClientConfig,
    hierarchy: KeyHierarchy,
    auth: A,
    server: L,
    auth_token: String,
    encrypted_names: HashMap<String, String>,
}

impl<A: AuthProvider, L: LogServer> LogSession<A, L> {
    /// Wrap an already-initialized hierarchy.
    pub fn new(hierarchy: KeyHierarchy, auth: A, server: L, auth_token: impl Into<String>) -> Self {
        Self::with_config(ClientConfig::default(), hierarchy, auth, server, auth_token)
    }

    /// [`new`](Self::new) with explicit tunables.
    pub fn with_config(
        config: ClientConfig,
        hierarchy: KeyHierarchy,
        auth: A,
        server: L,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            config,
            hierarchy,
            auth,
            server,
            auth_token: auth_token.into(),
            encrypted_names: HashMap::new(),
        }
    }

    /// Initialize a hierarchy from a credential and open a session on it.
    pub fn open(
        config: ClientConfig,
        tenant_id: &str,
        credential: Credential<'_>,
        versions: &[&str],
        auth: A,
        server: L,
        auth_token: impl Into<String>,
    ) -> Result<Self> {
        let hierarchy = if versions.is_empty() {
            KeyHierarchy::initialize_with_iterations(
                tenant_id,
                credential,
                &[config.default_kek_version.as_str()],
                config.pbkdf2_iterations,
            )?
        } else {
            KeyHierarchy::initialize_with_iterations(
                tenant_id,
                credential,
                versions,
                config.pbkdf2_iterations,
            )?
        };
        Ok(Self::with_config(config, hierarchy, auth, server, auth_token))
    }

    pub fn hierarchy(&self) -> &KeyHierarchy {
        &self.hierarchy
    }

    pub fn hierarchy_mut(&mut self) -> &mut KeyHierarchy {
        &mut self.hierarchy
    }

    // The name ciphertext doubles as the server-side log identifier, so
    // one session must reuse the same ciphertext per plaintext name.
    fn encrypted_name_for(&mut self, log_name: &str) -> Result<String> {
        if let Some(cached) = self.encrypted_names.get(log_name) {
            return Ok(cached.clone());
        }
        let encrypted = payload::encrypt_log_name(&self.hierarchy, log_name)?;
        self.encrypted_names
            .insert(log_name.to_string(), encrypted.clone());
        Ok(encrypted)
    }

    async fn resource_token(&self, encrypted_name: &str) -> Result<String> {
        self.auth
            .exchange_resource_token(&self.auth_token, &format!("logs/{}", encrypted_name))
            .await
    }

    fn search_tokens(&self, text: &str) -> Result<Vec<String>> {
        let version = self.hierarchy.current_version()?;
        let key = self.hierarchy.subkey(version, KeyPurpose::Search)?;
        Ok(search::generate_tokens(text, &key))
    }

    /// Encrypt and append one entry, returning the server's entry id.
    pub async fn append(&mut self, log_name: &str, data: &LogData) -> Result<String> {
        let encrypted_name = self.encrypted_name_for(log_name)?;
        let record = payload::encrypt_log_data(&self.hierarchy, data)?;
        let tokens = match searchable_text(data) {
            Some(text) => self.search_tokens(&text)?,
            None => Vec::new(),
        };

        let resource_token = self.resource_token(&encrypted_name).await?;
        let entry_id = self
            .server
            .append_entry(&encrypted_name, &record, &resource_token, &tokens)
            .await?;
        tracing::debug!(entry = %entry_id, "log entry appended");
        Ok(entry_id)
    }

    /// Fetch and decrypt up to `limit` entries. Records that fail to
    /// decrypt become sentinels; the batch always comes back whole.
    pub async fn fetch(&mut self, log_name: &str, limit: usize) -> Result<Vec<DecryptedRecord>> {
        let encrypted_name = self.encrypted_name_for(log_name)?;
        let resource_token = self.resource_token(&encrypted_name).await?;
        let records = self
            .server
            .fetch_entries(&encrypted_name, &resource_token, limit)
            .await?;
        Ok(records
            .iter()
            .map(|record| DecryptedRecord::from_record(&self.hierarchy, record))
            .collect())
    }

    /// Tokenize a query, search server-side, decrypt the hits.
    pub async fn search(
        &mut self,
        log_name: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let encrypted_name = self.encrypted_name_for(log_name)?;
        let tokens = self.search_tokens(query)?;
        let resource_token = self.resource_token(&encrypted_name).await?;
        let hits = self
            .server
            .search_entries(&encrypted_name, &tokens, limit, &resource_token)
            .await?;
        Ok(hits
            .into_iter()
            .map(|hit| SearchHit {
                record: DecryptedRecord::from_record(&self.hierarchy, &hit.payload),
                id: hit.id,
                timestamp: hit.timestamp,
            })
            .collect())
    }

    /// Wrap the operational KEK for `version` under a recipient's public
    /// key and hand the blob to the provisioning registry.
    pub async fn provision_kek<P: KekProvision>(
        &self,
        provision: &P,
        user_id: &str,
        version: &str,
        recipient_spki: &[u8],
    ) -> Result<()> {
        let blob = kek_blob::wrap_for_user(&self.hierarchy, version, recipient_spki)?;
        provision.put_user_blob(user_id, version, &blob).await
    }

    /// Re-derive every version the registry lists. Existing entries are
    /// untouched.
    pub async fn recover_from_registry<P: KekProvision>(&mut self, provision: &P) -> Result<()> {
        let versions = provision.list_versions().await?;
        let labels: Vec<&str> = versions.iter().map(|info| info.id.as_str()).collect();
        self.hierarchy.recover_versions(&labels)?;
        Ok(())
    }

    /// Assemble a client token for this tenant using the session TTL.
    pub fn client_token(
        &self,
        api_key: &str,
        user_id: &str,
        tenant_id: &str,
        scopes: &[String],
    ) -> Result<String> {
        Ok(zkp::build_client_token_with_ttl(
            api_key,
            user_id,
            tenant_id,
            scopes,
            Utc::now().timestamp(),
            self.config.token_ttl_secs,
        )?)
    }

    /// Tear down the session, zeroizing all key material.
    pub fn logout(&mut self) {
        self.hierarchy.clear();
        self.encrypted_names.clear();
        tracing::debug!("session logged out");
    }
}
