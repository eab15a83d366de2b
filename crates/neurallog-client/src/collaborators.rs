//! Transport collaborator seams
//!
//! The engine treats every token and identifier from these traits as an
//! opaque bag of bytes: no semantics beyond "send this back in the
//! Authorization header". Implementations own retries and transport
//! errors; cryptographic failures are never retried.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::payload::EncryptedLogPayload;

/// Outcome of a server-side API-key proof check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyVerification {
    pub valid: bool,
    pub user_id: String,
    pub tenant_id: String,
    pub scopes: Vec<String>,
}

/// One search hit: entry id, server timestamp, and the ciphertext record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntrySummary {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub payload: EncryptedLogPayload,
}

/// Lifecycle state of a KEK version as the registry reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KekVersionStatus {
    Active,
    DecryptOnly,
    Deprecated,
}

/// Registry row for one KEK version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KekVersionInfo {
    pub id: String,
    pub status: KekVersionStatus,
}

/// Auth-service collaborator.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange an auth token for a short-lived token scoped to `resource`.
    async fn exchange_resource_token(&self, auth_token: &str, resource: &str) -> Result<String>;

    /// Verify an API-key possession proof.
    async fn verify_api_key(&self, api_key_id: &str, proof: &str) -> Result<ApiKeyVerification>;
}

/// Log-server collaborator. All names and payloads crossing this seam are
/// already ciphertext.
#[async_trait]
pub trait LogServer: Send + Sync {
    async fn append_entry(
        &self,
        encrypted_name: &str,
        payload: &EncryptedLogPayload,
        resource_token: &str,
        search_tokens: &[String],
    ) -> Result<String>;

    async fn fetch_entries(
        &self,
        encrypted_name: &str,
        resource_token: &str,
        limit: usize,
    ) -> Result<Vec<EncryptedLogPayload>>;

    async fn search_entries(
        &self,
        encrypted_name: &str,
        search_tokens: &[String],
        limit: usize,
        resource_token: &str,
    ) -> Result<Vec<LogEntrySummary>>;
}

/// KEK provisioning collaborator (recovery and admin promotion).
#[async_trait]
pub trait KekProvision: Send + Sync {
    /// Store a wrapped operational KEK for a user.
    async fn put_user_blob(&self, user_id: &str, version: &str, blob: &[u8]) -> Result<()>;

    /// List the versions the registry knows about.
    async fn list_versions(&self) -> Result<Vec<KekVersionInfo>>;
}
