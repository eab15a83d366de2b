//! The versioned key hierarchy
//!
//! One hierarchy instance is one logical session. Derivation chain:
//!
//! ```text
//! (tenant id, recovery phrase | mnemonic)
//!     |
//!     +- PBKDF2 / HKDF(BIP-39 seed)      -> master secret (transient)
//!     +- HKDF "NeuralLog-MasterKEK"      -> master KEK
//!     +- HKDF "NeuralLog-OpKEK-{v}"      -> operational KEK, one per version
//!     +- HKDF per purpose                -> LogKey / LogNameKey / SearchKey
//! ```
//!
//! The version map is append-only for the lifetime of a session; exactly
//! one version is current. Subkeys are recomputed per operation and never
//! cached, which keeps their exposure window to a single call.

use std::collections::BTreeMap;

use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use neurallog_crypto::{kdf, mnemonic};

use crate::errors::{KeyError, Result};

/// Version label used when none is supplied at initialization.
pub const DEFAULT_KEK_VERSION: &str = "v1";

/// Version labels must fit the one-byte length prefix of the encrypted
/// log-name format.
pub const MAX_VERSION_BYTES: usize = 255;

const MASTER_SECRET_SALT_PREFIX: &str = "neurallog:";
const MASTER_SECRET_INFO: &str = "master-secret";
const MASTER_KEK_SALT: &str = "NeuralLog-MasterKEK";
const MASTER_KEK_INFO: &str = "master-key-encryption-key";
const OP_KEK_SALT_PREFIX: &str = "NeuralLog-OpKEK-";
const OP_KEK_INFO: &str = "operational-key-encryption-key";

/// The per-purpose subkeys derived from an operational KEK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPurpose {
    /// Encrypts log payloads.
    Logs,
    /// Encrypts log names.
    LogNames,
    /// Keys the deterministic search tokens.
    Search,
}

impl KeyPurpose {
    fn salt(&self) -> &'static str {
        match self {
            Self::Logs => "NeuralLog-LogKey",
            Self::LogNames => "NeuralLog-LogNameKey",
            Self::Search => "NeuralLog-SearchKey",
        }
    }

    fn info(&self) -> &'static str {
        match self {
            Self::Logs => "logs",
            Self::LogNames => "log-names",
            Self::Search => "search",
        }
    }
}

/// What the tenant presents to unlock the hierarchy.
#[derive(Clone, Copy)]
pub enum Credential<'a> {
    /// Free-form recovery phrase, stretched with PBKDF2.
    RecoveryPhrase(&'a str),
    /// BIP-39 mnemonic; the standard seed feeds HKDF.
    Mnemonic(&'a str),
}

// 32 bytes of KEK material, wiped when the entry is dropped or replaced.
#[derive(Zeroize, ZeroizeOnDrop)]
struct Kek([u8; 32]);

impl Kek {
    fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for Kek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Kek([REDACTED])")
    }
}

/// In-memory session state: master KEK, the version map, and the cursor.
///
/// Not safe for concurrent mutation; callers sharing a session across
/// threads wrap it in a mutex.
#[derive(Debug)]
pub struct KeyHierarchy {
    master_kek: Option<Kek>,
    operational: BTreeMap<String, Kek>,
    current: Option<String>,
}

impl KeyHierarchy {
    /// Initialize a hierarchy with the default PBKDF2 iteration count.
    pub fn initialize(
        tenant_id: &str,
        credential: Credential<'_>,
        versions: &[&str],
    ) -> Result<Self> {
        Self::initialize_with_iterations(
            tenant_id,
            credential,
            versions,
            kdf::PBKDF2_DEFAULT_ITERATIONS,
        )
    }

    /// Initialize, deriving an operational KEK for each supplied version.
    ///
    /// The current version becomes the lexicographically greatest supplied
    /// one, or `"v1"` when none are supplied.
    pub fn initialize_with_iterations(
        tenant_id: &str,
        credential: Credential<'_>,
        versions: &[&str],
        pbkdf2_iterations: u32,
    ) -> Result<Self> {
        let salt = format!("{}{}", MASTER_SECRET_SALT_PREFIX, tenant_id);
        let master_secret: Zeroizing<[u8; 32]> = match credential {
            Credential::RecoveryPhrase(phrase) => {
                let stretched = Zeroizing::new(kdf::pbkdf2_derive(
                    phrase.as_bytes(),
                    salt.as_bytes(),
                    pbkdf2_iterations,
                    kdf::DERIVED_KEY_LEN,
                )?);
                let mut secret = [0u8; 32];
                secret.copy_from_slice(&stretched);
                Zeroizing::new(secret)
            }
            Credential::Mnemonic(phrase) => {
                let mut seed = mnemonic::phrase_to_seed(phrase, "")?;
                let secret = kdf::hkdf_derive_key(
                    &seed,
                    salt.as_bytes(),
                    MASTER_SECRET_INFO.as_bytes(),
                );
                seed.zeroize();
                Zeroizing::new(secret?)
            }
        };

        let master_kek = Kek(kdf::hkdf_derive_key(
            &*master_secret,
            MASTER_KEK_SALT.as_bytes(),
            MASTER_KEK_INFO.as_bytes(),
        )?);

        let mut hierarchy = Self {
            master_kek: Some(master_kek),
            operational: BTreeMap::new(),
            current: None,
        };

        if versions.is_empty() {
            hierarchy.add_version(DEFAULT_KEK_VERSION)?;
        } else {
            for version in versions {
                hierarchy.add_version(version)?;
            }
        }
        // BTreeMap keeps keys ordered, so the last one is the greatest
        hierarchy.current = hierarchy.operational.keys().next_back().cloned();

        tracing::debug!(
            tenant = tenant_id,
            versions = hierarchy.operational.len(),
            current = hierarchy.current.as_deref(),
            "key hierarchy initialized"
        );
        Ok(hierarchy)
    }

    fn validate_version(version: &str) -> Result<()> {
        if version.is_empty() {
            return Err(KeyError::VersionInvalid("empty version label".into()));
        }
        if version.len() > MAX_VERSION_BYTES {
            return Err(KeyError::VersionInvalid(format!(
                "version label is {} bytes, limit is {}",
                version.len(),
                MAX_VERSION_BYTES
            )));
        }
        if !version.chars().all(|c| c.is_ascii_graphic()) {
            return Err(KeyError::VersionInvalid(
                "version labels are printable ASCII".into(),
            ));
        }
        Ok(())
    }

    // Derives and stores one operational KEK; existing entries are kept.
    fn add_version(&mut self, version: &str) -> Result<()> {
        Self::validate_version(version)?;
        if self.operational.contains_key(version) {
            return Ok(());
        }
        let master = self.master_kek.as_ref().ok_or(KeyError::NotInitialized)?;
        let salt = format!("{}{}", OP_KEK_SALT_PREFIX, version);
        let kek = Kek(kdf::hkdf_derive_key(
            master.as_bytes(),
            salt.as_bytes(),
            OP_KEK_INFO.as_bytes(),
        )?);
        self.operational.insert(version.to_string(), kek);
        tracing::debug!(%version, "operational KEK derived");
        Ok(())
    }

    /// Derive any versions not yet present. Idempotent; existing entries
    /// are never replaced.
    pub fn recover_versions(&mut self, versions: &[&str]) -> Result<()> {
        if self.master_kek.is_none() {
            return Err(KeyError::NotInitialized);
        }
        for version in versions {
            self.add_version(version)?;
        }
        Ok(())
    }

    /// Install an operational KEK received out-of-band (a provisioning
    /// blob). Existing entries are preserved, never replaced.
    pub(crate) fn register_version(&mut self, version: &str, kek: [u8; 32]) -> Result<()> {
        Self::validate_version(version)?;
        self.operational.entry(version.to_string()).or_insert(Kek(kek));
        if self.current.is_none() {
            self.current = Some(version.to_string());
        }
        Ok(())
    }

    /// Point encryption at an already-present version.
    pub fn set_current(&mut self, version: &str) -> Result<()> {
        if !self.operational.contains_key(version) {
            return Err(KeyError::UnknownKekVersion(version.to_string()));
        }
        self.current = Some(version.to_string());
        tracing::debug!(%version, "current KEK version changed");
        Ok(())
    }

    /// The version new ciphertexts are produced under.
    pub fn current_version(&self) -> Result<&str> {
        self.current.as_deref().ok_or(KeyError::NoActiveKekVersion)
    }

    /// Raw operational KEK bytes for a version.
    pub fn operational_kek(&self, version: &str) -> Result<&[u8; 32]> {
        self.operational
            .get(version)
            .map(Kek::as_bytes)
            .ok_or_else(|| KeyError::UnknownKekVersion(version.to_string()))
    }

    /// The current version and its operational KEK.
    pub fn current_kek(&self) -> Result<(&str, &[u8; 32])> {
        let version = self.current_version()?;
        Ok((version, self.operational_kek(version)?))
    }

    /// Derive the per-purpose subkey for a version. Computed fresh on
    /// every call.
    pub fn subkey(&self, version: &str, purpose: KeyPurpose) -> Result<Zeroizing<[u8; 32]>> {
        let kek = self.operational_kek(version)?;
        let key = kdf::hkdf_derive_key(kek, purpose.salt().as_bytes(), purpose.info().as_bytes())?;
        Ok(Zeroizing::new(key))
    }

    /// True once a version map entry exists for `version`.
    pub fn contains(&self, version: &str) -> bool {
        self.operational.contains_key(version)
    }

    /// All known versions, in lexicographic order.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.operational.keys().map(String::as_str)
    }

    /// True between initialization and [`clear`](Self::clear).
    pub fn is_initialized(&self) -> bool {
        self.master_kek.is_some()
    }

    /// A fresh random 256-bit KEK for rotation flows. The server-side
    /// version bookkeeping is the caller's concern.
    pub fn generate_kek() -> [u8; 32] {
        let mut kek = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut kek);
        kek
    }

    /// Tear down the session: zeroize the master KEK and every
    /// operational KEK. The hierarchy is unusable afterwards.
    pub fn clear(&mut self) {
        self.master_kek = None;
        self.operational.clear();
        self.current = None;
        tracing::debug!("key hierarchy cleared");
    }
}
