//! Session caching for issued session tokens.
//!
//! This module provides the [`SessionCache`] trait consumed by the provider
//! along with two implementations: an in-process [`MemorySessionCache`] and a
//! disk-backed [`FileSessionCache`].

use crate::credential::mask_access_key;
use crate::transport::IssuedSession;
use crate::{Credential, Result, TokenmuxError};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

/// Identifies a cached session: the profile name plus the MFA device serial.
///
/// An empty serial is a valid key component (MFA disabled).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// Profile name
    pub profile_name: String,
    /// MFA device serial (empty when MFA is not required)
    pub mfa_serial: String,
}

impl SessionKey {
    /// Creates a session key.
    pub fn new(profile_name: impl Into<String>, mfa_serial: impl Into<String>) -> Self {
        Self {
            profile_name: profile_name.into(),
            mfa_serial: mfa_serial.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mfa_serial.is_empty() {
            write!(f, "{}", self.profile_name)
        } else {
            write!(f, "{} ({})", self.profile_name, self.mfa_serial)
        }
    }
}

/// A previously issued session as held by a [`SessionCache`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSession {
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Session token
    pub session_token: String,
    /// When the session expires
    pub expiration: DateTime<Utc>,
    /// When this session was issued
    pub created: DateTime<Utc>,
}

impl CachedSession {
    /// Returns `true` if the session has passed its expiration at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiration
    }
}

impl fmt::Debug for CachedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedSession")
            .field("access_key_id", &mask_access_key(&self.access_key_id))
            .field("expiration", &self.expiration)
            .field("created", &self.created)
            .finish_non_exhaustive()
    }
}

impl From<IssuedSession> for CachedSession {
    fn from(session: IssuedSession) -> Self {
        Self {
            access_key_id: session.access_key_id,
            secret_access_key: session.secret_access_key,
            session_token: session.session_token,
            expiration: session.expiration,
            created: Utc::now(),
        }
    }
}

impl From<CachedSession> for Credential {
    fn from(session: CachedSession) -> Self {
        Self {
            access_key_id: session.access_key_id,
            secret_access_key: session.secret_access_key,
            session_token: session.session_token,
            expiration: session.expiration,
        }
    }
}

/// Keyed store of named sessions.
///
/// Freshness is the cache's responsibility: `lookup` must only return a
/// session it still considers usable.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. Guaranteeing a single issuance per
/// key under concurrent first use is left to the implementation.
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Returns the cached session for `key`.
    ///
    /// # Errors
    ///
    /// - [`TokenmuxError::NotFound`]: no usable session for this key
    /// - Any other error: the cache itself failed
    async fn lookup(&self, key: &SessionKey) -> Result<CachedSession>;

    /// Stores `session` under `key`, replacing any previous entry.
    async fn store(&self, key: &SessionKey, session: &CachedSession) -> Result<()>;
}

/// In-process session cache.
///
/// Expired entries are evicted on lookup.
#[derive(Debug, Default)]
pub struct MemorySessionCache {
    sessions: RwLock<HashMap<SessionKey, CachedSession>>,
}

impl MemorySessionCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no entries are held.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionCache for MemorySessionCache {
    async fn lookup(&self, key: &SessionKey) -> Result<CachedSession> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(key) {
                Some(session) if !session.is_expired_at(Utc::now()) => {
                    return Ok(session.clone())
                }
                Some(_) => {}
                None => return Err(TokenmuxError::NotFound(key.to_string())),
            }
        }

        // Expired: evict, unless a fresh session was stored since the read.
        let mut sessions = self.sessions.write().await;
        match sessions.get(key) {
            Some(session) if !session.is_expired_at(Utc::now()) => Ok(session.clone()),
            Some(_) => {
                sessions.remove(key);
                Err(TokenmuxError::NotFound(key.to_string()))
            }
            None => Err(TokenmuxError::NotFound(key.to_string())),
        }
    }

    async fn store(&self, key: &SessionKey, session: &CachedSession) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(key.clone(), session.clone());
        Ok(())
    }
}

/// Disk-backed session cache.
///
/// Each key is stored as its own JSON file inside a cache directory. The
/// on-disk layout is an implementation detail and may change between
/// releases.
///
/// # Security
///
/// - Cache files are created with mode 0600 (owner read/write only) on Unix
/// - The cache directory is created with mode 0700 (owner access only)
/// - Expired or unreadable sessions are deleted and reported as missing
/// - Secrets are never logged or exposed in errors
///
/// # Example
///
/// ```no_run
/// use tokenmux::session::{FileSessionCache, SessionCache, SessionKey};
///
/// #[tokio::main]
/// async fn main() -> tokenmux::Result<()> {
///     let cache = FileSessionCache::new("/tmp/.tokenmux-sessions").await?;
///     let key = SessionKey::new("work", "");
///
///     match cache.lookup(&key).await {
///         Ok(session) => println!("cached until {}", session.expiration),
///         Err(e) => println!("no session: {}", e),
///     }
///
///     Ok(())
/// }
/// ```
pub struct FileSessionCache {
    dir: PathBuf,
}

impl FileSessionCache {
    /// Creates a cache rooted at `dir`.
    ///
    /// The directory is created with restricted permissions (0700 on Unix).
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub async fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        fs::create_dir_all(&dir).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&dir).await?.permissions();
            perms.set_mode(0o700);
            fs::set_permissions(&dir, perms).await?;
        }

        Ok(Self { dir })
    }

    /// Returns the file that holds the session for `key`.
    ///
    /// The name is a SHA-256 digest of both key components, base64url-encoded,
    /// so it has a fixed length whatever the profile name or MFA serial (which
    /// contains `:` and `/`) look like.
    pub fn session_path(&self, key: &SessionKey) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.profile_name.as_bytes());
        hasher.update([0u8]);
        hasher.update(key.mfa_serial.as_bytes());
        let digest = hasher.finalize();

        self.dir
            .join(format!("session-{}.json", URL_SAFE_NO_PAD.encode(digest)))
    }

    /// Deletes the cached session for `key`.
    ///
    /// This is idempotent - removing a missing entry is not an error.
    pub async fn remove(&self, key: &SessionKey) -> Result<()> {
        match fs::remove_file(self.session_path(key)).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SessionCache for FileSessionCache {
    async fn lookup(&self, key: &SessionKey) -> Result<CachedSession> {
        let path = self.session_path(key);

        let data = match fs::read(&path).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TokenmuxError::NotFound(key.to_string()))
            }
            Err(e) => {
                return Err(TokenmuxError::CacheUnavailable(format!(
                    "reading {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let session: CachedSession = match serde_json::from_slice(&data) {
            Ok(s) => s,
            Err(_) => {
                let _ = fs::remove_file(&path).await;
                return Err(TokenmuxError::NotFound(key.to_string()));
            }
        };

        if session.is_expired_at(Utc::now()) {
            let _ = fs::remove_file(&path).await;
            return Err(TokenmuxError::NotFound(key.to_string()));
        }

        Ok(session)
    }

    async fn store(&self, key: &SessionKey, session: &CachedSession) -> Result<()> {
        let path = self.session_path(key);
        let json = serde_json::to_vec_pretty(session)?;

        let mut file = fs::File::create(&path).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = file.metadata().await?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms).await?;
        }

        file.write_all(&json).await?;
        file.flush().await?;

        Ok(())
    }
}
