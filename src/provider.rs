//! Session-token provider: reuse a cached session or request a new one.

use crate::credential::mask_access_key;
use crate::events::{EventSink, ProviderEvent, TracingSink};
use crate::expiry::Expiry;
use crate::mfa::CodeSource;
use crate::session::{CachedSession, SessionCache, SessionKey};
use crate::transport::{SessionTokenClient, SessionTokenRequest};
use crate::{Credential, MasterCredentials, ProviderConfig, Result, TokenmuxError};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Hands out short-lived session credentials for a single profile.
///
/// A provider is built once per profile and reused for the lifetime of the
/// process. On each [`retrieve`](SessionTokenProvider::retrieve) it either
/// returns the session held by the cache for `(profile, mfa serial)` or
/// requests a new one from the token service, stores it, and returns it.
///
/// The only mutable state is the tracked refresh deadline, which is why
/// `retrieve` takes `&mut self`. Share a provider between tasks by wrapping
/// it in a `tokio::sync::Mutex`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tokenmux::backends::mock::MockSessionTokenClient;
/// use tokenmux::session::MemorySessionCache;
/// use tokenmux::{MasterCredentials, ProviderConfig, SessionTokenProvider};
///
/// #[tokio::main]
/// async fn main() -> tokenmux::Result<()> {
///     let mut provider = SessionTokenProvider::new(
///         ProviderConfig::new("work"),
///         Arc::new(MockSessionTokenClient::new()),
///         Arc::new(MemorySessionCache::new()),
///         MasterCredentials::new("AKIAEXAMPLE", "secret"),
///     )?;
///
///     let creds = provider.retrieve().await?;
///     assert!(!provider.is_expired());
///     println!("expires at {}", creds.expiration);
///     Ok(())
/// }
/// ```
pub struct SessionTokenProvider {
    config: ProviderConfig,
    key: SessionKey,
    refresh_window: chrono::Duration,
    client: Arc<dyn SessionTokenClient>,
    cache: Arc<dyn SessionCache>,
    code_source: Option<Arc<dyn CodeSource>>,
    events: Arc<dyn EventSink>,
    master: MasterCredentials,
    expiry: Expiry,
}

impl SessionTokenProvider {
    /// Creates a provider for `config.profile_name`.
    ///
    /// Profiles with an MFA serial also need a code source; see
    /// [`with_code_source`](SessionTokenProvider::with_code_source).
    ///
    /// # Errors
    ///
    /// Returns the error from [`ProviderConfig::validate`] if the
    /// configuration is unusable.
    pub fn new(
        config: ProviderConfig,
        client: Arc<dyn SessionTokenClient>,
        cache: Arc<dyn SessionCache>,
        master: MasterCredentials,
    ) -> Result<Self> {
        config.validate()?;

        let refresh_window = chrono::Duration::from_std(config.expiration_window)
            .map_err(|e| TokenmuxError::InvalidConfig(e.to_string()))?;
        let key = SessionKey::new(config.profile_name.clone(), config.mfa_serial.clone());

        Ok(Self {
            config,
            key,
            refresh_window,
            client,
            cache,
            code_source: None,
            events: Arc::new(TracingSink),
            master,
            expiry: Expiry::new(),
        })
    }

    /// Sets the source of one-time MFA codes.
    pub fn with_code_source(mut self, source: Arc<dyn CodeSource>) -> Self {
        self.code_source = Some(source);
        self
    }

    /// Replaces the default [`TracingSink`].
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    /// Returns the profile this provider serves.
    pub fn profile_name(&self) -> &str {
        &self.config.profile_name
    }

    /// Returns the cache key used for this profile.
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Returns the refresh deadline recorded by the last successful retrieval.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiry.expires_at()
    }

    /// Returns `true` if credentials should be retrieved again at `now`.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expiry.needs_refresh(now)
    }

    /// Returns `true` if credentials should be retrieved again now.
    pub fn is_expired(&self) -> bool {
        self.expiry.is_expired()
    }

    /// Returns usable session credentials.
    ///
    /// On success the refresh deadline becomes the credential's expiration
    /// minus the configured window, so [`is_expired`](Self::is_expired)
    /// turns true before the credential actually runs out.
    ///
    /// # Errors
    ///
    /// Errors from the code source, the token service, or the cache's
    /// `store` are returned unchanged. A failed cache `lookup` is never an
    /// error; it only causes a new session to be requested. Nothing is
    /// retried.
    pub async fn retrieve(&mut self) -> Result<Credential> {
        self.events.emit(&ProviderEvent::RetrieveStarted {
            key: self.key.clone(),
        });

        let session = self.get_session_token().await?;

        self.expiry
            .set_expiration(session.expiration, self.refresh_window);

        let expires_in = (session.expiration - Utc::now())
            .to_std()
            .unwrap_or_default();
        self.events.emit(&ProviderEvent::CredentialsRetrieved {
            masked_access_key: mask_access_key(&session.access_key_id),
            expires_in,
        });

        Ok(session.into())
    }

    async fn get_session_token(&self) -> Result<CachedSession> {
        match self.cache.lookup(&self.key).await {
            Ok(session) => {
                self.events.emit(&ProviderEvent::CacheHit {
                    key: self.key.clone(),
                });
                Ok(session)
            }
            Err(e) => {
                self.events.emit(&ProviderEvent::CacheMiss {
                    key: self.key.clone(),
                    reason: e.to_string(),
                });

                let session = self.create_session_token().await?;
                self.cache.store(&self.key, &session).await?;
                Ok(session)
            }
        }
    }

    async fn create_session_token(&self) -> Result<CachedSession> {
        self.events.emit(&ProviderEvent::SessionCreating {
            profile_name: self.config.profile_name.clone(),
            mfa: self.config.mfa_required(),
        });

        let mut request = SessionTokenRequest::new(self.config.duration_seconds());

        if self.config.mfa_required() {
            let source = self.code_source.as_ref().ok_or_else(|| {
                TokenmuxError::MfaCodeUnavailable(format!(
                    "profile {} requires MFA but no code source is configured",
                    self.config.profile_name
                ))
            })?;
            let code = source.get_code(&self.config.mfa_serial).await?;
            request = request.with_mfa(self.config.mfa_serial.clone(), code);
        }

        let issued = self
            .client
            .get_session_token(&request, &self.master)
            .await?;

        Ok(issued.into())
    }
}
