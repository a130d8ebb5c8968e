//! Mock collaborators for testing.
//!
//! In-memory implementations of every provider collaborator with call
//! counting and error injection, for testing code that uses tokenmux
//! without a token service.

use crate::events::{EventSink, ProviderEvent};
use crate::mfa::CodeSource;
use crate::session::{CachedSession, SessionCache, SessionKey};
use crate::transport::{IssuedSession, SessionTokenClient, SessionTokenRequest};
use crate::{MasterCredentials, Result, TokenmuxError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Mock token service.
///
/// Issues a distinct session per call, expiring `duration_seconds` from now
/// unless a fixed expiration is set. Every request is recorded.
///
/// # Example
///
/// ```
/// use tokenmux::backends::mock::MockSessionTokenClient;
/// use tokenmux::transport::{SessionTokenClient, SessionTokenRequest};
/// use tokenmux::{MasterCredentials, TokenmuxError};
///
/// #[tokio::main]
/// async fn main() -> tokenmux::Result<()> {
///     let client = MockSessionTokenClient::new();
///     let master = MasterCredentials::new("AKIAEXAMPLE", "secret");
///
///     // Test error conditions
///     client.fail_next(TokenmuxError::Issuance("AccessDenied".to_string()));
///
///     let result = client
///         .get_session_token(&SessionTokenRequest::new(3600), &master)
///         .await;
///     assert!(result.is_err());
///     assert_eq!(client.call_count(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Default)]
pub struct MockSessionTokenClient {
    calls: AtomicUsize,
    requests: Mutex<Vec<SessionTokenRequest>>,
    masters: Mutex<Vec<String>>,
    expiration: Mutex<Option<DateTime<Utc>>>,
    next_error: Mutex<Option<TokenmuxError>>,
}

impl MockSessionTokenClient {
    /// Creates a client that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every issued session expire at `expiration`.
    pub fn with_expiration(self, expiration: DateTime<Utc>) -> Self {
        *lock(&self.expiration) = Some(expiration);
        self
    }

    /// Makes the next call fail with `err`.
    pub fn fail_next(&self, err: TokenmuxError) {
        *lock(&self.next_error) = Some(err);
    }

    /// Number of issuance calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<SessionTokenRequest> {
        lock(&self.requests).clone()
    }

    /// Access key ids of the master credentials used so far.
    pub fn master_key_ids(&self) -> Vec<String> {
        lock(&self.masters).clone()
    }
}

#[async_trait]
impl SessionTokenClient for MockSessionTokenClient {
    async fn get_session_token(
        &self,
        request: &SessionTokenRequest,
        master: &MasterCredentials,
    ) -> Result<IssuedSession> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        lock(&self.requests).push(request.clone());
        lock(&self.masters).push(master.access_key_id.clone());

        if let Some(err) = lock(&self.next_error).take() {
            return Err(err);
        }

        let fixed = *lock(&self.expiration);
        let expiration =
            fixed.unwrap_or_else(|| Utc::now() + Duration::seconds(request.duration_seconds));

        Ok(IssuedSession {
            access_key_id: format!("ASIAMOCK{:08}", n),
            secret_access_key: format!("mock-secret-{}", n),
            session_token: format!("mock-session-token-{}", n),
            expiration,
        })
    }
}

/// Mock session cache.
///
/// Returns whatever was stored, with no freshness check of its own.
#[derive(Debug, Default)]
pub struct MockSessionCache {
    sessions: Mutex<HashMap<SessionKey, CachedSession>>,
    lookups: AtomicUsize,
    stores: AtomicUsize,
    lookup_failure: Mutex<Option<String>>,
    next_store_error: Mutex<Option<TokenmuxError>>,
}

impl MockSessionCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates the cache with a session.
    pub fn set_session(&self, key: SessionKey, session: CachedSession) {
        lock(&self.sessions).insert(key, session);
    }

    /// Returns the stored session for `key`, bypassing counters and failures.
    pub fn session(&self, key: &SessionKey) -> Option<CachedSession> {
        lock(&self.sessions).get(key).cloned()
    }

    /// Makes every lookup fail with [`TokenmuxError::CacheUnavailable`].
    pub fn fail_lookups(&self, reason: impl Into<String>) {
        *lock(&self.lookup_failure) = Some(reason.into());
    }

    /// Makes the next store fail with `err`.
    pub fn fail_next_store(&self, err: TokenmuxError) {
        *lock(&self.next_store_error) = Some(err);
    }

    /// Number of lookups made so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of store attempts made so far, failed ones included.
    pub fn store_count(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionCache for MockSessionCache {
    async fn lookup(&self, key: &SessionKey) -> Result<CachedSession> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = lock(&self.lookup_failure).clone() {
            return Err(TokenmuxError::CacheUnavailable(reason));
        }

        lock(&self.sessions)
            .get(key)
            .cloned()
            .ok_or_else(|| TokenmuxError::NotFound(key.to_string()))
    }

    async fn store(&self, key: &SessionKey, session: &CachedSession) -> Result<()> {
        self.stores.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = lock(&self.next_store_error).take() {
            return Err(err);
        }

        lock(&self.sessions).insert(key.clone(), session.clone());
        Ok(())
    }
}

/// Mock MFA code source returning a fixed code.
#[derive(Debug)]
pub struct MockCodeSource {
    code: String,
    calls: AtomicUsize,
    serials: Mutex<Vec<String>>,
    next_error: Mutex<Option<TokenmuxError>>,
}

impl MockCodeSource {
    /// Creates a source that returns `code`. The code is not validated.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            calls: AtomicUsize::new(0),
            serials: Mutex::new(Vec::new()),
            next_error: Mutex::new(None),
        }
    }

    /// Makes the next call fail with `err`.
    pub fn fail_next(&self, err: TokenmuxError) {
        *lock(&self.next_error) = Some(err);
    }

    /// Number of codes requested so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// MFA serials codes were requested for.
    pub fn serials(&self) -> Vec<String> {
        lock(&self.serials).clone()
    }
}

#[async_trait]
impl CodeSource for MockCodeSource {
    async fn get_code(&self, mfa_serial: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.serials).push(mfa_serial.to_string());

        if let Some(err) = lock(&self.next_error).take() {
            return Err(err);
        }

        Ok(self.code.clone())
    }
}

/// Event sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProviderEvent>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, oldest first.
    pub fn events(&self) -> Vec<ProviderEvent> {
        lock(&self.events).clone()
    }

    /// Forgets all recorded events.
    pub fn clear(&self) {
        lock(&self.events).clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &ProviderEvent) {
        lock(&self.events).push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client_issues_distinct_sessions() {
        let client = MockSessionTokenClient::new();
        let master = MasterCredentials::new("AKIAMASTER", "secret");
        let request = SessionTokenRequest::new(3600);

        let first = client.get_session_token(&request, &master).await.unwrap();
        let second = client.get_session_token(&request, &master).await.unwrap();

        assert_ne!(first.access_key_id, second.access_key_id);
        assert_eq!(client.call_count(), 2);
        assert_eq!(client.master_key_ids(), vec!["AKIAMASTER", "AKIAMASTER"]);
    }

    #[tokio::test]
    async fn test_mock_client_fixed_expiration() {
        let expiration = Utc::now() + Duration::seconds(42);
        let client = MockSessionTokenClient::new().with_expiration(expiration);
        let master = MasterCredentials::new("AKIAMASTER", "secret");

        let session = client
            .get_session_token(&SessionTokenRequest::new(3600), &master)
            .await
            .unwrap();
        assert_eq!(session.expiration, expiration);
    }

    #[tokio::test]
    async fn test_mock_client_error_is_one_shot() {
        let client = MockSessionTokenClient::new();
        let master = MasterCredentials::new("AKIAMASTER", "secret");
        let request = SessionTokenRequest::new(900);

        client.fail_next(TokenmuxError::Issuance("Throttling".to_string()));

        assert!(client.get_session_token(&request, &master).await.is_err());
        assert!(client.get_session_token(&request, &master).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_cache_failures() {
        let cache = MockSessionCache::new();
        let key = SessionKey::new("work", "");

        assert!(cache.lookup(&key).await.unwrap_err().is_not_found());

        cache.fail_lookups("keyring locked");
        let err = cache.lookup(&key).await.unwrap_err();
        assert!(matches!(err, TokenmuxError::CacheUnavailable(_)));
        assert_eq!(cache.lookup_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_code_source() {
        let source = MockCodeSource::new("123456");
        source.fail_next(TokenmuxError::MfaCodeUnavailable("cancelled".to_string()));

        assert!(source.get_code("arn:device1").await.is_err());
        assert_eq!(source.get_code("arn:device1").await.unwrap(), "123456");
        assert_eq!(source.call_count(), 2);
        assert_eq!(source.serials(), vec!["arn:device1", "arn:device1"]);
    }
}
