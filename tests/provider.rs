//! End-to-end provider behaviour against mock collaborators.

#![cfg(feature = "mock")]

use chrono::{Duration, Utc};
use std::sync::Arc;
use tokenmux::backends::mock::{MockCodeSource, MockSessionCache, MockSessionTokenClient};
use tokenmux::session::MemorySessionCache;
use tokenmux::{
    CachedSession, MasterCredentials, ProviderConfig, SessionKey, SessionTokenProvider,
    TokenmuxError,
};

struct Harness {
    client: Arc<MockSessionTokenClient>,
    cache: Arc<MockSessionCache>,
    codes: Arc<MockCodeSource>,
    provider: SessionTokenProvider,
}

fn harness(config: ProviderConfig, client: MockSessionTokenClient) -> Harness {
    let client = Arc::new(client);
    let cache = Arc::new(MockSessionCache::new());
    let codes = Arc::new(MockCodeSource::new("123456"));

    let provider = SessionTokenProvider::new(
        config,
        client.clone(),
        cache.clone(),
        MasterCredentials::new("AKIAMASTER000001", "master-secret"),
    )
    .expect("valid config")
    .with_code_source(codes.clone());

    Harness {
        client,
        cache,
        codes,
        provider,
    }
}

fn cached_session(expires_in_secs: i64) -> CachedSession {
    let now = Utc::now();
    CachedSession {
        access_key_id: "ASIACACHED000001".to_string(),
        secret_access_key: "cached-secret".to_string(),
        session_token: "cached-token".to_string(),
        expiration: now + Duration::seconds(expires_in_secs),
        created: now,
    }
}

#[tokio::test]
async fn test_fresh_issuance_without_mfa() {
    let expiration = Utc::now() + Duration::seconds(3600);
    let config = ProviderConfig::new("work")
        .with_session_duration(std::time::Duration::from_secs(3600))
        .with_expiration_window(std::time::Duration::from_secs(300));
    let mut h = harness(config, MockSessionTokenClient::new().with_expiration(expiration));

    let creds = h.provider.retrieve().await.unwrap();

    assert_eq!(h.cache.lookup_count(), 1);
    assert_eq!(h.client.call_count(), 1);
    assert_eq!(h.cache.store_count(), 1);
    assert_eq!(h.codes.call_count(), 0);

    let request = &h.client.requests()[0];
    assert_eq!(request.duration_seconds, 3600);
    assert!(request.serial_number.is_none());
    assert!(request.token_code.is_none());
    assert_eq!(h.client.master_key_ids(), vec!["AKIAMASTER000001"]);

    assert_eq!(creds.expiration, expiration);
    assert_eq!(
        h.provider.expires_at(),
        Some(expiration - Duration::seconds(300))
    );

    let stored = h.cache.session(&SessionKey::new("work", "")).unwrap();
    assert_eq!(stored.access_key_id, creds.access_key_id);
    assert_eq!(stored.session_token, creds.session_token);
    assert_eq!(stored.expiration, expiration);
}

#[tokio::test]
async fn test_fresh_issuance_with_mfa() {
    let config = ProviderConfig::new("work")
        .with_session_duration(std::time::Duration::from_secs(900))
        .with_mfa_serial("arn:device1");
    let mut h = harness(config, MockSessionTokenClient::new());

    h.provider.retrieve().await.unwrap();

    assert_eq!(h.codes.call_count(), 1);
    assert_eq!(h.codes.serials(), vec!["arn:device1"]);
    assert_eq!(h.client.call_count(), 1);

    let request = &h.client.requests()[0];
    assert_eq!(request.duration_seconds, 900);
    assert_eq!(request.serial_number.as_deref(), Some("arn:device1"));
    assert_eq!(request.token_code.as_deref(), Some("123456"));

    assert!(h
        .cache
        .session(&SessionKey::new("work", "arn:device1"))
        .is_some());
}

#[tokio::test]
async fn test_cache_hit_returned_verbatim() {
    let config = ProviderConfig::new("work").with_mfa_serial("arn:device1");
    let mut h = harness(config, MockSessionTokenClient::new());
    let cached = cached_session(1800);
    h.cache
        .set_session(SessionKey::new("work", "arn:device1"), cached.clone());

    let creds = h.provider.retrieve().await.unwrap();

    assert_eq!(creds.access_key_id, cached.access_key_id);
    assert_eq!(creds.secret_access_key, cached.secret_access_key);
    assert_eq!(creds.session_token, cached.session_token);
    assert_eq!(creds.expiration, cached.expiration);

    assert_eq!(h.client.call_count(), 0);
    assert_eq!(h.codes.call_count(), 0);
    assert_eq!(h.cache.store_count(), 0);
    assert_eq!(
        h.provider.expires_at(),
        Some(cached.expiration - Duration::seconds(300))
    );
}

#[tokio::test]
async fn test_cache_hit_not_checked_for_staleness() {
    let mut h = harness(ProviderConfig::new("work"), MockSessionTokenClient::new());
    let stale = cached_session(-60);
    h.cache.set_session(SessionKey::new("work", ""), stale.clone());

    let creds = h.provider.retrieve().await.unwrap();

    assert_eq!(creds.access_key_id, stale.access_key_id);
    assert_eq!(h.client.call_count(), 0);
    assert!(h.provider.is_expired());
}

#[tokio::test]
async fn test_broken_cache_degrades_to_fresh_issuance() {
    let mut h = harness(ProviderConfig::new("work"), MockSessionTokenClient::new());
    h.cache.fail_lookups("keyring locked");

    let first = h.provider.retrieve().await.unwrap();
    let second = h.provider.retrieve().await.unwrap();

    assert_ne!(first.access_key_id, second.access_key_id);
    assert_eq!(h.client.call_count(), 2);
    assert_eq!(h.cache.store_count(), 2);
}

#[tokio::test]
async fn test_store_failure_is_returned_instead_of_credential() {
    let mut h = harness(ProviderConfig::new("work"), MockSessionTokenClient::new());
    h.cache
        .fail_next_store(TokenmuxError::CacheUnavailable("disk full".to_string()));

    let err = h.provider.retrieve().await.unwrap_err();

    assert!(matches!(err, TokenmuxError::CacheUnavailable(ref msg) if msg == "disk full"));
    assert_eq!(h.client.call_count(), 1);
    assert_eq!(h.cache.store_count(), 1);
    assert!(h.provider.expires_at().is_none());
}

#[tokio::test]
async fn test_issuance_failure_is_propagated() {
    let mut h = harness(ProviderConfig::new("work"), MockSessionTokenClient::new());
    h.client
        .fail_next(TokenmuxError::Issuance("ExpiredToken".to_string()));

    let err = h.provider.retrieve().await.unwrap_err();

    assert!(matches!(err, TokenmuxError::Issuance(ref msg) if msg == "ExpiredToken"));
    assert_eq!(h.client.call_count(), 1);
    assert_eq!(h.cache.store_count(), 0);
    assert!(h.provider.expires_at().is_none());
}

#[tokio::test]
async fn test_code_failure_aborts_before_issuance() {
    let config = ProviderConfig::new("work").with_mfa_serial("arn:device1");
    let mut h = harness(config, MockSessionTokenClient::new());
    h.codes
        .fail_next(TokenmuxError::MfaCodeUnavailable("prompt cancelled".to_string()));

    let err = h.provider.retrieve().await.unwrap_err();

    assert!(matches!(err, TokenmuxError::MfaCodeUnavailable(ref msg) if msg == "prompt cancelled"));
    assert_eq!(h.codes.call_count(), 1);
    assert_eq!(h.client.call_count(), 0);
    assert_eq!(h.cache.store_count(), 0);
}

#[tokio::test]
async fn test_no_retry_after_failure() {
    let mut h = harness(ProviderConfig::new("work"), MockSessionTokenClient::new());
    h.client
        .fail_next(TokenmuxError::Issuance("Throttling".to_string()));

    assert!(h.provider.retrieve().await.is_err());
    assert_eq!(h.client.call_count(), 1);

    // The next retrieval is a new attempt driven by the caller.
    assert!(h.provider.retrieve().await.is_ok());
    assert_eq!(h.client.call_count(), 2);
}

#[tokio::test]
async fn test_mfa_prompted_once_per_new_session_only() {
    let config = ProviderConfig::new("work").with_mfa_serial("arn:device1");
    let mut h = harness(config, MockSessionTokenClient::new());

    for _ in 0..3 {
        h.provider.retrieve().await.unwrap();
    }

    assert_eq!(h.codes.call_count(), 1);
    assert_eq!(h.client.call_count(), 1);
    assert_eq!(h.cache.lookup_count(), 3);
}

#[tokio::test]
async fn test_memory_cache_reuses_session_across_retrievals() {
    let client = Arc::new(MockSessionTokenClient::new());
    let mut provider = SessionTokenProvider::new(
        ProviderConfig::new("work"),
        client.clone(),
        Arc::new(MemorySessionCache::new()),
        MasterCredentials::new("AKIAMASTER000001", "master-secret"),
    )
    .unwrap();

    let first = provider.retrieve().await.unwrap();
    let second = provider.retrieve().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn test_providers_share_cache_by_key() {
    let client = Arc::new(MockSessionTokenClient::new());
    let cache = Arc::new(MemorySessionCache::new());
    let master = MasterCredentials::new("AKIAMASTER000001", "master-secret");

    let mut plain = SessionTokenProvider::new(
        ProviderConfig::new("work"),
        client.clone(),
        cache.clone(),
        master.clone(),
    )
    .unwrap();
    let mut with_mfa = SessionTokenProvider::new(
        ProviderConfig::new("work").with_mfa_serial("arn:device1"),
        client.clone(),
        cache.clone(),
        master,
    )
    .unwrap()
    .with_code_source(Arc::new(MockCodeSource::new("123456")));

    let a = plain.retrieve().await.unwrap();
    let b = with_mfa.retrieve().await.unwrap();

    assert_ne!(a.access_key_id, b.access_key_id);
    assert_eq!(client.call_count(), 2);
    assert_eq!(cache.len().await, 2);
}

#[tokio::test]
async fn test_needs_refresh_tracks_window() {
    let expiration = Utc::now() + Duration::seconds(600);
    let config = ProviderConfig::new("work")
        .with_expiration_window(std::time::Duration::from_secs(120));
    let mut h = harness(config, MockSessionTokenClient::new().with_expiration(expiration));

    h.provider.retrieve().await.unwrap();

    let deadline = expiration - Duration::seconds(120);
    assert!(!h.provider.is_expired());
    assert!(!h.provider.needs_refresh(deadline - Duration::seconds(1)));
    assert!(h.provider.needs_refresh(deadline));
}
