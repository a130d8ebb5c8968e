//! Basic usage example.
//!
//! Retrieves credentials twice for an MFA-protected profile using the mock
//! token service: the first call requests a session (and a code), the second
//! is served from the cache.
//!
//! Run with: cargo run --example basic

use std::sync::Arc;
use tokenmux::backends::mock::MockSessionTokenClient;
use tokenmux::mfa::StaticCodeSource;
use tokenmux::session::MemorySessionCache;
use tokenmux::{MasterCredentials, ProviderConfig, SessionTokenProvider};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> tokenmux::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ProviderConfig::new("work")
        .with_session_duration(std::time::Duration::from_secs(900))
        .with_mfa_serial("arn:aws:iam::123456789012:mfa/alice");

    let mut provider = SessionTokenProvider::new(
        config,
        Arc::new(MockSessionTokenClient::new()),
        Arc::new(MemorySessionCache::new()),
        MasterCredentials::new("AKIAEXAMPLEMASTER", "master-secret"),
    )?
    .with_code_source(Arc::new(StaticCodeSource::new("123456")?));

    let first = provider.retrieve().await?;
    println!("first:  {:?}", first);

    let second = provider.retrieve().await?;
    println!("second: {:?}", second);

    println!("refresh due at {:?}", provider.expires_at());
    Ok(())
}
