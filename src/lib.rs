//! Tokenmux - cached, MFA-aware session-token credentials.
//!
//! Tokenmux hands out short-lived credentials issued by a session-token
//! service (AWS STS `GetSessionToken`) for a named profile. It reuses a
//! cached session while the cache still holds one, requests a new one when
//! it does not, and attaches a one-time MFA code when the profile needs it.
//!
//! # Features
//!
//! - **Cache first**: sessions are keyed by profile and MFA device
//! - **MFA aware**: one code per new session, never per retrieval
//! - **Early refresh**: expiry is tracked with a configurable safety window
//! - **Pluggable**: transport, cache, code source and event sink are traits
//! - **Redacted**: secrets never appear in `Debug` output or logs
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use tokenmux::backends::mock::MockSessionTokenClient;
//! use tokenmux::session::MemorySessionCache;
//! use tokenmux::{MasterCredentials, ProviderConfig, SessionTokenProvider};
//!
//! #[tokio::main]
//! async fn main() -> tokenmux::Result<()> {
//!     let config = ProviderConfig::new("work");
//!
//!     let mut provider = SessionTokenProvider::new(
//!         config,
//!         Arc::new(MockSessionTokenClient::new()),
//!         Arc::new(MemorySessionCache::new()),
//!         MasterCredentials::new("AKIAEXAMPLE", "secret"),
//!     )?;
//!
//!     // First call requests a session, second is served from the cache
//!     let first = provider.retrieve().await?;
//!     let second = provider.retrieve().await?;
//!     assert_eq!(first.access_key_id, second.access_key_id);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Feature Flags
//!
//! | Feature | Default | Provides |
//! |---------|---------|----------|
//! | `mock` | yes | In-memory collaborators with error injection |
//! | `aws` | no | [`backends::sts::StsClient`] over `aws-sdk-sts` |

pub mod backends;
pub mod config;
pub mod credential;
pub mod error;
pub mod events;
pub mod expiry;
pub mod mfa;
pub mod provider;
pub mod session;
pub mod transport;
pub mod validation;

pub use config::ProviderConfig;
pub use credential::{Credential, MasterCredentials};
pub use error::{Result, TokenmuxError};
pub use events::{EventSink, ProviderEvent, TracingSink};
pub use expiry::Expiry;
pub use mfa::CodeSource;
pub use provider::SessionTokenProvider;
pub use session::{CachedSession, SessionCache, SessionKey};
pub use transport::{IssuedSession, SessionTokenClient, SessionTokenRequest};
