//! AWS STS `GetSessionToken` client.
//!
//! This backend issues sessions through the official AWS SDK. The SDK's own
//! credential chain is not used for signing: every request is signed with the
//! [`MasterCredentials`] handed in by the provider.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokenmux::backends::sts::StsClient;
//! use tokenmux::session::MemorySessionCache;
//! use tokenmux::{MasterCredentials, ProviderConfig, SessionTokenProvider};
//!
//! #[tokio::main]
//! async fn main() -> tokenmux::Result<()> {
//!     let config = ProviderConfig::new("work").with_region("us-west-2");
//!     let client = StsClient::from_config(&config).await;
//!
//!     let mut provider = SessionTokenProvider::new(
//!         config,
//!         Arc::new(client),
//!         Arc::new(MemorySessionCache::new()),
//!         MasterCredentials::new("AKIA...", "..."),
//!     )?;
//!
//!     let creds = provider.retrieve().await?;
//!     println!("expires at {}", creds.expiration);
//!     Ok(())
//! }
//! ```

use crate::transport::{IssuedSession, SessionTokenClient, SessionTokenRequest};
use crate::{MasterCredentials, ProviderConfig, Result, TokenmuxError};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_sts::config::Credentials;
use aws_sdk_sts::error::DisplayErrorContext;
use aws_sdk_sts::Client;

/// Region used when neither the configuration nor the environment names one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Name reported by the static credentials handed to the SDK.
const CREDENTIALS_PROVIDER_NAME: &str = "tokenmux";

/// AWS STS session-token client.
pub struct StsClient {
    sdk_config: SdkConfig,
}

impl StsClient {
    /// Loads SDK configuration for the region in `config`.
    ///
    /// Falls back to the environment's region, then to `us-east-1`.
    pub async fn from_config(config: &ProviderConfig) -> Self {
        Self::load(config.region.clone(), None).await
    }

    /// Like [`from_config`](Self::from_config) but sends requests to a custom
    /// endpoint (for LocalStack testing).
    pub async fn with_endpoint(config: &ProviderConfig, endpoint: impl Into<String>) -> Self {
        Self::load(config.region.clone(), Some(endpoint.into())).await
    }

    async fn load(region: Option<String>, endpoint: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }

        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let mut sdk_config = loader.load().await;

        if sdk_config.region().is_none() {
            tracing::debug!("no region configured, using {} for STS", DEFAULT_REGION);
            sdk_config = sdk_config
                .into_builder()
                .region(Region::new(DEFAULT_REGION))
                .build();
        }

        Self { sdk_config }
    }

    fn client_for(&self, master: &MasterCredentials) -> Client {
        let credentials = Credentials::new(
            master.access_key_id.clone(),
            master.secret_access_key.clone(),
            master.session_token.clone(),
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let conf = aws_sdk_sts::config::Builder::from(&self.sdk_config)
            .credentials_provider(credentials)
            .build();

        Client::from_conf(conf)
    }
}

#[async_trait]
impl SessionTokenClient for StsClient {
    async fn get_session_token(
        &self,
        request: &SessionTokenRequest,
        master: &MasterCredentials,
    ) -> Result<IssuedSession> {
        let duration = i32::try_from(request.duration_seconds).map_err(|_| {
            TokenmuxError::InvalidConfig(format!(
                "session duration of {}s is out of range",
                request.duration_seconds
            ))
        })?;

        let response = self
            .client_for(master)
            .get_session_token()
            .duration_seconds(duration)
            .set_serial_number(request.serial_number.clone())
            .set_token_code(request.token_code.clone())
            .send()
            .await
            .map_err(|e| TokenmuxError::Issuance(DisplayErrorContext(&e).to_string()))?;

        let creds = response.credentials().ok_or_else(|| {
            TokenmuxError::Issuance("STS returned no credentials".to_string())
        })?;

        let expires = creds.expiration();
        let expiration = chrono::DateTime::from_timestamp(expires.secs(), expires.subsec_nanos())
            .ok_or_else(|| {
                TokenmuxError::Issuance("STS returned an unrepresentable expiration".to_string())
            })?;

        Ok(IssuedSession {
            access_key_id: creds.access_key_id().to_string(),
            secret_access_key: creds.secret_access_key().to_string(),
            session_token: creds.session_token().to_string(),
            expiration,
        })
    }
}
