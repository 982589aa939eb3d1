//! AWS identity session implementation.

use crate::config::DEFAULT_REGION;
use crate::{Config, IamError, IdentitySession, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_rds::auth_token::{AuthTokenGenerator, Config as AuthTokenConfig};
use std::time::Duration;

/// AWS identity session.
///
/// Credentials come from the SDK's default chain and are refreshed by the
/// SDK. Tokens are SigV4-presigned `rds-db:connect` requests.
#[derive(Debug, Clone)]
pub struct AwsSession {
    sdk_config: SdkConfig,
    region: String,
    token_ttl: Duration,
}

impl AwsSession {
    /// Wraps an already loaded SDK configuration.
    ///
    /// The region is taken from the SDK configuration, falling back to
    /// `ap-south-1`.
    pub fn new(sdk_config: SdkConfig) -> Self {
        let region = sdk_config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Self {
            sdk_config,
            region,
            token_ttl: crate::config::DEFAULT_TOKEN_TTL,
        }
    }

    /// Loads SDK configuration (credentials, region, profile) from the
    /// environment, applying the overrides in `config`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(ref region) = config.region {
            loader = loader.region(Region::new(region.clone()));
        }

        if let Some(ref profile) = config.profile {
            loader = loader.profile_name(profile);
        }

        // Custom endpoint (for LocalStack testing)
        if let Some(ref endpoint) = config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        if sdk_config.credentials_provider().is_none() {
            return Err(IamError::Other(anyhow::anyhow!(
                "no AWS credentials provider configured"
            )));
        }

        Ok(Self::new(sdk_config).with_token_ttl(config.token_ttl))
    }

    /// Sets the lifetime requested for signed tokens.
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }
}

/// Splits `host:port` at the last colon.
fn split_endpoint(endpoint: &str) -> Result<(&str, u64)> {
    let (host, port) = endpoint
        .rsplit_once(':')
        .ok_or_else(|| IamError::InvalidRequest(format!("endpoint has no port: {}", endpoint)))?;

    let port = port
        .parse()
        .map_err(|_| IamError::InvalidRequest(format!("invalid endpoint port: {}", endpoint)))?;

    Ok((host, port))
}

#[async_trait]
impl IdentitySession for AwsSession {
    fn region(&self) -> &str {
        &self.region
    }

    async fn sign(&self, endpoint: &str, region: &str, user: &str) -> Result<String> {
        let (host, port) = split_endpoint(endpoint)?;

        let config = AuthTokenConfig::builder()
            .hostname(host)
            .port(port)
            .username(user)
            .region(Region::new(region.to_string()))
            .expires_in(self.token_ttl.as_secs())
            .build()
            .map_err(|e| IamError::Other(anyhow::anyhow!("invalid auth token config: {}", e)))?;

        let token = AuthTokenGenerator::new(config)
            .auth_token(&self.sdk_config)
            .await
            .map_err(|e| IamError::Other(anyhow::anyhow!("AWS error: {}", e)))?;

        Ok(token.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_endpoint() {
        assert_eq!(split_endpoint("db1.example.com:5432").unwrap(), ("db1.example.com", 5432));
        assert!(split_endpoint("db1.example.com").is_err());
        assert!(split_endpoint("db1:port").is_err());
    }

    #[test]
    fn test_region_from_sdk_config() {
        let sdk_config = SdkConfig::builder()
            .region(Region::new("eu-central-1"))
            .build();

        let session = AwsSession::new(sdk_config);
        assert_eq!(session.region(), "eu-central-1");
    }

    #[test]
    fn test_default_region() {
        let session = AwsSession::new(SdkConfig::builder().build());
        assert_eq!(session.region(), "ap-south-1");
    }
}
