//! Configuration types for driver setup.

use crate::{IamError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Region used when neither the request nor the environment provides one.
pub const DEFAULT_REGION: &str = "ap-south-1";

/// Maximum lifetime of an RDS IAM auth token.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(900);

/// Database wire-protocol flavor.
///
/// The dialect decides the DSN grammar, the default port and which
/// wire driver a rendered DSN is handed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PostgreSQL `key=value` DSNs (default port 5432)
    #[default]
    Postgres,
    /// MySQL `user:password@tcp(host:port)/dbname` DSNs (default port 3306)
    Mysql,
}

impl Dialect {
    /// Default TCP port for the dialect.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Postgres => 5432,
            Self::Mysql => 3306,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres => write!(f, "postgres"),
            Self::Mysql => write!(f, "mysql"),
        }
    }
}

impl FromStr for Dialect {
    type Err = IamError;

    /// Parses a dialect name.
    ///
    /// # Errors
    ///
    /// Returns [`IamError::InvalidDialect`] for anything other than
    /// `postgres` or `mysql`.
    ///
    /// # Example
    ///
    /// ```
    /// use rdsiam::Dialect;
    ///
    /// assert_eq!("mysql".parse::<Dialect>().unwrap(), Dialect::Mysql);
    /// assert!("oracle".parse::<Dialect>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "postgres" => Ok(Self::Postgres),
            "mysql" => Ok(Self::Mysql),
            other => Err(IamError::InvalidDialect(other.to_string())),
        }
    }
}

/// Configuration for an IAM identity session and the drivers built on it.
///
/// Use the builder pattern for ergonomic configuration:
///
/// ```
/// use rdsiam::{Config, Dialect};
///
/// let config = Config::new(Dialect::Mysql)
///     .with_region("us-west-2")
///     .with_profile("prod");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database dialect
    pub dialect: Dialect,

    /// AWS region override (default: SDK region chain, then `ap-south-1`)
    pub region: Option<String>,

    /// AWS shared config profile name
    pub profile: Option<String>,

    /// Custom endpoint URL for the AWS SDK (for LocalStack testing)
    pub endpoint: Option<String>,

    /// Lifetime requested for signed tokens (default: 15 minutes)
    #[serde(with = "ttl_secs")]
    pub token_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: Dialect::Postgres,
            region: None,
            profile: None,
            endpoint: None,
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

impl Config {
    /// Creates a new configuration for the specified dialect.
    ///
    /// # Example
    ///
    /// ```
    /// use rdsiam::{Config, Dialect};
    ///
    /// let config = Config::new(Dialect::Mysql);
    /// assert_eq!(config.dialect, Dialect::Mysql);
    /// ```
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    /// Builds a configuration from environment variables.
    ///
    /// - `RDS_IAM_DIALECT`: `postgres` (default) or `mysql`
    /// - `AWS_REGION`: region override
    /// - `AWS_PROFILE`: shared config profile
    /// - `RDS_IAM_ENDPOINT`: custom AWS endpoint URL
    ///
    /// # Errors
    ///
    /// Returns [`IamError::InvalidDialect`] if `RDS_IAM_DIALECT` is set to
    /// an unsupported value.
    pub fn from_env() -> Result<Self> {
        let dialect = match std::env::var("RDS_IAM_DIALECT") {
            Ok(value) => value.to_lowercase().parse()?,
            Err(_) => Dialect::default(),
        };

        let mut config = Self::new(dialect);
        config.region = std::env::var("AWS_REGION").ok().filter(|v| !v.is_empty());
        config.profile = std::env::var("AWS_PROFILE").ok().filter(|v| !v.is_empty());
        config.endpoint = std::env::var("RDS_IAM_ENDPOINT")
            .ok()
            .filter(|v| !v.is_empty());

        Ok(config)
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a JSON configuration file.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = tokio::fs::read_to_string(path).await?;
        Self::from_json(&data)
    }

    /// Sets the AWS region, overriding the SDK region chain.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets the AWS shared config profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Sets a custom AWS endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the lifetime requested for signed tokens.
    ///
    /// RDS rejects tokens older than 15 minutes regardless of this value.
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }
}

mod ttl_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(ttl.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
