//! Error types for rdsiam operations.

use thiserror::Error;

/// Result type alias using [`IamError`].
pub type Result<T> = std::result::Result<T, IamError>;

/// Errors that can occur while building or opening IAM-authenticated connections.
///
/// All errors implement `std::error::Error` and can be chained with `source()`.
/// Auth tokens are never included in error messages.
#[derive(Debug, Error)]
pub enum IamError {
    /// Dialect string is neither `postgres` nor `mysql`.
    #[error("invalid dialect: {0} (only 'postgres' or 'mysql' is supported)")]
    InvalidDialect(String),

    /// DSN does not match the grammar of its dialect.
    #[error("invalid DSN: {0}")]
    InvalidDsn(String),

    /// Connection request has fields that cannot be rendered into a DSN.
    #[error("invalid connection request: {0}")]
    InvalidRequest(String),

    /// The identity session failed to sign an auth token.
    #[error("unable to generate auth token for {endpoint}: {source}")]
    TokenGenerationFailed {
        /// Database endpoint (`host:port`)
        endpoint: String,
        /// Underlying error
        #[source]
        source: Box<IamError>,
    },

    /// The wire driver failed to open a connection with a freshly minted token.
    #[error("{driver}: open failed: {source}")]
    ConnectionOpenFailed {
        /// Registered driver name
        driver: String,
        /// Underlying error
        #[source]
        source: Box<IamError>,
    },

    /// A driver with this name is already registered.
    #[error("driver already registered: {0}")]
    DriverAlreadyRegistered(String),

    /// No driver is registered under this name.
    #[error("unknown driver: {0}")]
    UnknownDriver(String),

    /// Database driver error.
    #[cfg(any(feature = "postgres", feature = "mysql"))]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IamError {
    /// Wraps a signing failure with the endpoint it was minted for.
    ///
    /// # Example
    ///
    /// ```
    /// use rdsiam::IamError;
    ///
    /// let err = IamError::token_generation(
    ///     "db1:5432",
    ///     IamError::Other(anyhow::anyhow!("no credentials")),
    /// );
    ///
    /// assert_eq!(
    ///     err.to_string(),
    ///     "unable to generate auth token for db1:5432: no credentials"
    /// );
    /// ```
    pub fn token_generation(endpoint: impl Into<String>, err: IamError) -> Self {
        Self::TokenGenerationFailed {
            endpoint: endpoint.into(),
            source: Box::new(err),
        }
    }

    /// Wraps a wire driver failure with the driver it came from.
    pub fn connection_open(driver: impl Into<String>, err: IamError) -> Self {
        Self::ConnectionOpenFailed {
            driver: driver.into(),
            source: Box::new(err),
        }
    }
}
