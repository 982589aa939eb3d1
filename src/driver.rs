//! Driver traits: the wire-protocol seam and the registrable driver interface.
//!
//! Two traits sit on either side of the credential-refresh logic:
//!
//! - [`WireDriver`] opens a real connection from a dialect-native DSN. It
//!   knows nothing about tokens.
//! - [`Driver`] is what callers open connections through. The IAM driver
//!   implements it by turning the caller's DSN into a token-embedded DSN
//!   and handing that to a [`WireDriver`].

use crate::{Dialect, Result};
use async_trait::async_trait;
use std::any::Any;
use std::fmt;

/// An open database connection.
///
/// Connections are returned as `Box<dyn Connection>`; callers that know the
/// concrete driver recover the underlying type with
/// [`into_any`](Connection::into_any):
///
/// ```ignore
/// let conn = registry.open("aws_postgres_iam", dsn).await?;
/// let pg: Box<sqlx::PgConnection> = conn.into_any().downcast().unwrap();
/// ```
pub trait Connection: fmt::Debug + Send + 'static {
    /// Returns the dialect of the connected database.
    fn dialect(&self) -> Dialect;

    /// Converts the connection into `Box<dyn Any>` for downcasting.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

/// A wire-protocol driver for a single dialect.
///
/// Implementations must be `Send + Sync`; the connection-pool machinery of
/// the caller may open connections from several tasks at once.
#[async_trait]
pub trait WireDriver: Send + Sync {
    /// Returns the dialect whose DSNs this driver accepts.
    fn dialect(&self) -> Dialect;

    /// Opens a connection from a dialect-native DSN.
    ///
    /// # Errors
    ///
    /// Returns an error if the DSN cannot be used or the server refuses the
    /// connection (including an expired or invalid auth token).
    async fn open(&self, dsn: &str) -> Result<Box<dyn Connection>>;
}

/// A named driver that can be placed in a [`DriverRegistry`](crate::factory::DriverRegistry).
#[async_trait]
pub trait Driver: Send + Sync {
    /// Returns the registered driver name (e.g., `aws_postgres_iam`).
    fn name(&self) -> &str;

    /// Returns the dialect of the DSNs this driver accepts.
    fn dialect(&self) -> Dialect;

    /// Opens a connection from an application-supplied DSN.
    async fn open(&self, dsn: &str) -> Result<Box<dyn Connection>>;
}
