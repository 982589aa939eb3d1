//! Mock session and wire driver for testing.
//!
//! These collaborators keep everything in memory, count their calls and
//! support error injection, so code built on rdsiam can be tested without
//! AWS credentials or a database.

use crate::driver::{Connection, WireDriver};
use crate::{Dialect, IamError, IdentitySession, Result};
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// One call to [`MockSession::sign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    /// Endpoint (`host:port`)
    pub endpoint: String,
    /// Region the token was signed for
    pub region: String,
    /// Database user
    pub user: String,
}

/// Mock identity session.
///
/// Tokens have the form `mock-token-<n>:<endpoint>:<region>:<user>`, where
/// `n` counts successful signatures, so every minted token is distinct.
///
/// # Example
///
/// ```
/// use rdsiam::drivers::mock::MockSession;
/// use rdsiam::IdentitySession;
///
/// #[tokio::main]
/// async fn main() -> rdsiam::Result<()> {
///     let session = MockSession::new("us-east-1");
///
///     let token = session.sign("db1:5432", "us-east-1", "alice").await?;
///     assert_eq!(token, "mock-token-1:db1:5432:us-east-1:alice");
///
///     // Test error conditions
///     session.fail_signing(Some("credentials expired"));
///     assert!(session.sign("db1:5432", "us-east-1", "alice").await.is_err());
///
///     Ok(())
/// }
/// ```
pub struct MockSession {
    region: String,
    signed: Mutex<Vec<SignRequest>>,
    sign_error: Mutex<Option<String>>,
}

impl MockSession {
    /// Creates a session for the region.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            signed: Mutex::new(Vec::new()),
            sign_error: Mutex::new(None),
        }
    }

    /// Makes `sign()` fail with `message`, or succeed again with `None`.
    pub fn fail_signing(&self, message: Option<&str>) {
        *self.sign_error.lock().unwrap() = message.map(str::to_string);
    }

    /// Returns how many tokens have been signed.
    pub fn sign_count(&self) -> usize {
        self.signed.lock().unwrap().len()
    }

    /// Returns every successful signing request, oldest first.
    pub fn signed(&self) -> Vec<SignRequest> {
        self.signed.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentitySession for MockSession {
    fn region(&self) -> &str {
        &self.region
    }

    async fn sign(&self, endpoint: &str, region: &str, user: &str) -> Result<String> {
        if let Some(ref message) = *self.sign_error.lock().unwrap() {
            return Err(IamError::Other(anyhow::anyhow!("{}", message)));
        }

        let mut signed = self.signed.lock().unwrap();
        signed.push(SignRequest {
            endpoint: endpoint.to_string(),
            region: region.to_string(),
            user: user.to_string(),
        });

        Ok(format!(
            "mock-token-{}:{}:{}:{}",
            signed.len(),
            endpoint,
            region,
            user
        ))
    }
}

/// Connection returned by [`MockWireDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockConnection {
    /// Dialect of the driver that opened it
    pub dialect: Dialect,
    /// DSN the connection was opened with
    pub dsn: String,
}

impl Connection for MockConnection {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// Mock wire driver.
///
/// Accepts every DSN unless told otherwise, and records each open attempt,
/// successful or not.
pub struct MockWireDriver {
    dialect: Dialect,
    opened: Mutex<Vec<String>>,
    rejected: Mutex<HashSet<String>>,
    fail_all: AtomicBool,
    connections: AtomicUsize,
}

impl MockWireDriver {
    /// Creates a driver for the dialect.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            opened: Mutex::new(Vec::new()),
            rejected: Mutex::new(HashSet::new()),
            fail_all: AtomicBool::new(false),
            connections: AtomicUsize::new(0),
        }
    }

    /// Refuses future opens with exactly this DSN, as a database refuses an
    /// expired token.
    pub fn reject(&self, dsn: &str) {
        self.rejected.lock().unwrap().insert(dsn.to_string());
    }

    /// Refuses every open while `fail` is true.
    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Returns every DSN an open was attempted with, oldest first.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    /// Returns the number of open attempts.
    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    /// Returns the number of successful opens.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WireDriver for MockWireDriver {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn open(&self, dsn: &str) -> Result<Box<dyn Connection>> {
        self.opened.lock().unwrap().push(dsn.to_string());

        if self.fail_all.load(Ordering::SeqCst) || self.rejected.lock().unwrap().contains(dsn) {
            return Err(IamError::Other(anyhow::anyhow!(
                "mock {} server rejected credentials",
                self.dialect
            )));
        }

        self.connections.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            dialect: self.dialect,
            dsn: dsn.to_string(),
        }))
    }
}
