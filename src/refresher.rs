//! Credential refresh: token-embedded DSNs with a per-driver cache.
//!
//! [`CredentialRefresher`] turns an application DSN into a DSN carrying a
//! freshly signed auth token, and remembers the result so later connection
//! attempts can reuse the token until the database starts rejecting it.
//!
//! # Cache behavior
//!
//! - One entry per distinct application DSN, overwritten on regeneration.
//! - A cached DSN is never inspected for expiry. It is retried once; if the
//!   wire driver refuses it, the error is discarded, a [`FallbackEvent`] is
//!   emitted and a new token is minted.
//! - Entries are never evicted. The cache grows with the number of distinct
//!   DSNs the process ever connects with.

use crate::driver::{Connection, WireDriver};
use crate::iam::driver_name;
use crate::token::mint_token;
use crate::validation::validate_request;
use crate::{dsn, Dialect, IamError, IdentitySession, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Callback invoked when a cached DSN fails to open and is discarded.
pub type FallbackHook = Arc<dyn Fn(&FallbackEvent) + Send + Sync>;

/// A cached DSN was refused by the wire driver and a new token will be minted.
#[derive(Debug, Clone)]
pub struct FallbackEvent {
    /// Name of the driver owning the cache
    pub driver: String,
    /// Dialect of the driver
    pub dialect: Dialect,
    /// Message of the discarded open error
    pub error: String,
    /// When the cached DSN was discarded
    pub at: DateTime<Utc>,
}

/// Produces connections authenticated with IAM auth tokens.
///
/// # Example
///
/// ```
/// use rdsiam::drivers::mock::{MockSession, MockWireDriver};
/// use rdsiam::{CredentialRefresher, Dialect};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> rdsiam::Result<()> {
///     let session = Arc::new(MockSession::new("us-east-1"));
///     let wire = Arc::new(MockWireDriver::new(Dialect::Postgres));
///     let refresher = CredentialRefresher::new(Dialect::Postgres, session, wire);
///     assert_eq!(refresher.name(), "aws_postgres_iam");
///
///     let _conn = refresher.acquire("host=db1 user=alice dbname=app").await?;
///     assert_eq!(refresher.cache_len().await, 1);
///     Ok(())
/// }
/// ```
pub struct CredentialRefresher {
    name: String,
    dialect: Dialect,
    session: Arc<dyn IdentitySession>,
    wire: Arc<dyn WireDriver>,
    cache: RwLock<HashMap<String, String>>,
    fallbacks: AtomicU64,
    on_fallback: Option<FallbackHook>,
}

impl CredentialRefresher {
    /// Creates a refresher with an empty cache, named after its dialect's
    /// IAM driver.
    pub fn new(
        dialect: Dialect,
        session: Arc<dyn IdentitySession>,
        wire: Arc<dyn WireDriver>,
    ) -> Self {
        Self {
            name: driver_name(dialect),
            dialect,
            session,
            wire,
            cache: RwLock::new(HashMap::new()),
            fallbacks: AtomicU64::new(0),
            on_fallback: None,
        }
    }

    /// Registers a callback for discarded cache entries.
    pub fn on_fallback(mut self, hook: impl Fn(&FallbackEvent) + Send + Sync + 'static) -> Self {
        self.on_fallback = Some(Arc::new(hook));
        self
    }

    /// Returns the name used in logs, errors and fallback events.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the dialect DSNs are parsed and rendered with.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Opens a connection for an application DSN.
    ///
    /// A cached token-embedded DSN is tried first. If there is none, or the
    /// wire driver refuses it, a new DSN is generated, cached and opened.
    ///
    /// # Errors
    ///
    /// - [`IamError::InvalidDsn`]: `dsn` does not match the dialect grammar
    ///   or names a port outside `1..=65535`
    /// - [`IamError::InvalidRequest`]: the session reports an empty region
    /// - [`IamError::TokenGenerationFailed`]: the session could not sign a token
    /// - [`IamError::ConnectionOpenFailed`]: the freshly generated DSN was refused
    pub async fn acquire(&self, dsn: &str) -> Result<Box<dyn Connection>> {
        let cached = self.cache.read().await.get(dsn).cloned();

        if let Some(iam_dsn) = cached {
            match self.wire.open(&iam_dsn).await {
                Ok(conn) => {
                    debug!(driver = %self.name, "using cached IAM DSN");
                    return Ok(conn);
                }
                Err(e) => self.record_fallback(&e),
            }
        }

        let iam_dsn = self.generate_dsn(dsn).await?;
        self.cache
            .write()
            .await
            .insert(dsn.to_string(), iam_dsn.clone());

        self.wire
            .open(&iam_dsn)
            .await
            .map_err(|e| IamError::connection_open(&self.name, e))
    }

    /// Builds a token-embedded DSN without touching the cache.
    pub async fn generate_dsn(&self, dsn: &str) -> Result<String> {
        let mut request = dsn::parse(self.dialect, dsn)?.normalized();
        request.region = self.session.region().to_string();
        validate_request(&request)?;

        let token = mint_token(
            self.session.as_ref(),
            &request.endpoint(),
            &request.region,
            &request.user,
        )
        .await?;

        info!(
            driver = %self.name,
            host = %request.host,
            port = request.port,
            user = %request.user,
            "created new IAM DSN"
        );

        Ok(dsn::render(&request, &token))
    }

    /// Returns the cached token-embedded DSN for an application DSN.
    pub async fn cached_dsn(&self, dsn: &str) -> Option<String> {
        self.cache.read().await.get(dsn).cloned()
    }

    /// Returns the number of cached DSNs.
    pub async fn cache_len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Returns how many cached DSNs have been discarded after a failed open.
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    fn record_fallback(&self, err: &IamError) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
        debug!(driver = %self.name, error = %err, "cached IAM DSN refused, regenerating");

        if let Some(hook) = &self.on_fallback {
            hook(&FallbackEvent {
                driver: self.name.clone(),
                dialect: self.dialect,
                error: err.to_string(),
                at: Utc::now(),
            });
        }
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::drivers::mock::{MockSession, MockWireDriver};
    use std::sync::Mutex;

    fn refresher(dialect: Dialect) -> (CredentialRefresher, Arc<MockSession>, Arc<MockWireDriver>) {
        let session = Arc::new(MockSession::new("us-east-1"));
        let wire = Arc::new(MockWireDriver::new(dialect));
        let refresher = CredentialRefresher::new(dialect, session.clone(), wire.clone());
        (refresher, session, wire)
    }

    #[tokio::test]
    async fn test_first_acquire_mints_and_caches() {
        let (refresher, session, wire) = refresher(Dialect::Postgres);
        let dsn = "host=db1 port=5432 user=alice dbname=app";

        refresher.acquire(dsn).await.unwrap();

        assert_eq!(session.sign_count(), 1);
        assert_eq!(session.signed()[0].endpoint, "db1:5432");
        assert_eq!(session.signed()[0].user, "alice");
        assert_eq!(session.signed()[0].region, "us-east-1");

        let expected = "host=db1 port=5432 user=alice password=mock-token-1:db1:5432:us-east-1:alice dbname=app";
        assert_eq!(wire.opened(), vec![expected.to_string()]);
        assert_eq!(refresher.cached_dsn(dsn).await.as_deref(), Some(expected));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_minting() {
        let (refresher, session, wire) = refresher(Dialect::Postgres);
        let dsn = "host=db1 port=5432 user=alice dbname=app";

        refresher.acquire(dsn).await.unwrap();
        refresher.acquire(dsn).await.unwrap();

        assert_eq!(session.sign_count(), 1);
        assert_eq!(wire.open_count(), 2);
        assert_eq!(refresher.fallback_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_cache_entry_is_regenerated() {
        let (refresher, session, wire) = refresher(Dialect::Mysql);
        let dsn = "alice:unused@tcp(db1:3306)/app";

        refresher.acquire(dsn).await.unwrap();
        let first = refresher.cached_dsn(dsn).await.unwrap();

        wire.reject(&first);
        refresher.acquire(dsn).await.unwrap();

        let second = refresher.cached_dsn(dsn).await.unwrap();
        assert_eq!(session.sign_count(), 2);
        assert_ne!(first, second);
        assert_eq!(refresher.cache_len().await, 1);
        assert_eq!(refresher.fallback_count(), 1);
        assert_eq!(wire.opened(), vec![first.clone(), first, second]);
    }

    #[tokio::test]
    async fn test_fallback_hook_receives_discarded_error() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();

        let session = Arc::new(MockSession::new("us-east-1"));
        let wire = Arc::new(MockWireDriver::new(Dialect::Postgres));
        let refresher = CredentialRefresher::new(Dialect::Postgres, session, wire.clone())
            .on_fallback(move |event| sink.lock().unwrap().push(event.clone()));

        let dsn = "host=db1 user=alice";
        refresher.acquire(dsn).await.unwrap();
        wire.reject(&refresher.cached_dsn(dsn).await.unwrap());
        refresher.acquire(dsn).await.unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].driver, "aws_postgres_iam");
        assert_eq!(events[0].dialect, Dialect::Postgres);
        assert!(events[0].error.contains("rejected"));
    }

    #[tokio::test]
    async fn test_second_generation_failure_is_returned() {
        let (refresher, session, wire) = refresher(Dialect::Postgres);
        wire.fail_all(true);

        let err = refresher.acquire("host=db1 user=alice").await.unwrap_err();

        assert!(matches!(
            err,
            IamError::ConnectionOpenFailed { ref driver, .. } if driver == "aws_postgres_iam"
        ));
        assert_eq!(session.sign_count(), 1);
        assert_eq!(refresher.cache_len().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_dsn_is_returned() {
        let (refresher, session, wire) = refresher(Dialect::Postgres);

        let err = refresher.acquire("postgres://ignored").await.unwrap_err();

        assert!(matches!(err, IamError::InvalidDsn(_)));
        assert_eq!(session.sign_count(), 0);
        assert_eq!(wire.open_count(), 0);
        assert_eq!(refresher.cache_len().await, 0);
    }

    #[tokio::test]
    async fn test_token_failure_is_returned() {
        let (refresher, session, _wire) = refresher(Dialect::Postgres);
        session.fail_signing(Some("no credentials"));

        let err = refresher.acquire("host=db1").await.unwrap_err();

        assert!(matches!(err, IamError::TokenGenerationFailed { .. }));
        assert_eq!(refresher.cache_len().await, 0);
    }

    #[tokio::test]
    async fn test_session_region_overrides_request() {
        let (refresher, session, _wire) = refresher(Dialect::Mysql);

        let iam_dsn = refresher
            .generate_dsn("bob:pw@tcp(db2:3307)/sales")
            .await
            .unwrap();

        assert_eq!(
            iam_dsn,
            "bob:mock-token-1:db2:3307:us-east-1:bob@tcp(db2:3307)/sales?allowCleartextPasswords=true"
        );
        assert_eq!(session.signed()[0].region, "us-east-1");
        assert_eq!(refresher.cache_len().await, 0);
    }

    #[tokio::test]
    async fn test_mysql_user_with_at_sign() {
        let (refresher, session, _wire) = refresher(Dialect::Mysql);

        let iam_dsn = refresher
            .generate_dsn("svc@corp:pw@tcp(db1:3306)/app")
            .await
            .unwrap();

        assert_eq!(
            iam_dsn,
            "svc@corp:mock-token-1:db1:3306:us-east-1:svc@corp@tcp(db1:3306)/app?allowCleartextPasswords=true"
        );
        assert_eq!(session.signed()[0].user, "svc@corp");
    }

    #[tokio::test]
    async fn test_out_of_range_port_is_not_defaulted() {
        let (refresher, session, wire) = refresher(Dialect::Postgres);

        for dsn in ["host=db1 port=65536 user=alice dbname=app", "host=db1 port=-1 user=alice"] {
            let err = refresher.acquire(dsn).await.unwrap_err();
            assert!(matches!(err, IamError::InvalidDsn(_)));
        }

        assert_eq!(session.sign_count(), 0);
        assert_eq!(wire.open_count(), 0);
        assert_eq!(refresher.cache_len().await, 0);
    }

    #[tokio::test]
    async fn test_defaults_fill_partial_dsn() {
        let (refresher, session, _wire) = refresher(Dialect::Postgres);

        let iam_dsn = refresher.generate_dsn("sslmode=require").await.unwrap();

        assert_eq!(
            iam_dsn,
            "host=localhost port=5432 user=postgres password=mock-token-1:localhost:5432:us-east-1:postgres dbname=postgres sslmode=require"
        );
        assert_eq!(session.signed()[0].endpoint, "localhost:5432");
    }
}
