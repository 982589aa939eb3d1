//! The IAM driver: credential refresh exposed as a registrable [`Driver`].

use crate::driver::{Connection, Driver, WireDriver};
use crate::factory::DriverRegistry;
use crate::refresher::CredentialRefresher;
use crate::{Dialect, IamError, IdentitySession, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Returns the registry name of the IAM driver for a dialect.
///
/// ```
/// use rdsiam::{driver_name, Dialect};
///
/// assert_eq!(driver_name(Dialect::Postgres), "aws_postgres_iam");
/// assert_eq!(driver_name(Dialect::Mysql), "aws_mysql_iam");
/// ```
pub fn driver_name(dialect: Dialect) -> String {
    format!("aws_{}_iam", dialect)
}

/// Driver that swaps the password of every DSN for a fresh IAM auth token.
///
/// Each instance owns its own DSN cache.
pub struct IamDriver {
    name: String,
    refresher: CredentialRefresher,
}

impl IamDriver {
    /// Creates a driver for `dialect` that signs with `session` and connects
    /// through `wire`.
    ///
    /// # Errors
    ///
    /// Returns [`IamError::InvalidDialect`] if `wire` speaks a different dialect.
    pub fn new(
        session: Arc<dyn IdentitySession>,
        dialect: Dialect,
        wire: Arc<dyn WireDriver>,
    ) -> Result<Self> {
        if wire.dialect() != dialect {
            return Err(IamError::InvalidDialect(format!(
                "{} wire driver cannot serve {} DSNs",
                wire.dialect(),
                dialect
            )));
        }

        let refresher = CredentialRefresher::new(dialect, session, wire);
        Ok(Self::from_refresher(refresher))
    }

    /// Wraps an already configured refresher (for example one with a
    /// fallback hook). The driver is named after the refresher's dialect.
    pub fn from_refresher(refresher: CredentialRefresher) -> Self {
        Self {
            name: driver_name(refresher.dialect()),
            refresher,
        }
    }

    /// Returns the refresher behind this driver.
    pub fn refresher(&self) -> &CredentialRefresher {
        &self.refresher
    }
}

#[async_trait]
impl Driver for IamDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> Dialect {
        self.refresher.dialect()
    }

    async fn open(&self, dsn: &str) -> Result<Box<dyn Connection>> {
        self.refresher.acquire(dsn).await
    }
}

/// Registers an IAM driver for `dialect` and returns its name.
///
/// Pass the returned name to [`DriverRegistry::open`] together with a DSN in
/// the dialect's native format; its password, if any, is ignored.
///
/// # Errors
///
/// - [`IamError::DriverAlreadyRegistered`]: this dialect already has an IAM
///   driver in `registry`
/// - [`IamError::InvalidDialect`]: `wire` speaks a different dialect
pub fn register_iam_driver(
    registry: &DriverRegistry,
    session: Arc<dyn IdentitySession>,
    dialect: Dialect,
    wire: Arc<dyn WireDriver>,
) -> Result<String> {
    let driver = IamDriver::new(session, dialect, wire)?;
    let name = driver.name().to_string();

    registry.register(&name, Arc::new(driver))?;
    debug!(driver = %name, "registered IAM driver");

    Ok(name)
}

/// Registers an IAM driver backed by the compiled-in sqlx wire driver.
///
/// # Errors
///
/// In addition to the errors of [`register_iam_driver`], fails if the
/// `postgres` or `mysql` feature for `dialect` is not enabled.
pub fn register(
    registry: &DriverRegistry,
    session: Arc<dyn IdentitySession>,
    dialect: Dialect,
) -> Result<String> {
    let wire = crate::drivers::wire_driver(dialect)?;
    register_iam_driver(registry, session, dialect, wire)
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::drivers::mock::{MockConnection, MockSession, MockWireDriver};

    #[test]
    fn test_register_returns_name() {
        let registry = DriverRegistry::new();
        let session = Arc::new(MockSession::new("us-east-1"));

        let pg = register_iam_driver(
            &registry,
            session.clone(),
            Dialect::Postgres,
            Arc::new(MockWireDriver::new(Dialect::Postgres)),
        )
        .unwrap();
        let my = register_iam_driver(
            &registry,
            session,
            Dialect::Mysql,
            Arc::new(MockWireDriver::new(Dialect::Mysql)),
        )
        .unwrap();

        assert_eq!(pg, "aws_postgres_iam");
        assert_eq!(my, "aws_mysql_iam");
        assert_eq!(registry.names(), vec![my, pg]);
    }

    #[test]
    fn test_register_same_dialect_twice() {
        let registry = DriverRegistry::new();
        let session = Arc::new(MockSession::new("us-east-1"));
        let wire = Arc::new(MockWireDriver::new(Dialect::Postgres));

        register_iam_driver(&registry, session.clone(), Dialect::Postgres, wire.clone()).unwrap();
        let result = register_iam_driver(&registry, session, Dialect::Postgres, wire);

        assert!(matches!(result, Err(IamError::DriverAlreadyRegistered(_))));
    }

    #[test]
    fn test_mismatched_wire_driver() {
        let session = Arc::new(MockSession::new("us-east-1"));
        let wire = Arc::new(MockWireDriver::new(Dialect::Mysql));

        let result = IamDriver::new(session, Dialect::Postgres, wire);
        assert!(matches!(result, Err(IamError::InvalidDialect(_))));
    }

    #[tokio::test]
    async fn test_open_through_registry() {
        let registry = DriverRegistry::new();
        let session = Arc::new(MockSession::new("us-east-1"));
        let wire = Arc::new(MockWireDriver::new(Dialect::Postgres));

        let name = register_iam_driver(&registry, session.clone(), Dialect::Postgres, wire).unwrap();
        let conn = registry
            .open(&name, "host=db1 port=5432 user=alice dbname=app")
            .await
            .unwrap();

        let conn = conn.into_any().downcast::<MockConnection>().unwrap();
        assert!(conn.dsn.starts_with("host=db1 port=5432 user=alice password=mock-token-1:"));
        assert_eq!(session.sign_count(), 1);
    }

    #[test]
    fn test_from_refresher_name_follows_dialect() {
        let refresher = CredentialRefresher::new(
            Dialect::Mysql,
            Arc::new(MockSession::new("us-east-1")),
            Arc::new(MockWireDriver::new(Dialect::Mysql)),
        );

        let driver = IamDriver::from_refresher(refresher);
        assert_eq!(driver.name(), "aws_mysql_iam");
        assert_eq!(driver.name(), driver.refresher().name());
        assert_eq!(driver.dialect(), Dialect::Mysql);
    }
}
