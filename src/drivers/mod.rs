//! Built-in collaborators: identity sessions and wire drivers.

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "aws")]
pub mod aws;

use crate::driver::WireDriver;
use crate::{Dialect, IamError, Result};
use std::sync::Arc;

/// Returns the compiled-in wire driver for a dialect.
///
/// # Errors
///
/// Returns an error with a feature flag hint if the driver for `dialect`
/// was not compiled in.
pub fn wire_driver(dialect: Dialect) -> Result<Arc<dyn WireDriver>> {
    match dialect {
        #[cfg(feature = "postgres")]
        Dialect::Postgres => Ok(Arc::new(postgres::PostgresDriver::new())),
        #[cfg(feature = "mysql")]
        Dialect::Mysql => Ok(Arc::new(mysql::MySqlDriver::new())),
        #[allow(unreachable_patterns)]
        other => Err(IamError::Other(anyhow::anyhow!(
            "no wire driver for {} (did you enable the '{}' feature flag?)",
            other,
            other
        ))),
    }
}
