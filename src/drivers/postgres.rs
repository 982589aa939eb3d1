//! PostgreSQL wire driver backed by sqlx.
//!
//! Opens connections from `key=value` DSNs such as the ones rendered by
//! [`dsn::render`](crate::dsn::render).

use crate::driver::{Connection, WireDriver};
use crate::{dsn, Dialect, IamError, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};
use sqlx::ConnectOptions;
use std::any::Any;
use tracing::debug;

impl Connection for PgConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// PostgreSQL wire driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDriver;

impl PostgresDriver {
    /// Creates the driver.
    pub fn new() -> Self {
        Self
    }

    /// Translates a `key=value` DSN into sqlx connect options.
    ///
    /// Keys without a sqlx equivalent are ignored.
    pub fn connect_options(dsn: &str) -> Result<PgConnectOptions> {
        let values = dsn::fields(Dialect::Postgres, dsn)?;
        let mut options = PgConnectOptions::new_without_pgpass();

        for (key, value) in &values {
            options = match key.as_str() {
                "host" => options.host(value),
                "port" => options.port(value.parse().map_err(|_| {
                    IamError::InvalidDsn(format!("invalid postgres port: {}", value))
                })?),
                "user" => options.username(value),
                "password" => options.password(value),
                "dbname" => options.database(value),
                "sslmode" => options.ssl_mode(value.parse::<PgSslMode>()?),
                "sslrootcert" => options.ssl_root_cert(value),
                "application_name" => options.application_name(value),
                other => {
                    debug!(key = other, "ignoring unsupported postgres DSN key");
                    options
                }
            };
        }

        Ok(options)
    }
}

#[async_trait]
impl WireDriver for PostgresDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn open(&self, dsn: &str) -> Result<Box<dyn Connection>> {
        let options = Self::connect_options(dsn)?;
        let conn = options.connect().await?;
        Ok(Box::new(conn))
    }
}
