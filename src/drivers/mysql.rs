//! MySQL wire driver backed by sqlx.
//!
//! Opens connections from `user:password@tcp(host:port)/dbname?params`
//! DSNs. Recognized params:
//!
//! - `allowCleartextPasswords`: enables the cleartext auth plugin, which
//!   RDS requires for IAM tokens
//! - `tls`: `true`, `skip-verify`, `preferred` or `false`

use crate::driver::{Connection, WireDriver};
use crate::{dsn, Dialect, IamError, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlSslMode};
use sqlx::ConnectOptions;
use std::any::Any;
use std::collections::HashMap;
use tracing::debug;

impl Connection for MySqlConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// MySQL wire driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDriver;

impl MySqlDriver {
    /// Creates the driver.
    pub fn new() -> Self {
        Self
    }

    /// Translates a mysql DSN into sqlx connect options.
    pub fn connect_options(dsn: &str) -> Result<MySqlConnectOptions> {
        let values = dsn::fields(Dialect::Mysql, dsn)?;

        let port = required(&values, "port")?;
        let port = port
            .parse()
            .map_err(|_| IamError::InvalidDsn(format!("invalid mysql port: {}", port)))?;

        let mut options = MySqlConnectOptions::new()
            .host(required(&values, "host")?)
            .port(port)
            .username(required(&values, "user")?)
            .password(required(&values, "password")?)
            .database(required(&values, "dbname")?);

        let params = values.get("params").map(String::as_str).unwrap_or_default();
        for param in params.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = param.split_once('=').unwrap_or((param, ""));
            options = match key {
                "allowCleartextPasswords" => {
                    options.enable_cleartext_plugin(matches!(value, "true" | "1"))
                }
                "tls" => options.ssl_mode(tls_mode(value)?),
                other => {
                    debug!(key = other, "ignoring unsupported mysql DSN param");
                    options
                }
            };
        }

        Ok(options)
    }
}

fn required<'a>(values: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    values
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| IamError::InvalidDsn(format!("mysql DSN is missing the {} field", key)))
}

fn tls_mode(value: &str) -> Result<MySqlSslMode> {
    match value {
        "true" => Ok(MySqlSslMode::VerifyIdentity),
        "skip-verify" => Ok(MySqlSslMode::Required),
        "preferred" => Ok(MySqlSslMode::Preferred),
        "false" => Ok(MySqlSslMode::Disabled),
        other => Err(IamError::InvalidDsn(format!("unsupported tls mode: {}", other))),
    }
}

#[async_trait]
impl WireDriver for MySqlDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    async fn open(&self, dsn: &str) -> Result<Box<dyn Connection>> {
        let options = Self::connect_options(dsn)?;
        let conn = options.connect().await?;
        Ok(Box::new(conn))
    }
}
