//! DSN codec: dialect-specific connection strings to and from [`ConnectionRequest`].
//!
//! The two dialects follow the conventions of their wire drivers:
//!
//! | Dialect | Grammar |
//! |---------|---------|
//! | postgres | `host=<h> port=<p> user=<u> password=<pw> dbname=<d> [sslmode=<m>] [sslrootcert=<path>]` |
//! | mysql | `<user>:<password>@tcp(<host>:<port>)/<dbname>[?<params>]` |
//!
//! A rendered DSN can be handed to the matching wire driver unchanged.

use crate::{ConnectionRequest, Dialect, IamError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

static MYSQL_DSN: OnceLock<Regex> = OnceLock::new();

fn mysql_dsn() -> &'static Regex {
    MYSQL_DSN.get_or_init(|| {
        Regex::new(
            r"^(?P<user>[^:]+):(?P<password>[^@]+)@tcp\((?P<host>[^:]+):(?P<port>\d+)\)/(?P<dbname>[^?]+)(?:\?(?P<params>.*))?",
        )
        .expect("mysql DSN pattern is valid")
    })
}

/// Extracts the raw fields of a DSN.
///
/// For postgres every whitespace-separated `key=value` token becomes an
/// entry; tokens without `=` are skipped. For mysql the entries are the
/// named parts of the grammar (`user`, `password`, `host`, `port`,
/// `dbname`, and `params` when a query string is present).
///
/// # Errors
///
/// Returns [`IamError::InvalidDsn`] when nothing could be extracted.
pub fn fields(dialect: Dialect, dsn: &str) -> Result<HashMap<String, String>> {
    let values = match dialect {
        Dialect::Postgres => postgres_fields(dsn),
        Dialect::Mysql => mysql_fields(dsn),
    };

    if values.is_empty() {
        return Err(IamError::InvalidDsn(format!(
            "no {} connection fields found",
            dialect
        )));
    }

    Ok(values)
}

fn postgres_fields(dsn: &str) -> HashMap<String, String> {
    dsn.split_whitespace()
        .filter_map(|token| token.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn mysql_fields(dsn: &str) -> HashMap<String, String> {
    let re = mysql_dsn();
    let Some(caps) = re.captures(dsn) else {
        return HashMap::new();
    };

    re.capture_names()
        .flatten()
        .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
        .collect()
}

/// Parses a DSN into a [`ConnectionRequest`].
///
/// Only the connection parameters are kept; any password in the DSN is
/// dropped. A port that is not a number is treated as unset (`0`).
///
/// # Errors
///
/// Returns [`IamError::InvalidDsn`] if the DSN is empty, does not match
/// the dialect's grammar, or carries a numeric port outside `1..=65535`.
///
/// # Example
///
/// ```
/// use rdsiam::{dsn, Dialect};
///
/// let req = dsn::parse(Dialect::Mysql, "app:secret@tcp(db1:3306)/orders?tls=true")?;
/// assert_eq!(req.user, "app");
/// assert_eq!(req.host, "db1");
/// assert_eq!(req.port, 3306);
/// assert_eq!(req.dbname, "orders");
/// # Ok::<(), rdsiam::IamError>(())
/// ```
pub fn parse(dialect: Dialect, dsn: &str) -> Result<ConnectionRequest> {
    let mut values = fields(dialect, dsn)?;
    let mut take = |key: &str| values.remove(key).unwrap_or_default();

    let port = parse_port(&take("port"))?;

    Ok(ConnectionRequest {
        dialect,
        region: String::new(),
        user: take("user"),
        host: take("host"),
        port,
        dbname: take("dbname"),
        ssl_mode: Some(take("sslmode")).filter(|v| !v.is_empty()),
        ssl_root_cert: Some(take("sslrootcert")).filter(|v| !v.is_empty()),
    })
}

fn parse_port(value: &str) -> Result<u16> {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(0);
    }

    match value.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(IamError::InvalidDsn(format!(
            "port must be between 1 and 65535: {}",
            value
        ))),
    }
}

/// Parses a DSN whose dialect is given by name.
///
/// # Errors
///
/// Returns [`IamError::InvalidDialect`] if `dialect` is not `postgres` or
/// `mysql`, otherwise the errors of [`parse`].
pub fn parse_str(dialect: &str, dsn: &str) -> Result<ConnectionRequest> {
    parse(dialect.parse()?, dsn)
}

/// Renders a request into a DSN with `token` in the password position.
///
/// SSL options are only emitted for postgres and only when set.
///
/// # Example
///
/// ```
/// use rdsiam::{dsn, ConnectionRequest, Dialect};
///
/// let req = ConnectionRequest::new(Dialect::Mysql).normalized();
/// assert_eq!(
///     dsn::render(&req, "tok"),
///     "postgres:tok@tcp(localhost:3306)/postgres?allowCleartextPasswords=true"
/// );
/// ```
pub fn render(req: &ConnectionRequest, token: &str) -> String {
    match req.dialect {
        Dialect::Postgres => {
            let mut dsn = format!(
                "host={} port={} user={} password={} dbname={}",
                req.host, req.port, req.user, token, req.dbname
            );

            if let Some(mode) = req.ssl_mode.as_deref().filter(|m| !m.is_empty()) {
                dsn.push_str(&format!(" sslmode={}", mode));
            }

            if let Some(path) = req.ssl_root_cert.as_deref().filter(|p| !p.is_empty()) {
                dsn.push_str(&format!(" sslrootcert={}", path));
            }

            dsn
        }
        Dialect::Mysql => format!(
            "{}:{}@tcp({})/{}?allowCleartextPasswords=true",
            req.user,
            token,
            req.endpoint(),
            req.dbname
        ),
    }
}
