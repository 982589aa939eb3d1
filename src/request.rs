//! Structured connection parameters.

use crate::config::DEFAULT_REGION;
use crate::Dialect;
use serde::{Deserialize, Serialize};

/// Default database user.
pub const DEFAULT_USER: &str = "postgres";

/// Default database host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default database name.
pub const DEFAULT_DBNAME: &str = "postgres";

/// Dialect-agnostic connection parameters.
///
/// A request is built fresh from every parsed DSN, filled in by
/// [`normalized`](ConnectionRequest::normalized), and discarded once it
/// has been rendered back into a DSN. A port of `0` means "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionRequest {
    /// Database dialect
    pub dialect: Dialect,

    /// AWS region the token is signed for
    pub region: String,

    /// Database user (the IAM-enabled account)
    pub user: String,

    /// Database hostname
    pub host: String,

    /// Database port
    pub port: u16,

    /// Database name
    pub dbname: String,

    /// PostgreSQL `sslmode`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_mode: Option<String>,

    /// PostgreSQL `sslrootcert` path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_root_cert: Option<String>,
}

impl ConnectionRequest {
    /// Creates an empty request for the dialect.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    /// Returns `host:port`, the endpoint a token is signed for.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns a copy with every unset field filled with its default.
    ///
    /// Fields that are already set are never overwritten, and `self` is
    /// left untouched.
    ///
    /// # Example
    ///
    /// ```
    /// use rdsiam::{ConnectionRequest, Dialect};
    ///
    /// let mut request = ConnectionRequest::new(Dialect::Mysql);
    /// request.host = "db1".to_string();
    ///
    /// let normalized = request.normalized();
    /// assert_eq!(normalized.host, "db1");
    /// assert_eq!(normalized.port, 3306);
    /// assert_eq!(normalized.user, "postgres");
    /// assert_eq!(request.port, 0);
    /// ```
    pub fn normalized(&self) -> Self {
        let mut req = self.clone();

        if req.region.is_empty() {
            req.region = DEFAULT_REGION.to_string();
        }

        if req.user.is_empty() {
            req.user = DEFAULT_USER.to_string();
        }

        if req.host.is_empty() {
            req.host = DEFAULT_HOST.to_string();
        }

        if req.port == 0 {
            req.port = req.dialect.default_port();
        }

        if req.dbname.is_empty() {
            req.dbname = DEFAULT_DBNAME.to_string();
        }

        req
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_empty_request() {
        let req = ConnectionRequest::default().normalized();

        assert_eq!(
            req,
            ConnectionRequest {
                dialect: Dialect::Postgres,
                region: "ap-south-1".to_string(),
                user: "postgres".to_string(),
                host: "localhost".to_string(),
                port: 5432,
                dbname: "postgres".to_string(),
                ssl_mode: None,
                ssl_root_cert: None,
            }
        );
    }

    #[test]
    fn test_normalize_default_ports() {
        assert_eq!(ConnectionRequest::new(Dialect::Postgres).normalized().port, 5432);
        assert_eq!(ConnectionRequest::new(Dialect::Mysql).normalized().port, 3306);
    }

    #[test]
    fn test_normalize_keeps_set_fields() {
        let req = ConnectionRequest {
            dialect: Dialect::Mysql,
            region: "us-east-1".to_string(),
            user: "alice".to_string(),
            host: "db1".to_string(),
            port: 6033,
            dbname: "app".to_string(),
            ssl_mode: Some("require".to_string()),
            ssl_root_cert: None,
        };

        assert_eq!(req.normalized(), req);
    }

    #[test]
    fn test_normalize_does_not_mutate_original() {
        let req = ConnectionRequest::new(Dialect::Postgres);
        let _ = req.normalized();

        assert!(req.host.is_empty());
        assert_eq!(req.port, 0);
    }

    #[test]
    fn test_endpoint() {
        let mut req = ConnectionRequest::new(Dialect::Postgres);
        req.host = "db1".to_string();
        req.port = 5432;

        assert_eq!(req.endpoint(), "db1:5432");
    }

    #[test]
    fn test_request_serde() {
        let req = ConnectionRequest::new(Dialect::Mysql).normalized();
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["dialect"], "mysql");
        assert_eq!(json["port"], 3306);
        assert!(json.get("ssl_mode").is_none());
    }
}
