//! Input validation for connection requests about to be rendered into a DSN.

use crate::{ConnectionRequest, Dialect, IamError, Result};

/// Characters the mysql DSN grammar cannot carry in each field.
///
/// `@`, whitespace and parentheses in a user or host still parse, so they
/// are allowed.
const MYSQL_USER_RESERVED: &str = ":";
const MYSQL_HOST_RESERVED: &str = ":";
const MYSQL_DBNAME_RESERVED: &str = "?";

/// Validates a normalized request.
///
/// Checks for:
/// - Empty required fields (region, user, host, database name)
/// - A zero port
/// - For postgres, whitespace or control characters, which split a `key=value` DSN
/// - For mysql, characters that end a field of the `user:password@tcp(host:port)/dbname` grammar
///
/// A request parsed from a DSN of its own dialect always passes.
///
/// # Errors
///
/// Returns [`IamError::InvalidRequest`] if validation fails.
///
/// # Example
///
/// ```
/// use rdsiam::{ConnectionRequest, Dialect};
/// use rdsiam::validation::validate_request;
///
/// let request = ConnectionRequest::new(Dialect::Postgres).normalized();
/// assert!(validate_request(&request).is_ok());
///
/// let mut request = request.clone();
/// request.host = "db1 port=1".to_string();
/// assert!(validate_request(&request).is_err());
/// ```
pub fn validate_request(req: &ConnectionRequest) -> Result<()> {
    let required = [
        ("region", req.region.as_str()),
        ("user", req.user.as_str()),
        ("host", req.host.as_str()),
        ("dbname", req.dbname.as_str()),
    ];

    for (field, value) in required {
        if value.is_empty() {
            return Err(IamError::InvalidRequest(format!("{} cannot be empty", field)));
        }
    }

    if req.port == 0 {
        return Err(IamError::InvalidRequest(
            "port must be a positive integer".to_string(),
        ));
    }

    match req.dialect {
        Dialect::Postgres => {
            let optional = [
                ("sslmode", req.ssl_mode.as_deref().unwrap_or("")),
                ("sslrootcert", req.ssl_root_cert.as_deref().unwrap_or("")),
            ];

            for (field, value) in required.iter().chain(optional.iter()) {
                if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
                    return Err(IamError::InvalidRequest(format!(
                        "{} contains whitespace or control characters",
                        field
                    )));
                }
            }
            Ok(())
        }
        Dialect::Mysql => {
            reject_reserved("user", &req.user, MYSQL_USER_RESERVED)?;
            reject_reserved("host", &req.host, MYSQL_HOST_RESERVED)?;
            reject_reserved("dbname", &req.dbname, MYSQL_DBNAME_RESERVED)
        }
    }
}

fn reject_reserved(field: &str, value: &str, reserved: &str) -> Result<()> {
    if value.chars().any(|c| reserved.contains(c)) {
        return Err(IamError::InvalidRequest(format!(
            "{} contains characters reserved by the mysql DSN format (not allowed: {})",
            field, reserved
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(dialect: Dialect) -> ConnectionRequest {
        ConnectionRequest {
            dialect,
            region: "us-east-1".to_string(),
            user: "alice".to_string(),
            host: "db1.example.com".to_string(),
            port: dialect.default_port(),
            dbname: "app".to_string(),
            ssl_mode: None,
            ssl_root_cert: None,
        }
    }

    #[test]
    fn test_valid_requests() {
        assert!(validate_request(&request(Dialect::Postgres)).is_ok());
        assert!(validate_request(&request(Dialect::Mysql)).is_ok());

        let mut req = request(Dialect::Postgres);
        req.ssl_mode = Some("verify-full".to_string());
        req.ssl_root_cert = Some("/etc/ssl/rds-ca.pem".to_string());
        assert!(validate_request(&req).is_ok());
    }

    #[test]
    fn test_empty_fields() {
        let mut req = request(Dialect::Postgres);
        req.user = String::new();

        let result = validate_request(&req);
        assert!(result.unwrap_err().to_string().contains("user cannot be empty"));
    }

    #[test]
    fn test_zero_port() {
        let mut req = request(Dialect::Mysql);
        req.port = 0;

        let result = validate_request(&req);
        assert!(result.unwrap_err().to_string().contains("port"));
    }

    #[test]
    fn test_whitespace_injection() {
        let mut req = request(Dialect::Postgres);
        req.dbname = "app sslmode=disable".to_string();

        let result = validate_request(&req);
        assert!(matches!(result, Err(IamError::InvalidRequest(_))));

        let mut req = request(Dialect::Postgres);
        req.ssl_root_cert = Some("/tmp/ca\n.pem".to_string());
        assert!(validate_request(&req).is_err());
    }

    #[test]
    fn test_mysql_reserved_characters() {
        let cases = [
            ("user", "ali:ce"),
            ("host", "db1:3306"),
            ("dbname", "app?tls=false"),
        ];

        for (field, value) in cases {
            let mut req = request(Dialect::Mysql);
            match field {
                "user" => req.user = value.to_string(),
                "host" => req.host = value.to_string(),
                _ => req.dbname = value.to_string(),
            }

            let result = validate_request(&req);
            assert!(result.is_err(), "Expected {}='{}' to fail validation", field, value);
            assert!(result.unwrap_err().to_string().contains("reserved"));
        }
    }

    #[test]
    fn test_mysql_allows_what_its_grammar_parses() {
        let mut req = request(Dialect::Mysql);
        req.user = "svc@corp".to_string();
        req.dbname = "my app".to_string();
        assert!(validate_request(&req).is_ok());

        let mut req = request(Dialect::Mysql);
        req.user = "my user".to_string();
        req.host = "db(1)".to_string();
        assert!(validate_request(&req).is_ok());
    }

    #[test]
    fn test_parsed_requests_always_validate() {
        let dsns = [
            (Dialect::Mysql, "svc@corp:pw@tcp(db1:3306)/app"),
            (Dialect::Mysql, "my user:pw@tcp(db1:3306)/my app?tls=true"),
            (Dialect::Postgres, "host=db1 user=a=b@corp dbname=app"),
        ];

        for (dialect, dsn) in dsns {
            let mut req = crate::dsn::parse(dialect, dsn).unwrap().normalized();
            req.region = "us-east-1".to_string();
            assert!(validate_request(&req).is_ok(), "Expected '{}' to validate", dsn);
        }
    }

    #[test]
    fn test_mysql_characters_allowed_for_postgres() {
        let mut req = request(Dialect::Postgres);
        req.user = "alice@corp".to_string();
        assert!(validate_request(&req).is_ok());
    }
}
