//! rdsiam - IAM token authentication for RDS PostgreSQL and MySQL.
//!
//! rdsiam replaces the static password of a database DSN with a short-lived
//! auth token signed by a cloud identity. Register an IAM driver once, then
//! open connections with the DSNs you already have: the password position is
//! ignored and filled with a fresh token.
//!
//! # Features
//!
//! - **Drop-in DSNs**: postgres `key=value` and mysql `user:pass@tcp(host:port)/db` formats
//! - **Token Caching**: Tokens are reused until the database refuses them
//! - **Pluggable Collaborators**: Identity sessions and wire drivers are traits
//! - **Isolated Registries**: Inject a registry per test or use the global one
//! - **Error Context**: Rich error types with full context and chaining
//! - **Feature Flags**: Optional driver compilation to minimize dependencies
//!
//! # Quick Start
//!
//! ```
//! use rdsiam::drivers::mock::{MockSession, MockWireDriver};
//! use rdsiam::{register_iam_driver, Dialect, DriverRegistry};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> rdsiam::Result<()> {
//!     // Any IdentitySession and WireDriver work; the mocks need no AWS account
//!     let session = Arc::new(MockSession::new("us-east-1"));
//!     let wire = Arc::new(MockWireDriver::new(Dialect::Postgres));
//!
//!     // Register the IAM driver
//!     let registry = DriverRegistry::new();
//!     let name = register_iam_driver(&registry, session, Dialect::Postgres, wire)?;
//!     assert_eq!(name, "aws_postgres_iam");
//!
//!     // Connect; the password position is filled with a signed token
//!     let _conn = registry
//!         .open(&name, "host=db1 port=5432 user=app password=ignored dbname=orders")
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! With the `aws` and `mysql` features, the real collaborators plug in the
//! same way:
//!
//! ```ignore
//! let config = Config::new(Dialect::Mysql).with_region("us-east-1");
//! let session = Arc::new(AwsSession::from_config(&config).await?);
//!
//! let registry = DriverRegistry::global();
//! let name = rdsiam::register(registry, session, Dialect::Mysql)?;
//! let conn = registry
//!     .open(&name, "app:unused@tcp(mydb.abc123.us-east-1.rds.amazonaws.com:3306)/orders")
//!     .await?;
//! ```
//!
//! # Feature Flags
//!
//! | Feature | Provides |
//! |---------|----------|
//! | `mock` (default) | In-memory session and wire driver for tests |
//! | `postgres` | sqlx PostgreSQL wire driver |
//! | `mysql` | sqlx MySQL wire driver |
//! | `aws` | AWS SDK identity session |
//!
//! ```toml
//! [dependencies]
//! rdsiam = { version = "0.1", features = ["postgres", "aws"] }
//! ```

pub mod config;
pub mod driver;
pub mod drivers;
pub mod dsn;
pub mod error;
pub mod factory;
pub mod iam;
pub mod refresher;
pub mod request;
pub mod session;
pub mod token;
pub mod validation;

pub use config::{Config, Dialect};
pub use driver::{Connection, Driver, WireDriver};
pub use error::{IamError, Result};
pub use factory::DriverRegistry;
pub use iam::{driver_name, register, register_iam_driver, IamDriver};
pub use refresher::{CredentialRefresher, FallbackEvent};
pub use request::ConnectionRequest;
pub use session::IdentitySession;
