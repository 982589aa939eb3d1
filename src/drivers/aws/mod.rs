//! AWS identity session.
//!
//! Signs RDS IAM auth tokens with the official AWS SDK.
//!
//! # Requirements
//!
//! - AWS credentials configured via:
//!   - Environment variables (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`)
//!   - Shared credentials file (`~/.aws/credentials`)
//!   - IAM instance role (for EC2/ECS)
//! - The database user granted `rds_iam` (postgres) or created with
//!   `AWSAuthenticationPlugin` (mysql)
//! - An IAM policy allowing `rds-db:connect` for that user
//!
//! # Example
//!
//! ```no_run
//! use rdsiam::drivers::aws::AwsSession;
//! use rdsiam::{factory::DriverRegistry, Config, Dialect};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> rdsiam::Result<()> {
//!     let config = Config::new(Dialect::Postgres).with_region("us-west-2");
//!     let session = Arc::new(AwsSession::from_config(&config).await?);
//!
//!     let registry = DriverRegistry::global();
//!     let name = rdsiam::register(registry, session, config.dialect)?;
//!
//!     let _conn = registry
//!         .open(&name, "host=mydb.abc123.us-west-2.rds.amazonaws.com user=app dbname=orders sslmode=require")
//!         .await?;
//!     Ok(())
//! }
//! ```

mod session;

pub use session::AwsSession;
