//! Identity sessions that sign database auth tokens.
//!
//! This module provides the [`IdentitySession`] trait, the seam between the
//! credential-refresh logic and the cloud identity service. The AWS
//! implementation lives in [`drivers::aws`](crate::drivers) and a
//! counting mock in [`drivers::mock`](crate::drivers).

use crate::Result;
use async_trait::async_trait;

/// IdentitySession represents an authenticated cloud identity.
///
/// A session knows its effective region and can sign a short-lived auth
/// token that a database accepts in place of a password.
///
/// # Thread Safety
///
/// All session implementations must be `Send + Sync`; one session is shared
/// by every connection attempt of the drivers built on it.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use rdsiam::{IdentitySession, Result};
///
/// struct StaticSession;
///
/// #[async_trait]
/// impl IdentitySession for StaticSession {
///     fn region(&self) -> &str {
///         "us-east-1"
///     }
///
///     async fn sign(&self, endpoint: &str, region: &str, user: &str) -> Result<String> {
///         Ok(format!("{}/?Action=connect&DBUser={}&Region={}", endpoint, user, region))
///     }
/// }
/// ```
#[async_trait]
pub trait IdentitySession: Send + Sync {
    /// Returns the region this session is configured for.
    ///
    /// Tokens are always signed for this region, whatever region a
    /// connection request carried.
    fn region(&self) -> &str;

    /// Signs an auth token for `user` at `endpoint` (`host:port`) in `region`.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are unavailable or signing fails.
    async fn sign(&self, endpoint: &str, region: &str, user: &str) -> Result<String>;
}
