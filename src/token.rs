//! Auth token minting.

use crate::{IamError, IdentitySession, Result};

/// Mints an auth token for `user` at `endpoint` through `session`.
///
/// # Errors
///
/// Any signing failure is returned as [`IamError::TokenGenerationFailed`]
/// with the session's error as its source.
pub async fn mint_token(
    session: &dyn IdentitySession,
    endpoint: &str,
    region: &str,
    user: &str,
) -> Result<String> {
    session
        .sign(endpoint, region, user)
        .await
        .map_err(|e| IamError::token_generation(endpoint, e))
}
