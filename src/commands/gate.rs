//! Admin gate
//!
//! Extractor that runs before any handler body: it reads the bearer token,
//! verifies it and requires the admin role. Handlers that take
//! [`AdminClaims`] never reach storage for unauthenticated callers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::{debug, warn};

use super::error::ApiError;
use crate::auth::{AuthError, Claims};
use crate::AppState;

/// Claims of a verified caller holding the admin role
#[derive(Debug, Clone)]
pub struct AdminClaims(pub Claims);

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredential)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MissingCredential)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token.trim())
}

impl FromRequestParts<AppState> for AdminClaims {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).map_err(|e| {
            debug!(error = %e, path = %parts.uri.path(), "Rejected request without credential");
            ApiError::Unauthorized
        })?;

        let claims = state.verifier.verify(token).await.map_err(|e| {
            warn!(error = %e, path = %parts.uri.path(), "Rejected invalid credential");
            ApiError::Unauthorized
        })?;

        if !claims.is_admin() {
            warn!(
                subject = claims.subject.as_deref().unwrap_or("-"),
                path = %parts.uri.path(),
                "Rejected non-admin caller"
            );
            return Err(ApiError::Forbidden);
        }

        Ok(AdminClaims(claims))
    }
}
