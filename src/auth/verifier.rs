//! Bearer token verification
//!
//! `IdentityVerifier` is the seam the HTTP layer depends on. `JwtVerifier`
//! checks RS256 tokens against the provider's key set, then enforces issuer,
//! audience and expiry before mapping the body into [`Claims`].

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};

use super::claims::Claims;
use super::error::AuthError;
use super::jwks::JwksCache;

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}

/// Expected token fields
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Exact `iss` value, e.g. `https://tenant.eu.auth0.com/`
    pub issuer: String,
    pub audience: String,
    /// Custom claim key carrying the role list
    pub roles_claim: String,
}

pub struct JwtVerifier {
    keys: JwksCache,
    settings: AuthSettings,
}

impl JwtVerifier {
    pub fn new(keys: JwksCache, settings: AuthSettings) -> Self {
        Self { keys, settings }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.settings.issuer]);
        validation.set_audience(&[&self.settings.audience]);
        validation
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::Malformed(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;

        let jwk = self.keys.key(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk)?;
        let data = decode::<Map<String, Value>>(token, &key, &self.validation())?;

        Ok(Claims::from_raw(&data.claims, &self.settings.roles_claim))
    }
}
