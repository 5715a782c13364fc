//! Authentication Layer
//!
//! Verifies bearer tokens issued by the external identity provider and
//! turns them into typed [`Claims`]. Token issuance is not handled here.

mod claims;
mod error;
mod jwks;
mod verifier;

pub use claims::{Claims, ADMIN_ROLE};
pub use error::AuthError;
pub use jwks::{JwksCache, JwksOptions};
pub use verifier::{AuthSettings, IdentityVerifier, JwtVerifier};
