use thiserror::Error;

/// Reasons a bearer credential is rejected.
///
/// All variants surface to clients as the same generic 401; the detail is
/// for logs only.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer credential")]
    MissingCredential,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("unsupported signing algorithm {0:?}")]
    UnsupportedAlgorithm(jsonwebtoken::Algorithm),

    #[error("token header has no key id")]
    MissingKeyId,

    #[error("no signing key with id '{0}'")]
    UnknownKey(String),

    #[error("key set fetch failed: {0}")]
    KeyFetch(String),

    #[error("key set fetch rate limited")]
    KeyFetchRateLimited,

    #[error("token rejected: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}
