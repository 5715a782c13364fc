//! Signing key cache
//!
//! Keys are fetched from the provider's published JWKS endpoint and cached.
//! A token signed with an unknown `kid` triggers a refetch, but refetches
//! are capped per minute so a stream of forged tokens cannot turn into a
//! stream of requests against the provider.

use jsonwebtoken::jwk::{Jwk, JwkSet};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::error::AuthError;

#[derive(Debug, Clone)]
pub struct JwksOptions {
    pub requests_per_minute: u32,
    /// Upper bound on a single key set fetch
    pub timeout: Duration,
    /// How long fetched keys are trusted before a refetch is attempted
    pub cache_ttl: Duration,
}

impl Default for JwksOptions {
    fn default() -> Self {
        Self {
            requests_per_minute: 5,
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(600),
        }
    }
}

/// Sliding-window limiter for key set fetches
#[derive(Debug)]
pub(crate) struct FetchLimiter {
    max_requests: u32,
    window: Duration,
    recent: VecDeque<Instant>,
}

impl FetchLimiter {
    pub(crate) fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            recent: VecDeque::new(),
        }
    }

    /// Record a fetch at `now` if the window has room.
    pub(crate) fn try_acquire(&mut self, now: Instant) -> bool {
        while let Some(&oldest) = self.recent.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.recent.pop_front();
            } else {
                break;
            }
        }

        if self.recent.len() < self.max_requests as usize {
            self.recent.push_back(now);
            true
        } else {
            false
        }
    }
}

enum KeySource {
    Remote { client: reqwest::Client, url: String },
    Static,
}

struct CachedKeys {
    set: JwkSet,
    fetched_at: Option<Instant>,
}

pub struct JwksCache {
    source: KeySource,
    keys: RwLock<CachedKeys>,
    limiter: Mutex<FetchLimiter>,
    ttl: Duration,
}

impl JwksCache {
    /// Well-known key set location for a provider domain
    pub fn jwks_url(domain: &str) -> String {
        format!("https://{}/.well-known/jwks.json", domain)
    }

    /// Cache backed by the provider's published key set
    pub fn remote(domain: &str, options: &JwksOptions) -> Result<Self, AuthError> {
        Self::remote_url(Self::jwks_url(domain), options)
    }

    pub fn remote_url(url: String, options: &JwksOptions) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        Ok(Self {
            source: KeySource::Remote { client, url },
            keys: RwLock::new(CachedKeys {
                set: JwkSet { keys: Vec::new() },
                fetched_at: None,
            }),
            limiter: Mutex::new(FetchLimiter::new(
                options.requests_per_minute,
                Duration::from_secs(60),
            )),
            ttl: options.cache_ttl,
        })
    }

    /// Fixed key set that is never refetched
    pub fn from_static(set: JwkSet) -> Self {
        Self {
            source: KeySource::Static,
            keys: RwLock::new(CachedKeys {
                set,
                fetched_at: None,
            }),
            limiter: Mutex::new(FetchLimiter::new(0, Duration::from_secs(60))),
            ttl: Duration::MAX,
        }
    }

    /// Find the key with id `kid`, refetching once if it is unknown or the
    /// cache is stale.
    pub async fn key(&self, kid: &str) -> Result<Jwk, AuthError> {
        if let Some(jwk) = self.lookup(kid, true).await {
            return Ok(jwk);
        }
        if matches!(self.source, KeySource::Static) {
            return Err(AuthError::UnknownKey(kid.to_string()));
        }

        if let Err(e) = self.refresh().await {
            warn!(error = %e, kid = kid, "Signing key refresh failed");
            // A stale key is still better than rejecting every request
            // while the provider is unreachable.
            return self.lookup(kid, false).await.ok_or(e);
        }

        self.lookup(kid, false)
            .await
            .ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }

    async fn lookup(&self, kid: &str, require_fresh: bool) -> Option<Jwk> {
        let cached = self.keys.read().await;
        let fresh = match (&self.source, cached.fetched_at) {
            (KeySource::Static, _) => true,
            (KeySource::Remote { .. }, Some(at)) => at.elapsed() < self.ttl,
            (KeySource::Remote { .. }, None) => false,
        };
        if require_fresh && !fresh {
            return None;
        }
        cached.set.find(kid).cloned()
    }

    async fn refresh(&self) -> Result<(), AuthError> {
        let KeySource::Remote { client, url } = &self.source else {
            return Ok(());
        };

        let allowed = self
            .limiter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_acquire(Instant::now());
        if !allowed {
            debug!(url = %url, "Skipping key set fetch, rate limit reached");
            return Err(AuthError::KeyFetchRateLimited);
        }

        let set: JwkSet = client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        info!(url = %url, keys = set.keys.len(), "Fetched signing keys");

        let mut cached = self.keys.write().await;
        cached.set = set;
        cached.fetched_at = Some(Instant::now());
        Ok(())
    }
}
