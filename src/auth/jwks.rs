//! Identity provider key material with TTL caching.
//!
//! # Responsibilities
//! - Fetch the provider's JWKS (HTTP or local file)
//! - Cache it process-wide with a time-to-live
//! - Refresh on expiry or on an unknown `kid`, one fetch at a time
//!
//! # Design Decisions
//! - Readers never block: the current key set is swapped in atomically
//! - Concurrent misses queue on one async mutex and, after acquiring it,
//!   reuse any fetch that completed since they arrived, so N misses cost
//!   one fetch whether it succeeded or failed
//! - With nothing cached, failed fetches are spaced by `min_refresh_interval`
//! - Unknown-`kid` refreshes are spaced by `min_refresh_interval`
//! - A failed refresh keeps serving the previous key set

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::auth::error::AuthError;
use crate::observability::metrics;

/// Error fetching key material.
#[derive(Debug, Error)]
pub enum KeyFetchError {
    #[error("JWKS request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not read JWKS file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JWKS document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where key material comes from.
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, KeyFetchError>;
}

/// Fetches the JWKS document over HTTP.
pub struct HttpKeySource {
    client: reqwest::Client,
    url: String,
}

impl HttpKeySource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl KeySource for HttpKeySource {
    async fn fetch(&self) -> Result<JwkSet, KeyFetchError> {
        let keys = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json::<JwkSet>()
            .await?;
        Ok(keys)
    }
}

/// A fixed key set, e.g. loaded from disk.
pub struct StaticKeySource {
    keys: JwkSet,
}

impl StaticKeySource {
    pub fn new(keys: JwkSet) -> Self {
        Self { keys }
    }

    /// Load a JWKS document from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, KeyFetchError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(serde_json::from_str(&content)?))
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn fetch(&self) -> Result<JwkSet, KeyFetchError> {
        Ok(self.keys.clone())
    }
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

impl CachedKeys {
    fn find(&self, kid: Option<&str>) -> Option<Jwk> {
        match kid {
            Some(kid) => self.keys.find(kid).cloned(),
            // Tokens without a kid are only accepted against a single-key set
            None if self.keys.keys.len() == 1 => self.keys.keys.first().cloned(),
            None => None,
        }
    }

    fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }
}

/// Process-wide JWKS cache.
pub struct KeyCache {
    source: Arc<dyn KeySource>,
    ttl: Duration,
    min_refresh_interval: Duration,
    current: ArcSwapOption<CachedKeys>,
    /// Serializes fetches. Holds the time of the last fetch that failed with nothing cached.
    refresh: Mutex<Option<Instant>>,
}

impl KeyCache {
    pub fn new(source: Arc<dyn KeySource>, ttl: Duration, min_refresh_interval: Duration) -> Self {
        Self {
            source,
            ttl,
            min_refresh_interval,
            current: ArcSwapOption::empty(),
            refresh: Mutex::new(None),
        }
    }

    /// Fetch now, replacing the cached key set. Used to warm the cache at startup.
    pub async fn refresh(&self) -> Result<usize, KeyFetchError> {
        let mut last_failure = self.refresh.lock().await;
        let keys = self.source.fetch().await?;
        let count = keys.keys.len();
        self.store(keys);
        *last_failure = None;
        Ok(count)
    }

    /// Verification key for `kid`.
    pub async fn key_for(&self, kid: Option<&str>) -> Result<Jwk, AuthError> {
        let arrived = Instant::now();

        if let Some(cached) = self.current.load_full() {
            let age = cached.age();
            if age < self.ttl {
                if let Some(key) = cached.find(kid) {
                    return Ok(key);
                }
                if age < self.min_refresh_interval {
                    return Err(AuthError::InvalidSignature);
                }
            }
        }

        let mut last_failure = self.refresh.lock().await;

        // Another task refreshed (or restamped stale keys) while we waited
        if let Some(cached) = self.current.load_full() {
            if cached.fetched_at >= arrived
                || cached.age() < self.min_refresh_interval.min(self.ttl)
            {
                return cached.find(kid).ok_or(AuthError::InvalidSignature);
            }
        }

        // Nothing cached: a failure seen while waiting, or a recent one, is not retried
        if let Some(failed_at) = *last_failure {
            if failed_at >= arrived || failed_at.elapsed() < self.min_refresh_interval {
                return Err(AuthError::KeysUnavailable);
            }
        }

        let cached = self.refresh_locked(&mut last_failure).await?;
        cached.find(kid).ok_or(AuthError::InvalidSignature)
    }

    async fn refresh_locked(
        &self,
        last_failure: &mut Option<Instant>,
    ) -> Result<Arc<CachedKeys>, AuthError> {
        match self.source.fetch().await {
            Ok(keys) => {
                metrics::record_jwks_refresh("success");
                tracing::debug!(keys = keys.keys.len(), "Identity provider keys refreshed");
                *last_failure = None;
                Ok(self.store(keys))
            }
            Err(e) => {
                metrics::record_jwks_refresh("failure");
                match self.current.load_full() {
                    Some(stale) => {
                        tracing::warn!(error = %e, "Key refresh failed, keeping previous key set");
                        // Restamp so the next attempt waits a full TTL
                        Ok(self.store(stale.keys.clone()))
                    }
                    None => {
                        tracing::error!(error = %e, "Key refresh failed and no keys are cached");
                        *last_failure = Some(Instant::now());
                        Err(AuthError::KeysUnavailable)
                    }
                }
            }
        }
    }

    fn store(&self, keys: JwkSet) -> Arc<CachedKeys> {
        let cached = Arc::new(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });
        self.current.store(Some(cached.clone()));
        cached
    }
}
