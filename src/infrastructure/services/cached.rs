//! Cache access shared by the gateways. Cache failures never reach callers.

use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::domain::{Cache, CacheExt};
use crate::infrastructure::observability::record_cache_outcome;

/// Namespace and lifetime of gateway cache entries
#[derive(Debug, Clone)]
pub struct GatewayCacheConfig {
    pub namespace: String,
    /// Zero disables storing
    pub ttl: Duration,
}

impl Default for GatewayCacheConfig {
    fn default() -> Self {
        Self {
            namespace: "medical_ai".to_string(),
            ttl: Duration::from_secs(300),
        }
    }
}

impl GatewayCacheConfig {
    pub fn new(namespace: impl Into<String>, ttl: Duration) -> Self {
        Self {
            namespace: namespace.into(),
            ttl,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn is_storing(&self) -> bool {
        !self.ttl.is_zero()
    }
}

/// Reads a cached value; errors and undecodable entries count as a miss
pub(crate) async fn lookup<V>(cache: &dyn Cache, gateway: &'static str, key: &str) -> Option<V>
where
    V: DeserializeOwned + Send,
{
    let result: Result<Option<V>, _> = cache.get(key).await;
    match result {
        Ok(Some(value)) => {
            debug!(gateway, key, "Cache hit");
            record_cache_outcome(gateway, "hit");
            Some(value)
        }
        Ok(None) => {
            record_cache_outcome(gateway, "miss");
            None
        }
        Err(e) => {
            warn!(gateway, key, error = %e, "Cache read failed, treating as miss");
            record_cache_outcome(gateway, "error");
            None
        }
    }
}

/// Stores a value unless the TTL is zero; failures are logged and dropped
pub(crate) async fn store<V>(
    cache: &dyn Cache,
    config: &GatewayCacheConfig,
    gateway: &'static str,
    key: &str,
    value: &V,
) where
    V: Serialize + Send + Sync,
{
    if !config.is_storing() {
        return;
    }

    if let Err(e) = cache.set(key, value, config.ttl).await {
        debug!(gateway, key, error = %e, "Cache write failed");
    }
}
