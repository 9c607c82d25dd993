use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::models::weather::WeatherPayload;

pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Time source, injected so TTL expiry can be driven from tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: WeatherPayload,
    pub stored_at: DateTime<Utc>,
}

/// Key/value store for formatted weather payloads.
///
/// `get` must never hand back an entry older than the TTL.
pub trait WeatherCache: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheEntry>;
    fn put(&self, key: String, payload: WeatherPayload);
}

/// Coordinates exactly as received, joined with a comma. "10" and "10.0" are
/// different keys.
pub fn cache_key(latitude: &str, longitude: &str) -> String {
    format!("{},{}", latitude, longitude)
}

/// Process-local cache. Expired entries stay in the map until the same key is
/// written again; nothing purges them in the background.
pub struct InMemoryWeatherCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl InMemoryWeatherCache {
    pub fn new(ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: i64::try_from(ttl_secs)
                .ok()
                .and_then(TimeDelta::try_seconds)
                .unwrap_or(TimeDelta::MAX),
            clock,
        }
    }

    #[cfg(test)]
    pub fn entry_count(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }
}

impl WeatherCache for InMemoryWeatherCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        let map = self.entries.read().ok()?;
        let entry = map.get(key)?;
        if self.clock.now() - entry.stored_at < self.ttl {
            Some(entry.clone())
        } else {
            None
        }
    }

    fn put(&self, key: String, payload: WeatherPayload) {
        let stored_at = self.clock.now();
        if let Ok(mut map) = self.entries.write() {
            map.insert(key, CacheEntry { payload, stored_at });
            debug!("Weather cache holds {} entries", map.len());
        }
    }
}
