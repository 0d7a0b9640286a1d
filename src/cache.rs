//! Content-addressed cache of billing results.
//!
//! Keys are a SHA-256 over the typed records, both rates and the month
//! length, so two uploads of the same data share an entry no matter what
//! the files were called. Entries expire after a TTL or on `clear()`.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::engine::{self, BillingResult, RateConfig};
use crate::error::{BillingError, Result};
use crate::models::TerminalRecord;

const MAX_ENTRIES: u64 = 64;

/// Longest time-to-live accepted for cached results (one year).
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

pub fn cache_key(records: &[TerminalRecord], rates: &RateConfig, days_in_month: u32) -> Result<String> {
    let payload = serde_json::to_vec(records)
        .map_err(|e| BillingError::Other(format!("Failed to serialize records: {e}")))?;
    let mut hasher = Sha256::new();
    hasher.update(&payload);
    hasher.update(b"|gprs=");
    hasher.update(rates.gprs().normalize().to_string().as_bytes());
    hasher.update(b"|satellite=");
    hasher.update(rates.satellite().normalize().to_string().as_bytes());
    hasher.update(b"|days=");
    hasher.update(days_in_month.to_string().as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Clone)]
pub struct BillingCache {
    inner: Cache<String, Arc<BillingResult>>,
}

impl BillingCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl.min(MAX_TTL))
                .build(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<BillingResult>> {
        self.inner.get(key)
    }

    pub fn insert(&self, key: String, result: Arc<BillingResult>) {
        self.inner.insert(key, result);
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}

/// Runs the engine through a `BillingCache`.
#[derive(Clone)]
pub struct Biller {
    cache: BillingCache,
}

impl Biller {
    pub fn new(cache: BillingCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &BillingCache {
        &self.cache
    }

    pub fn bill(
        &self,
        records: &[TerminalRecord],
        rates: &RateConfig,
        days_in_month: u32,
    ) -> Result<Arc<BillingResult>> {
        let key = cache_key(records, rates, days_in_month)?;
        if let Some(hit) = self.cache.get(&key) {
            debug!(key = %&key[..12], "billing cache hit");
            return Ok(hit);
        }
        let result = Arc::new(engine::compute(records, rates, days_in_month)?);
        self.cache.insert(key, Arc::clone(&result));
        Ok(result)
    }
}
