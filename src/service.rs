//! Cached access to exchange rates and the operations built on them.

use crate::core::cache::Cache;
use crate::core::clock::{Clock, SystemClock};
use crate::core::error::ConversionError;
use crate::core::rates::{RateRecord, RateSnapshot, RateSource};
use crate::store::memory::MemoryCache;
use anyhow::Result;
use chrono::Duration;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// There is one upstream feed, so one slot is enough.
pub const RATES_CACHE_KEY: &str = "exchange_rates";

pub type SnapshotCache = dyn Cache<String, Arc<RateSnapshot>>;

pub struct RateService {
    source: Arc<dyn RateSource>,
    cache: Arc<SnapshotCache>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    refresh: Mutex<()>,
}

impl RateService {
    pub fn new(source: Arc<dyn RateSource>, ttl: Duration) -> Self {
        Self::with_clock(source, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(source: Arc<dyn RateSource>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let cache: Arc<SnapshotCache> = Arc::new(
            MemoryCache::<String, Arc<RateSnapshot>>::with_clock(Arc::clone(&clock)),
        );
        Self::with_cache(source, cache, clock, ttl)
    }

    pub fn with_cache(
        source: Arc<dyn RateSource>,
        cache: Arc<SnapshotCache>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            clock,
            ttl,
            refresh: Mutex::new(()),
        }
    }

    /// Returns the cached snapshot, fetching a new one when the slot is empty
    /// or expired.
    ///
    /// Concurrent misses share a single upstream fetch. Whatever the source
    /// returns is cached, including an empty batch. Source errors are not
    /// cached.
    pub async fn get_rates(&self) -> Result<Arc<RateSnapshot>> {
        let key = RATES_CACHE_KEY.to_string();
        if let Some(snapshot) = self.cache.get(&key).await {
            return Ok(snapshot);
        }

        let _guard = self.refresh.lock().await;
        // Another caller may have repopulated while we waited
        if let Some(snapshot) = self.cache.get(&key).await {
            debug!("Snapshot populated by concurrent refresh");
            return Ok(snapshot);
        }

        let records = self.source.fetch().await?;
        let snapshot = Arc::new(RateSnapshot::new(records, self.clock.now()));
        info!(
            count = snapshot.len(),
            fetched_at = %snapshot.fetched_at,
            "Cached exchange rates snapshot"
        );
        self.cache
            .put(key, Arc::clone(&snapshot), Some(self.ttl))
            .await;

        Ok(snapshot)
    }

    /// Drops the cached snapshot; the next read refetches.
    pub async fn invalidate(&self) {
        self.cache.remove(&RATES_CACHE_KEY.to_string()).await;
    }

    pub async fn list_all(&self) -> Result<Vec<RateRecord>> {
        Ok(self.get_rates().await?.records.clone())
    }

    /// Case-insensitive lookup by currency code.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<RateRecord>> {
        let code = code.trim().to_uppercase();
        Ok(self.get_rates().await?.find(&code).cloned())
    }

    /// Converts `amount` units of `code` into CZK, rounded to 2 decimals.
    ///
    /// An unknown currency is reported before an invalid amount.
    ///
    /// The record's quoting unit is not divided out: a currency quoted per
    /// 100 units converts with the per-100 rate as is. This matches the
    /// published behaviour of the API and is pending clarification.
    pub async fn convert(&self, code: &str, amount: f64) -> Result<f64, ConversionError> {
        let code = code.trim().to_uppercase();
        let record = self
            .find_by_code(&code)
            .await?
            .ok_or_else(|| ConversionError::CurrencyNotFound(code.clone()))?;

        if !amount.is_finite() || amount <= 0.0 {
            return Err(ConversionError::InvalidAmount(amount));
        }

        Ok(round_to_cents(amount * record.rate))
    }
}

/// Rounds half away from zero to 2 decimal places.
fn round_to_cents(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}
