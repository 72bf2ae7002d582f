//! Exchange rate records and the source abstraction

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the daily rates feed.
///
/// `rate` is the price of `amount` units of `currency` in CZK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub country: String,
    pub currency: String,
    pub amount: f64,
    pub code: String,
    pub rate: f64,
}

/// A fully parsed batch of rates together with the time it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    pub records: Vec<RateRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl RateSnapshot {
    pub fn new(records: Vec<RateRecord>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            records,
            fetched_at,
        }
    }

    /// Returns the first record with exactly this code.
    pub fn find(&self, code: &str) -> Option<&RateRecord> {
        self.records.iter().find(|r| r.code == code)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Upstream provider of exchange rate records.
///
/// Implementations absorb upstream and parse failures by returning an empty
/// list. An `Err` means something unexpected went wrong and is reported to
/// clients as an internal error.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RateRecord>>;
}

/// Parses a numeric feed field.
///
/// Accepts `.` as the decimal separator, or a single `,` when no `.` is
/// present. Returns `None` for empty, malformed and non-finite input.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let value = if !text.contains('.') && text.matches(',').count() == 1 {
        text.replace(',', ".").parse::<f64>()
    } else {
        text.parse::<f64>()
    };

    value.ok().filter(|v| v.is_finite())
}
