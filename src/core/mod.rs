//! Core business logic abstractions

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod log;
pub mod rates;

// Re-export main types for cleaner imports
pub use cache::Cache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ConversionError;
pub use rates::{RateRecord, RateSnapshot, RateSource};
