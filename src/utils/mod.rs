//! Shared utilities: address canonicalization, TTL cache, static tables

pub mod address;
pub mod cache;
pub mod constants;

pub use cache::{CacheKey, CacheStats, Clock, ManualClock, SystemClock, TtlCache};
