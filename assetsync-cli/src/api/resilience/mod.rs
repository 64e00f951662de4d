//! Request hardening: timeouts and concurrency limiting
//!
//! No retry policy: bulk creation is not idempotent
//! unless the service deduplicates by external id.

pub mod concurrency;
pub mod config;

pub use concurrency::{ConcurrencyLimiter, ConcurrencyStats};
pub use config::{ConcurrencyConfig, ResilienceConfig, ResilienceConfigBuilder};
