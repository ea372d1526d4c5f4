//! Cache Module
//!
//! Local tier building blocks: entries, FIFO order, the bounded store and its
//! thread-safe fallback wrapper, plus statistics shared with the facade.

mod entry;
mod fifo;
mod local;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use fifo::FifoOrder;
pub use local::LocalFallbackStore;
pub use stats::{hit_rate, CacheStats, ServiceStats, Tier, TierStats};
pub use store::LocalStore;

// == Public Constants ==
/// Maximum allowed encoded value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
