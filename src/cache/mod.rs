//! Memoization with per-owner LRU storage.
//!
//! ## Overview
//!
//! A shared, process-wide cache lets busy callers flush everyone else's
//! entries. Here the cache is a value you own:
//!
//! - [`MethodCache`] sits in a struct field and memoizes that struct's
//!   methods, so each instance keeps its own entries
//! - [`Memoize`] bundles a unary function with its own cache
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`MethodCache`] | Lazily allocated LRU cache, bounded (default 128) or unbounded |
//! | [`Memoize`] | Memoized unary function built on [`MethodCache`] |
//! | [`CacheStats`] | Hit / miss / insert / clear counters |
//!
//! ## Example
//!
//! ```rust
//! use fnkit::cache::memoize;
//!
//! let digit_count = memoize(|n: u64| n.to_string().len());
//! assert_eq!(digit_count.call(12345), 5);
//! assert_eq!(digit_count.call(12345), 5);
//! assert_eq!(digit_count.stats().hits, 1);
//! ```

mod memoize;
mod method_cache;
mod stats;

pub use memoize::{memoize, Memoize};
pub use method_cache::{MethodCache, DEFAULT_CAPACITY};
pub use stats::CacheStats;
