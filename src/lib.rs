//! # fnkit
//!
//! Function-composition helpers: a bounded retry executor, call throttling,
//! per-owner memoization and a handful of small combinators.
//!
//! ## Overview
//!
//! Each helper wraps a function or closure and stays independent of the
//! others. Time-based helpers share a [`resilience::clock::Clock`] so tests
//! can run them without sleeping, and everything reports through `tracing`.
//!
//! ## Quick Start
//!
//! ```rust
//! use fnkit::resilience::retry::{ErrorKind, RetryPolicy};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum FetchError { Timeout, NotFound }
//!
//! impl ErrorKind for FetchError {
//!     type Kind = FetchError;
//!     fn kind(&self) -> FetchError { *self }
//! }
//!
//! let policy = RetryPolicy::<FetchError>::new()
//!     .with_max_attempts(3)?
//!     .retry_on_kinds([FetchError::Timeout]);
//!
//! let mut calls = 0;
//! let body = policy.call(|| {
//!     calls += 1;
//!     if calls < 3 { Err(FetchError::Timeout) } else { Ok("body") }
//! });
//! assert_eq!(body, Ok("body"));
//! assert_eq!(calls, 3);
//! # Ok::<(), fnkit::Error>(())
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`resilience`] | Retry executor, backoff, throttle, clock |
//! | [`cache`] | Per-owner LRU memoization and memoized functions |
//! | [`combinators`] | `compose`, `apply`, `once`, `pass_none`, `splat`, ... |
//! | [`config`] | YAML / JSON policy configuration |
//! | [`error`] | Crate error type |

pub mod cache;
pub mod combinators;
pub mod config;
pub mod resilience;

pub mod error;
pub use error::{Error, ErrorContext};

pub use cache::{memoize, CacheStats, Memoize, MethodCache};
pub use combinators::{once, pass_none, splat, Once};
pub use config::PolicyConfig;
pub use resilience::backoff::Backoff;
pub use resilience::retry::{retry, retry_call, retry_call_async, Attempts, ErrorKind, RetryPolicy};
pub use resilience::throttle::{throttle, Throttled, Throttler};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
