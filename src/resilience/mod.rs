//! Retry and rate-control primitives.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`retry`] | Bounded retry executor, sync and async, plus the [`retry::retry`] decorator |
//! | [`backoff`] | Delay strategies between attempts |
//! | [`throttle`] | Minimum-interval throttle for functions |
//! | [`clock`] | Time source, swappable for a manual clock in tests |
//!
//! ## Retry
//!
//! ```rust
//! use fnkit::resilience::retry::RetryPolicy;
//!
//! let policy = RetryPolicy::<std::io::Error>::new()
//!     .with_retries(2)
//!     .retry_on(|e| e.kind() == std::io::ErrorKind::TimedOut);
//!
//! let mut calls = 0;
//! let out = policy.call(|| {
//!     calls += 1;
//!     if calls == 1 {
//!         Err(std::io::Error::from(std::io::ErrorKind::TimedOut))
//!     } else {
//!         Ok("done")
//!     }
//! });
//! assert_eq!(out.unwrap(), "done");
//! assert_eq!(calls, 2);
//! ```
//!
//! ## Throttle
//!
//! ```rust
//! use fnkit::resilience::throttle::throttle;
//!
//! let limited = throttle(|x: u32| x + 1, 1000.0)?;
//! assert_eq!(limited.call(1), 2);
//! # Ok::<(), fnkit::Error>(())
//! ```

pub mod backoff;
pub mod clock;
pub mod retry;
pub mod throttle;
