//! Bounded retry executor.
//!
//! ```text
//! READY → ATTEMPTING → SUCCESS               (operation returned Ok)
//!                    → RETRY → ATTEMPTING     (error trapped, budget left)
//!                    → FAILURE               (error not trapped, or budget spent)
//! ```
//!
//! The operation's own error is returned on failure. Running out of attempts
//! is not a separate error: the caller gets the last trapped failure back.

use super::backoff::Backoff;
use super::clock::{self, SharedClock};
use crate::{Error, ErrorContext, Result};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, warn};

/// Attempt budget: total number of invocations allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attempts {
    Limited(NonZeroU32),
    Unbounded,
}

impl Attempts {
    /// A finite budget of `n` invocations. Zero is rejected.
    pub fn limited(n: u32) -> Result<Self> {
        NonZeroU32::new(n).map(Attempts::Limited).ok_or_else(|| {
            Error::configuration_with_context(
                "max_attempts must be at least 1",
                ErrorContext::new()
                    .with_field_path("retry.max_attempts")
                    .with_details("got 0")
                    .with_source("retry"),
            )
        })
    }

    /// Budget for "retry `retries` more times after the first call".
    pub fn from_retries(retries: u32) -> Self {
        // retries + 1 >= 1, so the NonZero construction cannot fail.
        Attempts::Limited(NonZeroU32::MIN.saturating_add(retries))
    }

    /// Whether another invocation is allowed after `made` have run.
    pub fn allows_another(&self, made: u32) -> bool {
        match self {
            Attempts::Limited(n) => made < n.get(),
            Attempts::Unbounded => true,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Attempts::Unbounded)
    }
}

impl Default for Attempts {
    fn default() -> Self {
        Attempts::Limited(NonZeroU32::MIN)
    }
}

impl fmt::Display for Attempts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attempts::Limited(n) => write!(f, "{}", n),
            Attempts::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Error types that can report a category, so a policy can trap by kind.
///
/// ```
/// use fnkit::resilience::retry::{ErrorKind, RetryPolicy};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum NetError { Timeout, Refused }
///
/// impl ErrorKind for NetError {
///     type Kind = NetError;
///     fn kind(&self) -> NetError { *self }
/// }
///
/// let policy = RetryPolicy::<NetError>::new()
///     .with_retries(2)
///     .retry_on_kinds([NetError::Timeout]);
/// let mut calls = 0;
/// let out = policy.call(|| {
///     calls += 1;
///     if calls < 3 { Err(NetError::Timeout) } else { Ok(calls) }
/// });
/// assert_eq!(out, Ok(3));
/// ```
pub trait ErrorKind {
    type Kind: Eq + Hash + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;
}

type Trap<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;
type Cleanup = Arc<dyn Fn() + Send + Sync>;

/// Retry configuration: budget, which errors to trap, delay and cleanup.
///
/// The default policy makes one attempt and traps nothing, so it never
/// retries. Policies are cheap to clone and can be shared between threads.
pub struct RetryPolicy<E> {
    attempts: Attempts,
    trap: Trap<E>,
    backoff: Backoff,
    cleanup: Option<Cleanup>,
    clock: SharedClock,
}

impl<E: 'static> RetryPolicy<E> {
    pub fn new() -> Self {
        Self {
            attempts: Attempts::default(),
            trap: Arc::new(|_: &E| false),
            backoff: Backoff::None,
            cleanup: None,
            clock: clock::system(),
        }
    }

    pub fn with_attempts(mut self, attempts: Attempts) -> Self {
        self.attempts = attempts;
        self
    }

    /// Set a finite budget of `n` total invocations.
    pub fn with_max_attempts(self, n: u32) -> Result<Self> {
        Ok(self.with_attempts(Attempts::limited(n)?))
    }

    /// Allow `retries` additional invocations after the first one.
    pub fn with_retries(self, retries: u32) -> Self {
        self.with_attempts(Attempts::from_retries(retries))
    }

    /// Retry forever while the trap matches.
    pub fn unbounded(self) -> Self {
        self.with_attempts(Attempts::Unbounded)
    }

    /// Trap errors for which `predicate` returns true.
    pub fn retry_on<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.trap = Arc::new(predicate);
        self
    }

    /// Trap every error.
    pub fn retry_on_any(self) -> Self {
        self.retry_on(|_| true)
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Run `cleanup` after each trapped failure, before the next attempt.
    pub fn with_cleanup<C>(mut self, cleanup: C) -> Self
    where
        C: Fn() + Send + Sync + 'static,
    {
        self.cleanup = Some(Arc::new(cleanup));
        self
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }
}

impl<E> RetryPolicy<E>
where
    E: ErrorKind + 'static,
{
    /// Trap errors whose [`ErrorKind::kind`] is in `kinds`.
    pub fn retry_on_kinds<I>(self, kinds: I) -> Self
    where
        I: IntoIterator<Item = E::Kind>,
    {
        let kinds: HashSet<E::Kind> = kinds.into_iter().collect();
        self.retry_on(move |e: &E| kinds.contains(&e.kind()))
    }
}

impl<E> RetryPolicy<E> {
    pub fn attempts(&self) -> Attempts {
        self.attempts
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    pub fn is_retryable(&self, error: &E) -> bool {
        (self.trap)(error)
    }

    /// Decide what follows failed attempt number `attempt` (1-based).
    ///
    /// Returns `true` when the loop should go around again. Cleanup runs here
    /// so both the sync and async loops share it.
    fn on_failure(&self, attempt: u32, error: &E) -> bool {
        if !(self.trap)(error) {
            debug!(attempt, "operation failed with a non-retryable error");
            return false;
        }
        if !self.attempts.allows_another(attempt) {
            warn!(
                attempt,
                max_attempts = %self.attempts,
                "retry budget exhausted"
            );
            return false;
        }
        debug!(attempt, max_attempts = %self.attempts, "retryable failure, retrying");
        if let Some(cleanup) = &self.cleanup {
            cleanup();
        }
        true
    }

    /// Run `operation` until it succeeds or the policy gives up.
    pub fn call<T, F>(&self, mut operation: F) -> std::result::Result<T, E>
    where
        F: FnMut() -> std::result::Result<T, E>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            match operation() {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if !self.on_failure(attempt, &error) {
                        return Err(error);
                    }
                    let delay = self.backoff.delay(attempt);
                    if !delay.is_zero() {
                        self.clock.sleep(delay);
                    }
                }
            }
        }
    }

    /// Async form of [`RetryPolicy::call`]. Delays use `tokio::time::sleep`
    /// rather than the policy's clock.
    pub async fn call_async<T, F, Fut>(&self, mut operation: F) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if !self.on_failure(attempt, &error) {
                        return Err(error);
                    }
                    let delay = self.backoff.delay(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}

impl<E: 'static> Default for RetryPolicy<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            attempts: self.attempts,
            trap: Arc::clone(&self.trap),
            backoff: self.backoff.clone(),
            cleanup: self.cleanup.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("attempts", &self.attempts)
            .field("backoff", &self.backoff)
            .field("cleanup", &self.cleanup.is_some())
            .finish()
    }
}

/// Run `operation` under `policy`.
pub fn retry_call<T, E, F>(policy: &RetryPolicy<E>, operation: F) -> std::result::Result<T, E>
where
    F: FnMut() -> std::result::Result<T, E>,
{
    policy.call(operation)
}

/// Run an async `operation` under `policy`.
pub async fn retry_call_async<T, E, F, Fut>(
    policy: &RetryPolicy<E>,
    operation: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    policy.call_async(operation).await
}

/// A function bound to a retry policy. Built by [`retry`].
pub struct Retrying<F, E> {
    func: F,
    policy: RetryPolicy<E>,
}

impl<F, E> Retrying<F, E> {
    /// Call with `arg`, re-supplying a clone of it on each attempt.
    pub fn call<A, T>(&self, arg: A) -> std::result::Result<T, E>
    where
        F: Fn(A) -> std::result::Result<T, E>,
        A: Clone,
    {
        self.policy.call(|| (self.func)(arg.clone()))
    }

    /// Call a zero-argument function.
    pub fn run<T>(&self) -> std::result::Result<T, E>
    where
        F: Fn() -> std::result::Result<T, E>,
    {
        self.policy.call(&self.func)
    }

    pub fn policy(&self) -> &RetryPolicy<E> {
        &self.policy
    }

    pub fn into_inner(self) -> F {
        self.func
    }
}

impl<F, E> fmt::Debug for Retrying<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrying")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Decorate `func` so every call runs under `policy`.
pub fn retry<F, E>(policy: RetryPolicy<E>, func: F) -> Retrying<F, E> {
    Retrying { func, policy }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::clock::ManualClock;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestError {
        Timeout,
        Refused,
        Fatal,
    }

    impl ErrorKind for TestError {
        type Kind = TestError;
        fn kind(&self) -> TestError {
            *self
        }
    }

    /// Fails with `error` for the first `fails` calls, then returns the call count.
    fn flaky(fails: u32, error: TestError) -> (Cell<u32>, impl Fn(&Cell<u32>) -> std::result::Result<u32, TestError>) {
        let calls = Cell::new(0);
        let op = move |calls: &Cell<u32>| {
            calls.set(calls.get() + 1);
            if calls.get() <= fails {
                Err(error)
            } else {
                Ok(calls.get())
            }
        };
        (calls, op)
    }

    #[test]
    fn test_attempts_limited_rejects_zero() {
        let err = Attempts::limited(0).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(Attempts::limited(3).unwrap().to_string(), "3");
    }

    #[test]
    fn test_attempts_from_retries() {
        assert_eq!(Attempts::from_retries(0), Attempts::limited(1).unwrap());
        assert_eq!(Attempts::from_retries(2), Attempts::limited(3).unwrap());
        assert_eq!(
            Attempts::from_retries(u32::MAX),
            Attempts::limited(u32::MAX).unwrap()
        );
    }

    #[test]
    fn test_success_first_attempt_invokes_once() {
        let policy = RetryPolicy::<TestError>::new().with_retries(5).retry_on_any();
        let (calls, op) = flaky(0, TestError::Timeout);
        assert_eq!(policy.call(|| op(&calls)), Ok(1));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_timeout_twice_then_success() {
        let policy = RetryPolicy::<TestError>::new()
            .with_max_attempts(3)
            .unwrap()
            .retry_on_kinds([TestError::Timeout]);
        let (calls, op) = flaky(2, TestError::Timeout);
        assert_eq!(policy.call(|| op(&calls)), Ok(3));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_always_failing_invokes_max_attempts() {
        let policy = RetryPolicy::<TestError>::new()
            .with_max_attempts(4)
            .unwrap()
            .retry_on_kinds([TestError::Timeout, TestError::Refused]);
        let (calls, op) = flaky(u32::MAX, TestError::Refused);
        assert_eq!(policy.call(|| op(&calls)), Err(TestError::Refused));
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_non_retryable_is_not_retried() {
        let policy = RetryPolicy::<TestError>::new()
            .with_retries(10)
            .retry_on_kinds([TestError::Timeout]);
        let (calls, op) = flaky(5, TestError::Fatal);
        assert_eq!(policy.call(|| op(&calls)), Err(TestError::Fatal));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_default_policy_does_not_retry() {
        let policy = RetryPolicy::<TestError>::default();
        let (calls, op) = flaky(1, TestError::Timeout);
        assert_eq!(policy.call(|| op(&calls)), Err(TestError::Timeout));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_default_trap_catches_nothing_even_with_budget() {
        let policy = RetryPolicy::<TestError>::new().with_retries(3);
        let (calls, op) = flaky(1, TestError::Timeout);
        assert_eq!(policy.call(|| op(&calls)), Err(TestError::Timeout));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_unbounded_retries_until_success() {
        let cleanups = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&cleanups);
        let policy = RetryPolicy::<TestError>::new()
            .unbounded()
            .retry_on_any()
            .with_cleanup(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        let (calls, op) = flaky(999, TestError::Timeout);
        assert_eq!(policy.call(|| op(&calls)), Ok(1000));
        assert_eq!(calls.get(), 1000);
        assert_eq!(cleanups.load(Ordering::SeqCst), 999);
    }

    #[test]
    fn test_cleanup_not_run_after_final_failure() {
        let cleanups = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&cleanups);
        let policy = RetryPolicy::<TestError>::new()
            .with_retries(2)
            .retry_on_any()
            .with_cleanup(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        let (calls, op) = flaky(u32::MAX, TestError::Timeout);
        assert!(policy.call(|| op(&calls)).is_err());
        assert_eq!(calls.get(), 3);
        assert_eq!(cleanups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_backoff_sleeps_between_attempts_only() {
        let clock = ManualClock::shared();
        let policy = RetryPolicy::<TestError>::new()
            .with_max_attempts(4)
            .unwrap()
            .retry_on_any()
            .with_backoff(Backoff::exponential(
                Duration::from_millis(10),
                Duration::from_millis(25),
            ))
            .with_clock(clock.clone());
        let (calls, op) = flaky(u32::MAX, TestError::Timeout);
        assert!(policy.call(|| op(&calls)).is_err());
        assert_eq!(
            clock.sleeps(),
            vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(25),
            ]
        );
    }

    #[test]
    fn test_predicate_trap() {
        let policy = RetryPolicy::<String>::new()
            .with_retries(3)
            .retry_on(|e: &String| e.starts_with("transient"));
        let calls = Cell::new(0);
        let out: std::result::Result<(), String> = policy.call(|| {
            calls.set(calls.get() + 1);
            if calls.get() == 1 {
                Err("transient: reset".to_string())
            } else {
                Err("permanent: bad input".to_string())
            }
        });
        assert_eq!(out.unwrap_err(), "permanent: bad input");
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_retrying_decorator_with_arg() {
        let calls = AtomicU32::new(0);
        let wrapped = retry(
            RetryPolicy::<TestError>::new().with_retries(1).retry_on_any(),
            |base: u32| {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(TestError::Timeout)
                } else {
                    Ok(base * 2)
                }
            },
        );
        assert_eq!(wrapped.call(21), Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_retrying_decorator_zero_args() {
        let wrapped = retry(RetryPolicy::<TestError>::new(), || Ok::<_, TestError>("Success"));
        assert_eq!(wrapped.run(), Ok("Success"));
        assert_eq!(wrapped.policy().attempts(), Attempts::default());
    }

    #[tokio::test]
    async fn test_call_async_retries() {
        let policy = RetryPolicy::<TestError>::new()
            .with_retries(2)
            .retry_on_kinds([TestError::Timeout])
            .with_backoff(Backoff::fixed(Duration::from_millis(1)));
        let calls = AtomicU32::new(0);
        let out = policy
            .call_async(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(TestError::Timeout)
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(out, Ok(3));
    }

    #[tokio::test]
    async fn test_call_async_non_retryable() {
        let policy = RetryPolicy::<TestError>::new()
            .unbounded()
            .retry_on_kinds([TestError::Timeout]);
        let calls = AtomicU32::new(0);
        let out: std::result::Result<(), _> = retry_call_async(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError::Fatal) }
        })
        .await;
        assert_eq!(out, Err(TestError::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
