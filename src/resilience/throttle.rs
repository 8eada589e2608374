use super::clock::{self, SharedClock};
use crate::{Error, ErrorContext, Result};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::trace;

/// Minimum-interval throttle.
///
/// Guarantees at least `1 / max_rate` seconds between permitted calls. The
/// first call after construction or [`Throttler::reset`] goes through
/// immediately. Callers arriving together are spaced out in arrival order,
/// since each one reserves its slot before sleeping.
pub struct Throttler {
    max_rate: f64,
    min_interval: Duration,
    last_slot: Mutex<Option<Slot>>,
    clock: SharedClock,
}

/// A reserved call time, kept as `anchor + offset` so that very long
/// intervals never have to be represented as an `Instant`.
#[derive(Debug, Clone, Copy)]
struct Slot {
    anchor: Instant,
    offset: Duration,
}

impl Throttler {
    /// `max_rate` is in calls per second. `f64::INFINITY` disables throttling.
    pub fn new(max_rate: f64) -> Result<Self> {
        let min_interval = min_interval_for(max_rate)?;
        Ok(Self {
            max_rate,
            min_interval,
            last_slot: Mutex::new(None),
            clock: clock::system(),
        })
    }

    /// A throttle that never waits.
    pub fn unlimited() -> Self {
        Self {
            max_rate: f64::INFINITY,
            min_interval: Duration::ZERO,
            last_slot: Mutex::new(None),
            clock: clock::system(),
        }
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn max_rate(&self) -> f64 {
        self.max_rate
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Forget the previous call; the next one will not wait.
    pub fn reset(&self) {
        *self.state() = None;
    }

    fn state(&self) -> MutexGuard<'_, Option<Slot>> {
        // The guarded value is a plain timestamp, so a poisoned lock is still usable.
        match self.last_slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Claim the next slot and return how long the caller must wait for it.
    fn reserve(&self) -> Duration {
        let mut last = self.state();
        let now = self.clock.now();
        let wait = match *last {
            Some(prev) => {
                let due = prev.offset.saturating_add(self.min_interval);
                due.saturating_sub(now.saturating_duration_since(prev.anchor))
                    .saturating_add(prev.anchor.saturating_duration_since(now))
            }
            None => Duration::ZERO,
        };
        *last = Some(Slot {
            anchor: now,
            offset: wait,
        });
        wait
    }

    /// Block until the next call is permitted.
    pub fn wait(&self) {
        let wait = self.reserve();
        if !wait.is_zero() {
            trace!(wait_ms = wait.as_millis() as u64, "throttling call");
            self.clock.sleep(wait);
        }
    }

    /// Async form of [`Throttler::wait`]; the lock is released before sleeping.
    pub async fn wait_async(&self) {
        let wait = self.reserve();
        if !wait.is_zero() {
            trace!(wait_ms = wait.as_millis() as u64, "throttling call");
            tokio::time::sleep(wait).await;
        }
    }

    /// Wait for a slot, then run `f`.
    pub fn call<R>(&self, f: impl FnOnce() -> R) -> R {
        self.wait();
        f()
    }
}

fn min_interval_for(max_rate: f64) -> Result<Duration> {
    if max_rate.is_nan() || max_rate <= 0.0 {
        return Err(Error::configuration_with_context(
            "max_rate must be a positive number of calls per second",
            ErrorContext::new()
                .with_field_path("throttle.max_rate")
                .with_details(format!("got {}", max_rate))
                .with_source("throttle"),
        ));
    }
    if max_rate.is_infinite() {
        return Ok(Duration::ZERO);
    }
    Duration::try_from_secs_f64(1.0 / max_rate).map_err(|e| {
        Error::configuration_with_context(
            "max_rate is too small to express as an interval",
            ErrorContext::new()
                .with_field_path("throttle.max_rate")
                .with_details(e.to_string())
                .with_source("throttle"),
        )
    })
}

impl fmt::Debug for Throttler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttler")
            .field("max_rate", &self.max_rate)
            .field("min_interval", &self.min_interval)
            .finish_non_exhaustive()
    }
}

/// A function paired with its own [`Throttler`].
pub struct Throttled<F> {
    func: F,
    throttler: Throttler,
}

impl<F> Throttled<F> {
    pub fn new(func: F, max_rate: f64) -> Result<Self> {
        Ok(Self {
            func,
            throttler: Throttler::new(max_rate)?,
        })
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.throttler = self.throttler.with_clock(clock);
        self
    }

    pub fn call<A, R>(&self, arg: A) -> R
    where
        F: Fn(A) -> R,
    {
        self.throttler.wait();
        (self.func)(arg)
    }

    pub fn run<R>(&self) -> R
    where
        F: Fn() -> R,
    {
        self.throttler.wait();
        (self.func)()
    }

    pub async fn call_async<A, R>(&self, arg: A) -> R
    where
        F: Fn(A) -> R,
    {
        self.throttler.wait_async().await;
        (self.func)(arg)
    }

    /// Throttle the same underlying function at a new rate.
    ///
    /// The result wraps the original function directly, never another
    /// throttle. The clock carries over; the call history does not.
    pub fn rethrottle(self, max_rate: f64) -> Result<Self> {
        let clock = self.throttler.clock;
        Ok(Self {
            func: self.func,
            throttler: Throttler::new(max_rate)?.with_clock(clock),
        })
    }

    pub fn reset(&self) {
        self.throttler.reset();
    }

    pub fn func(&self) -> &F {
        &self.func
    }

    pub fn max_rate(&self) -> f64 {
        self.throttler.max_rate()
    }

    pub fn throttler(&self) -> &Throttler {
        &self.throttler
    }

    pub fn into_inner(self) -> F {
        self.func
    }
}

impl<F> fmt::Debug for Throttled<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttled")
            .field("throttler", &self.throttler)
            .finish_non_exhaustive()
    }
}

/// Rate-limit `func` to at most `max_rate` calls per second.
pub fn throttle<F>(func: F, max_rate: f64) -> Result<Throttled<F>> {
    Throttled::new(func, max_rate)
}
