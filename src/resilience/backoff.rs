//! Delay strategies between retry attempts.

use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How long to wait before the next attempt.
///
/// `attempt` passed to [`Backoff::delay`] is the 1-based number of the attempt
/// that just failed, so the first retry sees `attempt == 1`.
#[derive(Clone, Default)]
pub enum Backoff {
    /// Retry immediately.
    #[default]
    None,
    /// Same delay before every retry.
    Fixed(Duration),
    /// `base * 2^(attempt - 1)`, capped at `max`. With `jitter`, up to 10% of
    /// the capped delay is added at random.
    Exponential {
        base: Duration,
        max: Duration,
        jitter: bool,
    },
    /// Caller-supplied function of the failed attempt number.
    Custom(Arc<dyn Fn(u32) -> Duration + Send + Sync>),
}

impl Backoff {
    pub fn fixed(delay: Duration) -> Self {
        Backoff::Fixed(delay)
    }

    pub fn exponential(base: Duration, max: Duration) -> Self {
        Backoff::Exponential {
            base,
            max,
            jitter: false,
        }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        Backoff::Custom(Arc::new(f))
    }

    /// Enable jitter on an exponential backoff. Other variants are unchanged.
    pub fn with_jitter(self) -> Self {
        match self {
            Backoff::Exponential { base, max, .. } => Backoff::Exponential {
                base,
                max,
                jitter: true,
            },
            other => other,
        }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(d) => *d,
            Backoff::Exponential { base, max, jitter } => {
                exponential_delay(attempt, *base, *max, *jitter)
            }
            Backoff::Custom(f) => f(attempt),
        }
    }
}

fn exponential_delay(attempt: u32, base: Duration, max: Duration, jitter: bool) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
    let capped = base.saturating_mul(factor).min(max);

    if !jitter {
        return capped;
    }

    let jitter_range = u64::try_from(capped.as_millis()).unwrap_or(u64::MAX) / 10;
    let extra = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };
    capped.saturating_add(Duration::from_millis(extra))
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backoff::None => f.write_str("None"),
            Backoff::Fixed(d) => f.debug_tuple("Fixed").field(d).finish(),
            Backoff::Exponential { base, max, jitter } => f
                .debug_struct("Exponential")
                .field("base", base)
                .field("max", max)
                .field("jitter", jitter)
                .finish(),
            Backoff::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}
