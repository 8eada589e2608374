//! Policy configuration documents.
//!
//! A [`PolicyConfig`] groups retry, throttle and cache settings and can be
//! read from YAML or JSON. Durations are written in milliseconds.
//!
//! ```yaml
//! retry:
//!   max_attempts: 3          # or "unbounded"
//!   backoff:
//!     kind: exponential      # none | fixed | exponential
//!     base_ms: 100
//!     max_ms: 2000
//!     jitter: true
//! throttle:
//!   max_rate: 30.0           # calls per second
//! cache:
//!   capacity: 128            # null for unbounded
//! ```
//!
//! Which errors a retry policy traps depends on the error type, so it is
//! set in code after [`RetryConfig::build_policy`].

use crate::cache::{MethodCache, DEFAULT_CAPACITY};
use crate::resilience::backoff::Backoff;
use crate::resilience::retry::{Attempts, RetryPolicy};
use crate::resilience::throttle::Throttler;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Environment variable naming a policy file for [`PolicyConfig::from_env`].
pub const CONFIG_ENV_VAR: &str = "FNKIT_CONFIG";

/// Attempt budget as written in a config file: a count or `"unbounded"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttemptsSetting {
    Count(u32),
    Named(String),
}

impl AttemptsSetting {
    pub fn to_attempts(&self) -> Result<Attempts> {
        match self {
            AttemptsSetting::Count(n) => Attempts::limited(*n),
            AttemptsSetting::Named(name) => match name.to_ascii_lowercase().as_str() {
                "unbounded" | "infinite" | "inf" => Ok(Attempts::Unbounded),
                other => Err(Error::configuration_with_context(
                    "max_attempts must be a positive integer or \"unbounded\"",
                    ErrorContext::new()
                        .with_field_path("retry.max_attempts")
                        .with_details(format!("got {:?}", other))
                        .with_source("config"),
                )),
            },
        }
    }
}

impl Default for AttemptsSetting {
    fn default() -> Self {
        AttemptsSetting::Count(1)
    }
}

impl From<Attempts> for AttemptsSetting {
    fn from(attempts: Attempts) -> Self {
        match attempts {
            Attempts::Limited(n) => AttemptsSetting::Count(n.get()),
            Attempts::Unbounded => AttemptsSetting::Named("unbounded".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffConfig {
    #[default]
    None,
    Fixed {
        delay_ms: u64,
    },
    Exponential {
        base_ms: u64,
        max_ms: u64,
        #[serde(default)]
        jitter: bool,
    },
}

impl BackoffConfig {
    pub fn to_backoff(&self) -> Backoff {
        match *self {
            BackoffConfig::None => Backoff::None,
            BackoffConfig::Fixed { delay_ms } => Backoff::fixed(Duration::from_millis(delay_ms)),
            BackoffConfig::Exponential {
                base_ms,
                max_ms,
                jitter,
            } => {
                let backoff = Backoff::exponential(
                    Duration::from_millis(base_ms),
                    Duration::from_millis(max_ms),
                );
                if jitter {
                    backoff.with_jitter()
                } else {
                    backoff
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: AttemptsSetting,
    pub backoff: BackoffConfig,
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, attempts: Attempts) -> Self {
        self.max_attempts = attempts.into();
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Build a policy with this budget and backoff. It traps nothing until
    /// `retry_on*` is called on it.
    pub fn build_policy<E: 'static>(&self) -> Result<RetryPolicy<E>> {
        Ok(RetryPolicy::new()
            .with_attempts(self.max_attempts.to_attempts()?)
            .with_backoff(self.backoff.to_backoff()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Calls per second; absent means unthrottled.
    pub max_rate: Option<f64>,
}

impl ThrottleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_rate(mut self, max_rate: f64) -> Self {
        self.max_rate = Some(max_rate);
        self
    }

    pub fn build(&self) -> Result<Throttler> {
        match self.max_rate {
            Some(rate) => Throttler::new(rate),
            None => Ok(Throttler::unlimited()),
        }
    }
}

fn default_capacity() -> Option<usize> {
    Some(DEFAULT_CAPACITY)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum entries; `None` (`null`) means unbounded.
    #[serde(default = "default_capacity")]
    pub capacity: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, capacity: Option<usize>) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn build<K, V>(&self) -> Result<MethodCache<K, V>> {
        match self.capacity {
            Some(n) => MethodCache::with_capacity(n),
            None => Ok(MethodCache::unbounded()),
        }
    }
}

/// Retry, throttle and cache settings read from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PolicyConfig {
    pub retry: RetryConfig,
    pub throttle: ThrottleConfig,
    pub cache: CacheConfig,
}

impl PolicyConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a file: JSON for `.json`, YAML for anything else.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let cfg = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
        .map_err(|e| match e {
            Error::Configuration { message, context } => {
                let details = match &context.details {
                    Some(d) => format!("{} in {}", d, path.display()),
                    None => format!("in {}", path.display()),
                };
                Error::Configuration {
                    message,
                    context: context.with_details(details),
                }
            }
            other => other,
        })?;
        debug!(path = %path.display(), "loaded policy configuration");
        Ok(cfg)
    }

    /// Load the file named by `FNKIT_CONFIG`, or defaults when it is unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::from_path(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    /// Check every section converts into its runtime object.
    pub fn validate(&self) -> Result<()> {
        self.retry.max_attempts.to_attempts()?;
        self.throttle.build()?;
        if self.cache.capacity == Some(0) {
            return Err(Error::configuration_with_context(
                "cache capacity must be at least 1",
                ErrorContext::new()
                    .with_field_path("cache.capacity")
                    .with_source("config"),
            ));
        }
        Ok(())
    }
}
