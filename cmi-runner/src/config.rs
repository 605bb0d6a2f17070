//! Runner configuration
//!
//! Defines the tunables of the lifecycle: polling and retry intervals,
//! retry bound, deletion batch size and the post-import cold-start wait.

use std::env::VarError;
use std::num::NonZeroU32;
use std::time::Duration;

use crate::service::RetryPolicy;

/// Maximum number of keys a single DeleteObjects request accepts
pub const MAX_DELETE_BATCH_SIZE: usize = 1000;

/// Runner configuration
///
/// Defaults match the intervals the lifecycle has always used; every value
/// can be overridden from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// How often to query the status of an import job
    pub poll_interval: Duration,

    /// Fixed delay between inference attempts
    pub retry_delay: Duration,

    /// Maximum number of inference attempts
    pub max_attempts: u32,

    /// Number of keys per DeleteObjects request
    pub delete_batch_size: usize,

    /// Wait after a completed import before the model is usable
    pub cold_start_wait: Duration,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - CMI_POLL_INTERVAL (seconds, default: 30)
    /// - CMI_RETRY_DELAY (seconds, default: 30)
    /// - CMI_MAX_ATTEMPTS (default: 10)
    /// - CMI_DELETE_BATCH_SIZE (default: 1000)
    /// - CMI_COLD_START_WAIT (seconds, default: 300)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let config = Self {
            poll_interval: env_secs("CMI_POLL_INTERVAL")?.unwrap_or(defaults.poll_interval),
            retry_delay: env_secs("CMI_RETRY_DELAY")?.unwrap_or(defaults.retry_delay),
            max_attempts: env_parse("CMI_MAX_ATTEMPTS")?.unwrap_or(defaults.max_attempts),
            delete_batch_size: env_parse("CMI_DELETE_BATCH_SIZE")?
                .unwrap_or(defaults.delete_batch_size),
            cold_start_wait: env_secs("CMI_COLD_START_WAIT")?.unwrap_or(defaults.cold_start_wait),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.max_attempts == 0 {
            anyhow::bail!("max_attempts must be greater than 0");
        }

        if self.delete_batch_size == 0 || self.delete_batch_size > MAX_DELETE_BATCH_SIZE {
            anyhow::bail!(
                "delete_batch_size must be between 1 and {}",
                MAX_DELETE_BATCH_SIZE
            );
        }

        Ok(())
    }

    /// Retry policy for inference calls
    pub fn retry_policy(&self) -> anyhow::Result<RetryPolicy> {
        let max_attempts = NonZeroU32::new(self.max_attempts)
            .ok_or_else(|| anyhow::anyhow!("max_attempts must be greater than 0"))?;
        Ok(RetryPolicy::new(max_attempts, self.retry_delay))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            retry_delay: Duration::from_secs(30),
            max_attempts: 10,
            delete_batch_size: MAX_DELETE_BATCH_SIZE,
            cold_start_wait: Duration::from_secs(300), // 5 minutes
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> anyhow::Result<Option<T>> {
    parse_var(name, std::env::var(name))
}

/// Parses a looked-up variable; only an unset variable yields `None`
fn parse_var<T: std::str::FromStr>(
    name: &str,
    value: Result<String, VarError>,
) -> anyhow::Result<Option<T>> {
    match value {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {:?}", name, raw)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(raw)) => {
            anyhow::bail!("{} is not valid unicode: {:?}", name, raw)
        }
    }
}

fn env_secs(name: &str) -> anyhow::Result<Option<Duration>> {
    Ok(env_parse::<u64>(name)?.map(Duration::from_secs))
}
