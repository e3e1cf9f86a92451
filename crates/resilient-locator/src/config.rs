// Engine configuration
//
// Timeouts and polling knobs shared by every engine operation. Values can be
// set through the builder or overridden from the environment:
//
//   RESILIENT_DEFAULT_TIMEOUT_MS   general resolution/action timeout
//   RESILIENT_PROBE_TIMEOUT_MS     click_if_exists and other existence probes
//   RESILIENT_NEGATIVE_TIMEOUT_MS  verify_not_exists / verify_disabled
//   RESILIENT_POLL_INTERVAL_MS     table stabilization and scroll polling
//   RESILIENT_MAX_RETRIES          attempts for with_retry
//   RESILIENT_RETRY_DELAY_MS       initial backoff delay for with_retry

use crate::error::{Error, Result};
use crate::locator::StrategySet;
use serde::{Deserialize, Serialize};

/// Default timeout for resolution and actions (30 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default timeout for existence probes such as `click_if_exists` (5 seconds)
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;

/// Default timeout for negative verifications (5 seconds)
pub const DEFAULT_NEGATIVE_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval for stabilization loops
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Timeout for resolution and actions when the caller passes none
    pub default_timeout_ms: u64,
    /// Timeout for existence probes (`click_if_exists`, `is_visible`)
    pub probe_timeout_ms: u64,
    /// Timeout for negative checks (`verify_not_exists`, `verify_disabled`)
    pub negative_timeout_ms: u64,
    /// Interval between row-count polls and scroll measurements
    pub poll_interval_ms: u64,
    /// Upper bound on row-count polls in `wait_for_table_update`
    pub table_max_iterations: u32,
    /// Upper bound on scrolls in `load_all_dynamic_rows`
    pub max_scrolls: u32,
    /// Attempts made by `Engine::with_retry`
    pub max_retries: u32,
    /// Initial backoff delay for `Engine::with_retry`, in milliseconds
    pub retry_initial_delay_ms: u64,
    /// Strategy names the engine's locator parser accepts
    pub strategies: StrategySet,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            negative_timeout_ms: DEFAULT_NEGATIVE_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            table_max_iterations: 10,
            max_scrolls: 50,
            max_retries: 3,
            retry_initial_delay_ms: 1_000,
            strategies: StrategySet::Engine,
        }
    }
}

impl EngineConfig {
    /// Creates a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder starting from defaults
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Defaults with any `RESILIENT_*` environment overrides applied
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if a variable is set but is not a
    /// non-negative integer.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup (environment in production,
    /// a map in tests).
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        if let Some(v) = read_u64(&lookup, "RESILIENT_DEFAULT_TIMEOUT_MS")? {
            self.default_timeout_ms = v;
        }
        if let Some(v) = read_u64(&lookup, "RESILIENT_PROBE_TIMEOUT_MS")? {
            self.probe_timeout_ms = v;
        }
        if let Some(v) = read_u64(&lookup, "RESILIENT_NEGATIVE_TIMEOUT_MS")? {
            self.negative_timeout_ms = v;
        }
        if let Some(v) = read_u64(&lookup, "RESILIENT_POLL_INTERVAL_MS")? {
            self.poll_interval_ms = v;
        }
        if let Some(v) = read_u64(&lookup, "RESILIENT_MAX_RETRIES")? {
            self.max_retries = u32::try_from(v).map_err(|_| {
                Error::InvalidArgument(format!("RESILIENT_MAX_RETRIES out of range: {}", v))
            })?;
        }
        if let Some(v) = read_u64(&lookup, "RESILIENT_RETRY_DELAY_MS")? {
            self.retry_initial_delay_ms = v;
        }
        Ok(self)
    }
}

fn read_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<u64>().map(Some).map_err(|_| {
            Error::InvalidArgument(format!("{} must be a non-negative integer, got '{}'", key, raw))
        }),
    }
}

/// Builder for EngineConfig
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn default_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.default_timeout_ms = timeout_ms;
        self
    }

    pub fn probe_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.probe_timeout_ms = timeout_ms;
        self
    }

    pub fn negative_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.negative_timeout_ms = timeout_ms;
        self
    }

    pub fn poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.config.poll_interval_ms = interval_ms;
        self
    }

    pub fn table_max_iterations(mut self, iterations: u32) -> Self {
        self.config.table_max_iterations = iterations;
        self
    }

    pub fn max_scrolls(mut self, scrolls: u32) -> Self {
        self.config.max_scrolls = scrolls;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    pub fn retry_initial_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.retry_initial_delay_ms = delay_ms;
        self
    }

    pub fn strategies(mut self, strategies: StrategySet) -> Self {
        self.config.strategies = strategies;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}
