// Engine - entry point tying a Driver to the resolution/interaction layers
//
// The engine is stateless apart from its configuration. Every operation
// re-resolves its locators against the live document; nothing is cached
// between calls, so an Engine can be cloned and shared across tasks freely.

use crate::config::EngineConfig;
use crate::driver::Driver;
use crate::error::Result;
use crate::retry::{RetryPolicy, retry_interaction};
use crate::table::TableEngine;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Page URL recorded in errors when the driver cannot report one
pub(crate) const UNKNOWN_URL: &str = "<unknown>";

/// Resilient element engine over a Driver
///
/// # Example
///
/// ```ignore
/// use resilient_locator::{Engine, EngineConfig};
/// use std::sync::Arc;
///
/// let engine = Engine::with_config(Arc::new(driver), EngineConfig::from_env()?);
///
/// engine.click("#submit", &["text=Submit", "role=button[name='Submit']"], None).await?;
/// let row = engine.table().find_row_by_key("#orders", 0, "A-1001").await?;
/// ```
#[derive(Clone)]
pub struct Engine {
    driver: Arc<dyn Driver>,
    config: EngineConfig,
}

impl Engine {
    /// Creates an engine with the default configuration
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self::with_config(driver, EngineConfig::default())
    }

    pub fn with_config(driver: Arc<dyn Driver>, config: EngineConfig) -> Self {
        Self { driver, config }
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Table/grid operations bound to this engine
    pub fn table(&self) -> TableEngine<'_> {
        TableEngine::new(self)
    }

    /// Retry policy derived from `max_retries` and `retry_initial_delay_ms`
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        RetryPolicy::new(
            self.config.max_retries,
            Duration::from_millis(self.config.retry_initial_delay_ms).as_secs_f64(),
        )
    }

    /// Runs an interaction under the configured retry policy.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let engine = engine.clone();
    /// engine
    ///     .with_retry("submit order", || engine.click("#submit", &[], None))
    ///     .await?;
    /// ```
    pub async fn with_retry<T, F, Fut>(&self, operation: &str, interaction: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let policy = self.retry_policy()?;
        retry_interaction(&policy, operation, interaction).await
    }

    /// Caller override, else the configured default timeout
    pub(crate) fn timeout(&self, timeout_ms: Option<u64>) -> u64 {
        timeout_ms.unwrap_or(self.config.default_timeout_ms)
    }

    /// Current page URL for error context; never fails
    pub(crate) async fn page_url(&self) -> String {
        match self.driver.url().await {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(error = %e, "Could not read page URL");
                UNKNOWN_URL.to_string()
            }
        }
    }

    pub(crate) async fn poll_sleep(&self) {
        tokio::time::sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
