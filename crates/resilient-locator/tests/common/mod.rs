// Shared helpers for integration tests
//
// Set RUST_LOG=resilient_locator=debug to see the resolution chain and the
// mock driver's call log while a test runs.

#![allow(dead_code)]

use resilient_locator::{Engine, EngineConfig, MockDriver};
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// Installs a fmt subscriber once per test binary
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Configuration with short budgets so paused-clock tests stay readable
pub fn fast_config() -> EngineConfig {
    EngineConfig::builder()
        .default_timeout_ms(1_000)
        .probe_timeout_ms(200)
        .negative_timeout_ms(300)
        .poll_interval_ms(50)
        .table_max_iterations(10)
        .max_scrolls(20)
        .build()
}

/// Mock driver plus an engine over it
pub fn mock_engine() -> (Arc<MockDriver>, Engine) {
    mock_engine_with(fast_config())
}

pub fn mock_engine_with(config: EngineConfig) -> (Arc<MockDriver>, Engine) {
    init_tracing();
    let driver = Arc::new(MockDriver::new());
    let engine = Engine::with_config(driver.clone(), config);
    (driver, engine)
}
