//! resilient-locator: fallback-aware element resolution for browser automation
//!
//! Describe an element with several alternative locators and let the engine
//! resolve, wait for, retry and interact with it despite rendering races and
//! transient flakiness. Table helpers build on the same resolution chain for
//! row/cell addressing, stabilization waits, infinite scroll and pagination.
//!
//! The engine talks to the browser through the [`Driver`] trait. Enable the
//! `playwright` feature for the production binding over `playwright-rs`.
//! The `mock` feature adds `MockDriver`, a scripted in-memory driver for
//! tests.
//!
//! # Examples
//!
//! ## Fallback resolution and interactions
//!
//! ```ignore
//! use resilient_locator::{Engine, EngineConfig, PlaywrightDriver, SelectBy};
//! use playwright_rs::Playwright;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let playwright = Playwright::launch().await?;
//!     let browser = playwright.chromium().launch().await?;
//!     let page = browser.new_page().await?;
//!     page.goto("https://shop.example/checkout", None).await?;
//!
//!     let engine = Engine::with_config(
//!         Arc::new(PlaywrightDriver::new(page)),
//!         EngineConfig::from_env()?,
//!     );
//!
//!     // Tried in order: the id, then the visible text, then the ARIA role
//!     engine
//!         .fill("#email", &["placeholder=Email"], "ada@example.com", None)
//!         .await?;
//!     engine
//!         .select_option("#country", &[], &SelectBy::label("Norway"), None)
//!         .await?;
//!     engine
//!         .click("#pay", &["text=Pay now", "role=button[name='Pay now']"], None)
//!         .await?;
//!
//!     // Dismiss the cookie banner only if it shows up
//!     engine.click_if_exists("#cookie-accept", &[], None).await?;
//!
//!     browser.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Verifications
//!
//! ```ignore
//! use resilient_locator::{SoftAssertions, TextMatch};
//!
//! engine
//!     .verify_text("#status", &[], "paid", TextMatch::contains().ignore_case(), None, None)
//!     .await?;
//! engine.verify_not_exists(".spinner", None, Some("spinner should be gone")).await?;
//!
//! let mut soft = SoftAssertions::new();
//! engine.soft_verify_value(&mut soft, "#qty", &[], "2", None, None).await;
//! engine.soft_verify_enabled(&mut soft, "#checkout", &[], None, None).await;
//! soft.verify()?;
//! ```
//!
//! ## Tables
//!
//! ```ignore
//! let table = engine.table();
//! table.wait_for_table_update("#orders").await?;
//! let row = table.find_row_by_key("#orders", 0, "A-1001").await?;
//! let status = table.get_cell_value("#orders", row, 3).await?;
//! table.set_cell_value("#orders", row, 2, "5").await?;
//!
//! let outcome = table.load_all_dynamic_rows("#feed", None).await?;
//! if !outcome.is_complete() {
//!     tracing::warn!(rows = outcome.row_count(), "feed still loading");
//! }
//! ```

mod actions;
pub mod backoff;
pub mod config;
pub mod driver;
pub mod engine;
mod error;
pub mod locator;
pub mod pagination;
pub mod resolve;
pub mod retry;
pub mod soft;
pub mod table;
pub mod verify;

// Re-export error types
pub use error::{Error, Result};

// Re-export the engine and its configuration
pub use config::{
    DEFAULT_NEGATIVE_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_PROBE_TIMEOUT_MS,
    DEFAULT_TIMEOUT_MS, EngineConfig, EngineConfigBuilder,
};
pub use engine::Engine;
pub use resolve::ElementHandle;

// Re-export locator parsing
pub use locator::{Locator, RoleQuery, Strategy, StrategySet};

// Re-export the driver seam
#[cfg(feature = "playwright")]
pub use driver::PlaywrightDriver;
pub use driver::{
    BoundingBox, ClickOptions, Driver, ElementState, LoadState, MouseButton, Position, SelectBy,
    Selector, SelectorPart,
};
#[cfg(any(test, feature = "mock"))]
pub use driver::{MockDom, MockDriver, MockElement};

// Re-export retry and backoff
pub use backoff::Backoff;
pub use retry::{RetryPolicy, retry_interaction, retry_with_backoff};

// Re-export verification types
pub use soft::{SoftAssertionError, SoftAssertions, SoftFailure, SoftSummary};
pub use verify::TextMatch;

// Re-export table types
pub use pagination::{NEXT_PAGE_CANDIDATES, PREVIOUS_PAGE_CANDIDATES};
pub use table::{DynamicLoadOutcome, PageRow, TableEngine};
