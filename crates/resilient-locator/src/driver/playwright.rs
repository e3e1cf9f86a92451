// PlaywrightDriver - Driver binding over a playwright-rs Page
//
// Element-level calls act on `locator.first()`, so a selector matching many
// elements behaves like Playwright's non-strict mode. Waits that playwright-rs
// does not expose on Locator (state waits, page load states, bounding boxes)
// are built from polling and page evaluation.

use super::{
    BoundingBox, ClickOptions, Driver, ElementState, LoadState, MouseButton, SelectBy, Selector,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use playwright_rs::protocol::{
    CheckOptions, FillOptions, HoverOptions, Locator, Page, PressOptions, SelectOption,
    SelectOptions,
};
use std::time::Duration;
use tokio::time::Instant;

/// Polling interval for state and load waits (matches Playwright's assertion polling)
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long the resource count must hold still to count as network idle
const NETWORK_IDLE_QUIET: Duration = Duration::from_millis(500);

/// Driver backed by a live Playwright page
#[derive(Clone)]
pub struct PlaywrightDriver {
    page: Page,
}

impl PlaywrightDriver {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    async fn locator(&self, selector: &Selector) -> Locator {
        self.page.locator(&selector.to_string()).await
    }

    async fn first(&self, selector: &Selector) -> Locator {
        self.locator(selector).await.first()
    }

    async fn state_reached(&self, selector: &Selector, state: ElementState) -> Result<bool> {
        let locator = self.locator(selector).await;
        Ok(match state {
            ElementState::Visible => locator.first().is_visible().await.map_err(read_error)?,
            ElementState::Hidden => !locator.first().is_visible().await.map_err(read_error)?,
            ElementState::Attached => locator.count().await.map_err(read_error)? > 0,
            ElementState::Detached => locator.count().await.map_err(read_error)? == 0,
        })
    }

    async fn ready_state(&self) -> Result<String> {
        self.page
            .evaluate::<(), String>("document.readyState", None)
            .await
            .map_err(read_error)
    }

    async fn resource_count(&self) -> Result<u64> {
        self.page
            .evaluate::<(), u64>("performance.getEntriesByType('resource').length", None)
            .await
            .map_err(read_error)
    }
}

fn millis(timeout_ms: u64) -> Option<f64> {
    Some(timeout_ms as f64)
}

/// Maps a playwright-rs failure of a timed action
fn action_error(operation: &str, timeout_ms: u64, err: playwright_rs::Error) -> Error {
    match err {
        playwright_rs::Error::Timeout(msg) => Error::timeout(operation, timeout_ms, msg),
        other => Error::Driver(format!("{} failed: {}", operation, other)),
    }
}

fn read_error(err: playwright_rs::Error) -> Error {
    Error::Driver(err.to_string())
}

fn to_playwright_click(options: &ClickOptions) -> playwright_rs::protocol::ClickOptions {
    let button = match options.button {
        MouseButton::Left => playwright_rs::protocol::MouseButton::Left,
        MouseButton::Right => playwright_rs::protocol::MouseButton::Right,
        MouseButton::Middle => playwright_rs::protocol::MouseButton::Middle,
    };
    playwright_rs::protocol::ClickOptions {
        button: Some(button),
        click_count: Some(options.click_count),
        position: options.position.map(|p| playwright_rs::protocol::Position { x: p.x, y: p.y }),
        timeout: millis(options.timeout_ms),
        ..Default::default()
    }
}

fn to_select_option(option: &SelectBy) -> Result<SelectOption> {
    if let Some(value) = &option.value {
        Ok(SelectOption::Value(value.clone()))
    } else if let Some(label) = &option.label {
        Ok(SelectOption::Label(label.clone()))
    } else if let Some(index) = option.index {
        Ok(SelectOption::Index(index))
    } else {
        Err(Error::InvalidArgument(format!("nothing to select: {}", option)))
    }
}

#[async_trait]
impl Driver for PlaywrightDriver {
    async fn wait_for(
        &self,
        selector: &Selector,
        state: ElementState,
        timeout_ms: u64,
    ) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            match self.state_reached(selector, state).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(%selector, error = %e, "State probe failed, polling again")
                }
            }
            if Instant::now() >= deadline {
                return Err(Error::timeout(
                    "wait_for",
                    timeout_ms,
                    format!("waiting for '{}' to be {}", selector, state),
                ));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&self, selector: &Selector, options: &ClickOptions) -> Result<()> {
        self.first(selector)
            .await
            .click(Some(to_playwright_click(options)))
            .await
            .map_err(|e| action_error("click", options.timeout_ms, e))
    }

    async fn double_click(&self, selector: &Selector, options: &ClickOptions) -> Result<()> {
        self.first(selector)
            .await
            .dblclick(Some(to_playwright_click(options)))
            .await
            .map_err(|e| action_error("double_click", options.timeout_ms, e))
    }

    async fn fill(&self, selector: &Selector, text: &str, timeout_ms: u64) -> Result<()> {
        let options = FillOptions {
            timeout: millis(timeout_ms),
            ..Default::default()
        };
        self.first(selector)
            .await
            .fill(text, Some(options))
            .await
            .map_err(|e| action_error("fill", timeout_ms, e))
    }

    async fn select_option(
        &self,
        selector: &Selector,
        option: &SelectBy,
        timeout_ms: u64,
    ) -> Result<Vec<String>> {
        let choice = to_select_option(option)?;
        let options = SelectOptions {
            timeout: millis(timeout_ms),
            ..Default::default()
        };
        self.first(selector)
            .await
            .select_option(choice, Some(options))
            .await
            .map_err(|e| action_error("select_option", timeout_ms, e))
    }

    async fn hover(&self, selector: &Selector, timeout_ms: u64) -> Result<()> {
        let options = HoverOptions {
            timeout: millis(timeout_ms),
            ..Default::default()
        };
        self.first(selector)
            .await
            .hover(Some(options))
            .await
            .map_err(|e| action_error("hover", timeout_ms, e))
    }

    async fn press(&self, selector: &Selector, key: &str, timeout_ms: u64) -> Result<()> {
        let options = PressOptions {
            timeout: millis(timeout_ms),
            ..Default::default()
        };
        self.first(selector)
            .await
            .press(key, Some(options))
            .await
            .map_err(|e| action_error("press", timeout_ms, e))
    }

    async fn set_checked(
        &self,
        selector: &Selector,
        checked: bool,
        timeout_ms: u64,
    ) -> Result<()> {
        let options = CheckOptions {
            timeout: millis(timeout_ms),
            ..Default::default()
        };
        self.first(selector)
            .await
            .set_checked(checked, Some(options))
            .await
            .map_err(|e| action_error("set_checked", timeout_ms, e))
    }

    async fn text_content(&self, selector: &Selector) -> Result<Option<String>> {
        self.first(selector)
            .await
            .text_content()
            .await
            .map_err(read_error)
    }

    async fn inner_text(&self, selector: &Selector) -> Result<String> {
        self.first(selector)
            .await
            .inner_text()
            .await
            .map_err(read_error)
    }

    async fn get_attribute(&self, selector: &Selector, name: &str) -> Result<Option<String>> {
        self.first(selector)
            .await
            .get_attribute(name)
            .await
            .map_err(read_error)
    }

    async fn input_value(&self, selector: &Selector) -> Result<String> {
        self.first(selector)
            .await
            .input_value(None)
            .await
            .map_err(read_error)
    }

    /// Only plain CSS selectors can be measured; chained selectors report
    /// no box.
    async fn bounding_box(&self, selector: &Selector) -> Result<Option<BoundingBox>> {
        let Some(css) = selector.as_single_css() else {
            return Ok(None);
        };
        let script = format!(
            "(() => {{ const el = document.querySelector({}); \
             if (!el) return null; \
             const r = el.getBoundingClientRect(); \
             return {{ x: r.x, y: r.y, width: r.width, height: r.height }}; }})()",
            serde_json::to_string(css)?
        );
        let value = self.evaluate(&script).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn is_visible(&self, selector: &Selector) -> Result<bool> {
        self.first(selector)
            .await
            .is_visible()
            .await
            .map_err(read_error)
    }

    async fn is_enabled(&self, selector: &Selector) -> Result<bool> {
        self.first(selector)
            .await
            .is_enabled()
            .await
            .map_err(read_error)
    }

    async fn is_checked(&self, selector: &Selector) -> Result<bool> {
        self.first(selector)
            .await
            .is_checked()
            .await
            .map_err(read_error)
    }

    async fn is_editable(&self, selector: &Selector) -> Result<bool> {
        self.first(selector)
            .await
            .is_editable()
            .await
            .map_err(read_error)
    }

    async fn count(&self, selector: &Selector) -> Result<usize> {
        self.locator(selector)
            .await
            .count()
            .await
            .map_err(read_error)
    }

    async fn wait_for_load_state(&self, state: LoadState, timeout_ms: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut quiet_since: Option<(Instant, u64)> = None;

        loop {
            let ready = self.ready_state().await?;
            let reached = match state {
                LoadState::DomContentLoaded => ready == "interactive" || ready == "complete",
                LoadState::Load => ready == "complete",
                LoadState::NetworkIdle if ready == "complete" => {
                    let resources = self.resource_count().await?;
                    match quiet_since {
                        Some((since, seen)) if seen == resources => {
                            since.elapsed() >= NETWORK_IDLE_QUIET
                        }
                        _ => {
                            quiet_since = Some((Instant::now(), resources));
                            false
                        }
                    }
                }
                LoadState::NetworkIdle => false,
            };
            if reached {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::timeout(
                    "wait_for_load_state",
                    timeout_ms,
                    format!("page never reached '{}' (readyState: {})", state, ready),
                ));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value> {
        self.page
            .evaluate::<(), serde_json::Value>(expression, None)
            .await
            .map_err(read_error)
    }

    async fn url(&self) -> Result<String> {
        Ok(self.page.url())
    }
}
