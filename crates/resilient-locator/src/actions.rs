// Interaction operations
//
// Every interaction has the same shape: resolve through the fallback chain,
// perform exactly one driver action with the same timeout, and classify the
// outcome. Resolution failures (ElementNotFound) pass through untouched; any
// failure of the action itself becomes ElementNotInteractable.

use crate::driver::{ClickOptions, ElementState, LoadState, MouseButton, Position, SelectBy};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::resolve::ElementHandle;
use std::future::Future;

impl Engine {
    /// Resolves, runs one action, and classifies its failure.
    async fn interact<T, F, Fut>(
        &self,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: u64,
        action: &str,
        perform: F,
    ) -> Result<T>
    where
        F: FnOnce(ElementHandle) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let handle = self.resolve(locator, fallbacks, Some(timeout_ms)).await?;
        let resolved = handle.locator().to_string();
        match perform(handle).await {
            Ok(value) => {
                tracing::debug!(locator = %resolved, action, "Interaction succeeded");
                Ok(value)
            }
            Err(e) => Err(self.not_interactable(&resolved, action, e).await),
        }
    }

    /// Wraps an action failure; ElementNotFound is returned unchanged.
    pub(crate) async fn not_interactable(&self, locator: &str, action: &str, err: Error) -> Error {
        if err.is_not_found() {
            return err;
        }
        tracing::warn!(locator, action, error = %err, "Interaction failed");
        Error::ElementNotInteractable {
            locator: locator.to_string(),
            action: action.to_string(),
            reason: err.to_string(),
            page_url: self.page_url().await,
        }
    }

    /// Left-clicks the first visible candidate
    pub async fn click(
        &self,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        let timeout_ms = self.timeout(timeout_ms);
        self.interact(locator, fallbacks, timeout_ms, "click", |handle| async move {
            self.driver()
                .click(handle.selector(), &ClickOptions::new(timeout_ms))
                .await
        })
        .await
    }

    /// Clicks the element if it shows up within the probe timeout.
    ///
    /// Returns `Ok(false)` when no candidate resolves. A resolved element
    /// whose click fails still raises `ElementNotInteractable`.
    pub async fn click_if_exists(
        &self,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
    ) -> Result<bool> {
        let timeout_ms = timeout_ms.unwrap_or(self.config().probe_timeout_ms);
        match self.click(locator, fallbacks, Some(timeout_ms)).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => {
                tracing::debug!(locator, "Optional element absent, skipping click");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn double_click(
        &self,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        let timeout_ms = self.timeout(timeout_ms);
        self.interact(locator, fallbacks, timeout_ms, "double_click", |handle| async move {
            self.driver()
                .double_click(handle.selector(), &ClickOptions::new(timeout_ms))
                .await
        })
        .await
    }

    pub async fn right_click(
        &self,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        let timeout_ms = self.timeout(timeout_ms);
        self.interact(locator, fallbacks, timeout_ms, "right_click", |handle| async move {
            let options = ClickOptions::new(timeout_ms).button(MouseButton::Right);
            self.driver().click(handle.selector(), &options).await
        })
        .await
    }

    /// Clicks at an offset from the element's top-left corner.
    ///
    /// When the driver reports a bounding box, offsets outside it are
    /// rejected instead of clicking whatever lies underneath.
    pub async fn click_at_position(
        &self,
        locator: &str,
        fallbacks: &[&str],
        position: Position,
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        let timeout_ms = self.timeout(timeout_ms);
        self.interact(locator, fallbacks, timeout_ms, "click_at_position", |handle| async move {
            if let Some(bounds) = self.driver().bounding_box(handle.selector()).await? {
                if !bounds.contains_offset(position) {
                    return Err(Error::InvalidArgument(format!(
                        "position ({}, {}) lies outside the {}x{} element",
                        position.x, position.y, bounds.width, bounds.height
                    )));
                }
            }
            let options = ClickOptions::new(timeout_ms).position(position);
            self.driver().click(handle.selector(), &options).await
        })
        .await
    }

    /// Replaces the element's value with `text`
    pub async fn fill(
        &self,
        locator: &str,
        fallbacks: &[&str],
        text: &str,
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        let timeout_ms = self.timeout(timeout_ms);
        self.interact(locator, fallbacks, timeout_ms, "fill", |handle| async move {
            self.driver().fill(handle.selector(), text, timeout_ms).await
        })
        .await
    }

    /// Empties an input
    pub async fn clear(
        &self,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        let timeout_ms = self.timeout(timeout_ms);
        self.interact(locator, fallbacks, timeout_ms, "clear", |handle| async move {
            self.driver().fill(handle.selector(), "", timeout_ms).await
        })
        .await
    }

    /// Selects an `<option>` by value, label or index.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` before any resolution if `option`
    /// names nothing to select.
    pub async fn select_option(
        &self,
        locator: &str,
        fallbacks: &[&str],
        option: &SelectBy,
        timeout_ms: Option<u64>,
    ) -> Result<Vec<String>> {
        option.validate()?;
        let timeout_ms = self.timeout(timeout_ms);
        self.interact(locator, fallbacks, timeout_ms, "select_option", |handle| async move {
            self.driver()
                .select_option(handle.selector(), option, timeout_ms)
                .await
        })
        .await
    }

    pub async fn hover(
        &self,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        let timeout_ms = self.timeout(timeout_ms);
        self.interact(locator, fallbacks, timeout_ms, "hover", |handle| async move {
            self.driver().hover(handle.selector(), timeout_ms).await
        })
        .await
    }

    /// Presses a key (`Enter`, `Control+A`, ...) with the element focused
    pub async fn press_key(
        &self,
        locator: &str,
        fallbacks: &[&str],
        key: &str,
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        let timeout_ms = self.timeout(timeout_ms);
        self.interact(locator, fallbacks, timeout_ms, "press_key", |handle| async move {
            self.driver().press(handle.selector(), key, timeout_ms).await
        })
        .await
    }

    pub async fn check(
        &self,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        self.set_checked(locator, fallbacks, true, timeout_ms).await
    }

    pub async fn uncheck(
        &self,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        self.set_checked(locator, fallbacks, false, timeout_ms).await
    }

    async fn set_checked(
        &self,
        locator: &str,
        fallbacks: &[&str],
        checked: bool,
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        let timeout_ms = self.timeout(timeout_ms);
        let action = if checked { "check" } else { "uncheck" };
        self.interact(locator, fallbacks, timeout_ms, action, |handle| async move {
            self.driver()
                .set_checked(handle.selector(), checked, timeout_ms)
                .await
        })
        .await
    }

    /// Text content of the element, empty when it has none
    pub async fn get_text(
        &self,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
    ) -> Result<String> {
        let timeout_ms = self.timeout(timeout_ms);
        self.interact(locator, fallbacks, timeout_ms, "get_text", |handle| async move {
            let text = self.driver().text_content(handle.selector()).await?;
            Ok::<_, Error>(text.unwrap_or_default())
        })
        .await
    }

    pub async fn get_attribute(
        &self,
        locator: &str,
        fallbacks: &[&str],
        name: &str,
        timeout_ms: Option<u64>,
    ) -> Result<Option<String>> {
        let timeout_ms = self.timeout(timeout_ms);
        self.interact(locator, fallbacks, timeout_ms, "get_attribute", |handle| async move {
            self.driver().get_attribute(handle.selector(), name).await
        })
        .await
    }

    pub async fn get_input_value(
        &self,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
    ) -> Result<String> {
        let timeout_ms = self.timeout(timeout_ms);
        self.interact(locator, fallbacks, timeout_ms, "get_input_value", |handle| async move {
            self.driver().input_value(handle.selector()).await
        })
        .await
    }

    /// Non-raising visibility probe; uses the probe timeout by default
    pub async fn is_visible(
        &self,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
    ) -> Result<bool> {
        let timeout_ms = timeout_ms.unwrap_or(self.config().probe_timeout_ms);
        match self.resolve(locator, fallbacks, Some(timeout_ms)).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Waits for the first candidate to reach `state`
    pub async fn wait_for_element(
        &self,
        locator: &str,
        fallbacks: &[&str],
        state: ElementState,
        timeout_ms: Option<u64>,
    ) -> Result<ElementHandle> {
        self.resolve_with_state(locator, fallbacks, state, timeout_ms)
            .await
    }

    /// Waits for a page-level load state
    pub async fn wait_for_page_load(
        &self,
        state: LoadState,
        timeout_ms: Option<u64>,
    ) -> Result<()> {
        let timeout_ms = self.timeout(timeout_ms);
        tracing::debug!(%state, timeout_ms, "Waiting for page load state");
        self.driver().wait_for_load_state(state, timeout_ms).await
    }
}
