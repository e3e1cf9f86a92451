// Pagination helpers
//
// Best effort, like the locator fallback chain: an explicit control locator
// is used when given, otherwise a fixed list of common "next"/"previous"
// patterns is sniffed in order. Sniffing only inspects what is on the page
// right now; it never waits for a candidate to appear.

use crate::driver::{ClickOptions, Selector};
use crate::error::Result;
use crate::locator;
use crate::table::TableEngine;
use tracing::debug;

/// Common "next page" controls, most specific first
pub const NEXT_PAGE_CANDIDATES: &[&str] = &[
    "[aria-label='Next page']",
    "[aria-label='Next']",
    "[rel='next']",
    ".pagination .next a",
    ".pagination-next",
    "li.next a",
    "button:has-text('Next')",
    "a:has-text('Next')",
    "button:has-text('›')",
];

/// Common "previous page" controls, most specific first
pub const PREVIOUS_PAGE_CANDIDATES: &[&str] = &[
    "[aria-label='Previous page']",
    "[aria-label='Previous']",
    "[rel='prev']",
    ".pagination .prev a",
    ".pagination-previous",
    "li.previous a",
    "button:has-text('Previous')",
    "a:has-text('Previous')",
    "button:has-text('‹')",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Next,
    Previous,
}

impl Direction {
    fn candidates(self) -> &'static [&'static str] {
        match self {
            Direction::Next => NEXT_PAGE_CANDIDATES,
            Direction::Previous => PREVIOUS_PAGE_CANDIDATES,
        }
    }

    fn action(self) -> &'static str {
        match self {
            Direction::Next => "next_page",
            Direction::Previous => "previous_page",
        }
    }
}

impl TableEngine<'_> {
    /// Clicks the "next page" control if there is a usable one.
    ///
    /// Returns `Ok(false)` when no control is present or it is disabled.
    pub async fn next_page(&self, locator: Option<&str>) -> Result<bool> {
        self.turn_page(Direction::Next, locator).await
    }

    pub async fn previous_page(&self, locator: Option<&str>) -> Result<bool> {
        self.turn_page(Direction::Previous, locator).await
    }

    /// Whether a usable "next page" control is present
    pub async fn has_next_page(&self, locator: Option<&str>) -> Result<bool> {
        Ok(self.find_control(Direction::Next, locator).await?.is_some())
    }

    async fn turn_page(&self, direction: Direction, locator: Option<&str>) -> Result<bool> {
        let Some((control, selector)) = self.find_control(direction, locator).await? else {
            debug!(action = direction.action(), "No usable pagination control");
            return Ok(false);
        };

        let options = ClickOptions::new(self.engine.config().default_timeout_ms);
        if let Err(e) = self.engine.driver().click(&selector, &options).await {
            return Err(self
                .engine
                .not_interactable(&control, direction.action(), e)
                .await);
        }
        debug!(action = direction.action(), control = %control, "Turned page");
        Ok(true)
    }

    /// Explicit locator (waited for up to the probe timeout) or the first
    /// usable sniffed candidate.
    async fn find_control(
        &self,
        direction: Direction,
        locator: Option<&str>,
    ) -> Result<Option<(String, Selector)>> {
        if let Some(locator) = locator {
            let probe_ms = self.engine.config().probe_timeout_ms;
            return match self.engine.resolve(locator, &[], Some(probe_ms)).await {
                Ok(handle) if self.is_usable(handle.selector()).await? => {
                    Ok(Some((locator.to_string(), handle.selector().clone())))
                }
                Ok(_) => Ok(None),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            };
        }

        for candidate in direction.candidates() {
            let parsed = locator::parse_with(candidate, self.engine.config().strategies)?;
            let selector = Selector::from_locator(&parsed);
            if self.engine.driver().count(&selector).await? == 0 {
                continue;
            }
            if self.is_usable(&selector).await? {
                debug!(action = direction.action(), candidate, "Found pagination control");
                return Ok(Some((candidate.to_string(), selector)));
            }
            debug!(candidate, "Pagination control present but disabled");
        }
        Ok(None)
    }

    /// Visible, enabled, and not marked disabled via ARIA or class
    async fn is_usable(&self, selector: &Selector) -> Result<bool> {
        let driver = self.engine.driver();
        if !driver.is_visible(selector).await? || !driver.is_enabled(selector).await? {
            return Ok(false);
        }
        if driver
            .get_attribute(selector, "aria-disabled")
            .await?
            .is_some_and(|v| v == "true")
        {
            return Ok(false);
        }
        let class = driver.get_attribute(selector, "class").await?.unwrap_or_default();
        Ok(!class.split_whitespace().any(|c| c == "disabled"))
    }
}
