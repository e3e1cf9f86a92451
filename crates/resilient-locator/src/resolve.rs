// Fallback resolution chain
//
// Every operation in the crate funnels through `Engine::resolve`. Candidates
// are tried strictly in order, primary first, and each one gets the full
// timeout rather than a share of it. The first candidate that reaches the
// awaited state wins; if none does, the error carries the whole chain.

use crate::driver::{ElementState, Selector};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::locator;
use tracing::{debug, warn};

/// An element resolved in the current document.
///
/// Handles are never cached: each engine operation resolves afresh, so a
/// handle is only meaningful for the operation that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    locator: String,
    selector: Selector,
}

impl ElementHandle {
    /// The candidate locator string that matched
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Driver selector the candidate was compiled to
    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl Engine {
    /// Resolves the first visible candidate among `[primary] + fallbacks`.
    ///
    /// `timeout_ms` applies to each candidate in full; `None` uses the
    /// configured default.
    ///
    /// # Errors
    ///
    /// Returns `Error::ElementNotFound` when no candidate becomes visible, or
    /// `Error::InvalidLocator` when not a single candidate parses.
    pub async fn resolve(
        &self,
        primary: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
    ) -> Result<ElementHandle> {
        self.resolve_with_state(primary, fallbacks, ElementState::Visible, timeout_ms)
            .await
    }

    /// Resolves the first candidate that reaches `state`
    pub async fn resolve_with_state(
        &self,
        primary: &str,
        fallbacks: &[&str],
        state: ElementState,
        timeout_ms: Option<u64>,
    ) -> Result<ElementHandle> {
        let timeout_ms = self.timeout(timeout_ms);
        let candidates = std::iter::once(primary).chain(fallbacks.iter().copied());
        let total = fallbacks.len() + 1;
        let mut parse_error = None;
        let mut parsed_any = false;

        for (index, candidate) in candidates.enumerate() {
            debug!(
                locator = candidate,
                attempt = index + 1,
                total,
                %state,
                timeout_ms,
                "Trying locator"
            );

            let parsed = match locator::parse_with(candidate, self.config().strategies) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(locator = candidate, error = %e, "Skipping unparseable locator");
                    parse_error = Some(e);
                    continue;
                }
            };
            parsed_any = true;
            let selector = Selector::from_locator(&parsed);

            match self.driver().wait_for(&selector, state, timeout_ms).await {
                Ok(()) => {
                    if index > 0 {
                        warn!(
                            primary,
                            resolved = candidate,
                            "Primary locator failed, resolved via fallback"
                        );
                    } else {
                        debug!(locator = candidate, "Resolved");
                    }
                    return Ok(ElementHandle {
                        locator: candidate.to_string(),
                        selector,
                    });
                }
                Err(e) => {
                    debug!(locator = candidate, error = %e, "Locator did not resolve");
                }
            }
        }

        // Nothing was ever looked up, so "not found" would be misleading
        if let (false, Some(e)) = (parsed_any, parse_error) {
            return Err(e);
        }

        Err(Error::ElementNotFound {
            primary: primary.to_string(),
            fallbacks: fallbacks.iter().map(|f| f.to_string()).collect(),
            timeout_ms,
            page_url: self.page_url().await,
        })
    }
}
