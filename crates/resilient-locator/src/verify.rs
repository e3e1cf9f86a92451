// Verification layer - hard checks
//
// Each check is implemented once as a probe that reports either success or a
// structured mismatch (expected vs actual). Hard verifications turn a
// mismatch into `Error::Assertion`; the soft variants in `soft.rs` record the
// same mismatch in a collector instead.

use crate::driver::{ElementState, Selector};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::locator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Polling interval for checks that wait for a value to settle
const CHECK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Text comparison mode: exact or substring, case-sensitive or not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMatch {
    pub exact: bool,
    pub case_sensitive: bool,
}

impl Default for TextMatch {
    fn default() -> Self {
        Self::exact()
    }
}

impl TextMatch {
    /// Whole-string, case-sensitive comparison
    pub fn exact() -> Self {
        Self {
            exact: true,
            case_sensitive: true,
        }
    }

    /// Substring, case-sensitive comparison
    pub fn contains() -> Self {
        Self {
            exact: false,
            case_sensitive: true,
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    /// Compares `actual` against `expected` under this mode.
    pub fn matches(&self, actual: &str, expected: &str) -> bool {
        let (actual, expected) = if self.case_sensitive {
            (actual.to_string(), expected.to_string())
        } else {
            (actual.to_lowercase(), expected.to_lowercase())
        };
        if self.exact {
            actual == expected
        } else {
            actual.contains(&expected)
        }
    }
}

impl fmt::Display for TextMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.exact { "exact" } else { "contains" };
        let case = if self.case_sensitive {
            "case-sensitive"
        } else {
            "case-insensitive"
        };
        write!(f, "{}, {}", mode, case)
    }
}

/// A failed check, before it is raised or recorded
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Mismatch {
    pub verification_type: &'static str,
    pub locator: String,
    pub expected: String,
    pub actual: String,
    pub text_match: Option<TextMatch>,
}

impl Mismatch {
    fn new(
        verification_type: &'static str,
        locator: &str,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            verification_type,
            locator: locator.to_string(),
            expected: expected.into(),
            actual: actual.into(),
            text_match: None,
        }
    }

    /// Caller message if given, else a generated one; locator, expected and
    /// actual are always embedded.
    pub fn message(&self, custom: Option<&str>) -> String {
        let detail = format!(
            "locator '{}': expected {}, actual {}",
            self.locator, self.expected, self.actual
        );
        match (custom, self.text_match) {
            (Some(custom), _) => format!("{} ({})", custom, detail),
            (None, Some(mode)) => {
                format!("{} failed [{}] for {}", self.verification_type, mode, detail)
            }
            (None, None) => format!("{} failed for {}", self.verification_type, detail),
        }
    }
}

/// Outcome of a probe: `Ok(None)` passed, `Ok(Some(_))` mismatched, `Err`
/// anything that is neither (driver failures, bad arguments).
pub(crate) type Probe = Result<Option<Mismatch>>;

fn raise(probe: Probe, message: Option<&str>) -> Result<()> {
    match probe? {
        None => Ok(()),
        Some(mismatch) => {
            let message = mismatch.message(message);
            tracing::debug!(%message, "Verification failed");
            Err(Error::Assertion(message))
        }
    }
}

fn not_found_actual(timeout_ms: u64) -> String {
    format!("not found within {}ms", timeout_ms)
}

impl Engine {
    /// Polls `check` until it yields true or the budget runs out
    async fn poll_until<F, Fut>(&self, timeout_ms: u64, mut check: F) -> Result<bool>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if check().await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(CHECK_POLL_INTERVAL).await;
        }
    }

    /// Resolves for a check; not-found becomes a mismatch
    async fn resolve_for_check(
        &self,
        verification_type: &'static str,
        locator: &str,
        fallbacks: &[&str],
        state: ElementState,
        timeout_ms: u64,
    ) -> Result<std::result::Result<Selector, Mismatch>> {
        match self
            .resolve_with_state(locator, fallbacks, state, Some(timeout_ms))
            .await
        {
            Ok(handle) => Ok(Ok(handle.selector().clone())),
            Err(e) if e.is_not_found() => Ok(Err(Mismatch::new(
                verification_type,
                locator,
                format!("element {}", state),
                not_found_actual(timeout_ms),
            ))),
            Err(e) => Err(e),
        }
    }

    pub(crate) async fn probe_exists(
        &self,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
    ) -> Probe {
        let timeout_ms = self.timeout(timeout_ms);
        Ok(self
            .resolve_for_check(
                "verify_exists",
                locator,
                fallbacks,
                ElementState::Attached,
                timeout_ms,
            )
            .await?
            .err())
    }

    pub(crate) async fn probe_not_exists(&self, locator: &str, timeout_ms: Option<u64>) -> Probe {
        let timeout_ms = timeout_ms.unwrap_or(self.config().negative_timeout_ms);
        let parsed = locator::parse_with(locator, self.config().strategies)?;
        let selector = Selector::from_locator(&parsed);
        match self
            .driver()
            .wait_for(&selector, ElementState::Detached, timeout_ms)
            .await
        {
            Ok(()) => Ok(None),
            Err(Error::Timeout { .. }) => {
                let present = match self.driver().count(&selector).await {
                    Ok(count) => format!("{} element(s)", count),
                    Err(e) => {
                        tracing::debug!(locator, error = %e, "Could not count lingering elements");
                        "an unknown number of element(s)".to_string()
                    }
                };
                Ok(Some(Mismatch::new(
                    "verify_not_exists",
                    locator,
                    "no matching element",
                    format!("{} still present after {}ms", present, timeout_ms),
                )))
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) async fn probe_visible(
        &self,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
    ) -> Probe {
        let timeout_ms = self.timeout(timeout_ms);
        Ok(self
            .resolve_for_check(
                "verify_visible",
                locator,
                fallbacks,
                ElementState::Visible,
                timeout_ms,
            )
            .await?
            .err())
    }

    pub(crate) async fn probe_enabled(
        &self,
        locator: &str,
        fallbacks: &[&str],
        expect_enabled: bool,
        timeout_ms: Option<u64>,
    ) -> Probe {
        let (verification_type, timeout_ms) = if expect_enabled {
            ("verify_enabled", self.timeout(timeout_ms))
        } else {
            (
                "verify_disabled",
                timeout_ms.unwrap_or(self.config().negative_timeout_ms),
            )
        };
        let selector = match self
            .resolve_for_check(
                verification_type,
                locator,
                fallbacks,
                ElementState::Visible,
                timeout_ms,
            )
            .await?
        {
            Ok(selector) => selector,
            Err(mismatch) => return Ok(Some(mismatch)),
        };

        let enabled = self.driver().is_enabled(&selector).await?;
        if enabled == expect_enabled {
            return Ok(None);
        }
        let describe = |enabled: bool| if enabled { "enabled" } else { "disabled" };
        Ok(Some(Mismatch::new(
            verification_type,
            locator,
            describe(expect_enabled),
            describe(enabled),
        )))
    }

    pub(crate) async fn probe_text(
        &self,
        locator: &str,
        fallbacks: &[&str],
        expected: &str,
        mode: TextMatch,
        timeout_ms: Option<u64>,
    ) -> Probe {
        let timeout_ms = self.timeout(timeout_ms);
        let selector = match self
            .resolve_for_check("verify_text", locator, fallbacks, ElementState::Visible, timeout_ms)
            .await?
        {
            Ok(selector) => selector,
            Err(mut mismatch) => {
                mismatch.expected = format!("text '{}'", expected);
                mismatch.text_match = Some(mode);
                return Ok(Some(mismatch));
            }
        };

        let actual = self
            .driver()
            .text_content(&selector)
            .await?
            .unwrap_or_default();
        if mode.matches(&actual, expected) {
            return Ok(None);
        }
        let mut mismatch = Mismatch::new(
            "verify_text",
            locator,
            format!("'{}'", expected),
            format!("'{}'", actual),
        );
        mismatch.text_match = Some(mode);
        Ok(Some(mismatch))
    }

    pub(crate) async fn probe_attribute(
        &self,
        locator: &str,
        fallbacks: &[&str],
        name: &str,
        expected: &str,
        timeout_ms: Option<u64>,
    ) -> Probe {
        let timeout_ms = self.timeout(timeout_ms);
        let selector = match self
            .resolve_for_check(
                "verify_attribute",
                locator,
                fallbacks,
                ElementState::Attached,
                timeout_ms,
            )
            .await?
        {
            Ok(selector) => selector,
            Err(mismatch) => return Ok(Some(mismatch)),
        };

        match self.driver().get_attribute(&selector, name).await? {
            Some(actual) if actual == expected => Ok(None),
            Some(actual) => Ok(Some(Mismatch::new(
                "verify_attribute",
                locator,
                format!("{}='{}'", name, expected),
                format!("{}='{}'", name, actual),
            ))),
            None => Ok(Some(Mismatch::new(
                "verify_attribute",
                locator,
                format!("{}='{}'", name, expected),
                format!("no '{}' attribute", name),
            ))),
        }
    }

    pub(crate) async fn probe_value(
        &self,
        locator: &str,
        fallbacks: &[&str],
        expected: &str,
        timeout_ms: Option<u64>,
    ) -> Probe {
        let timeout_ms = self.timeout(timeout_ms);
        let selector = match self
            .resolve_for_check(
                "verify_value",
                locator,
                fallbacks,
                ElementState::Visible,
                timeout_ms,
            )
            .await?
        {
            Ok(selector) => selector,
            Err(mismatch) => return Ok(Some(mismatch)),
        };

        let actual = self.driver().input_value(&selector).await?;
        if actual == expected {
            return Ok(None);
        }
        Ok(Some(Mismatch::new(
            "verify_value",
            locator,
            format!("value '{}'", expected),
            format!("value '{}'", actual),
        )))
    }

    /// Polls the match count until it equals `expected` or the timeout expires
    pub(crate) async fn probe_count(
        &self,
        locator: &str,
        expected: usize,
        timeout_ms: Option<u64>,
    ) -> Probe {
        let timeout_ms = self.timeout(timeout_ms);
        let parsed = locator::parse_with(locator, self.config().strategies)?;
        let selector = Selector::from_locator(&parsed);
        let driver = self.driver().as_ref();
        let selector_ref = &selector;

        let settled = self
            .poll_until(timeout_ms, move || async move {
                let count = driver.count(selector_ref).await?;
                Ok::<_, Error>(count == expected)
            })
            .await?;
        if settled {
            return Ok(None);
        }
        let actual = driver.count(&selector).await?;
        Ok(Some(Mismatch::new(
            "verify_count",
            locator,
            format!("{} element(s)", expected),
            format!("{} element(s)", actual),
        )))
    }

    pub(crate) async fn probe_checked(
        &self,
        locator: &str,
        fallbacks: &[&str],
        expect_checked: bool,
        timeout_ms: Option<u64>,
    ) -> Probe {
        let timeout_ms = self.timeout(timeout_ms);
        let selector = match self
            .resolve_for_check(
                "verify_checked",
                locator,
                fallbacks,
                ElementState::Attached,
                timeout_ms,
            )
            .await?
        {
            Ok(selector) => selector,
            Err(mismatch) => return Ok(Some(mismatch)),
        };

        let checked = self.driver().is_checked(&selector).await?;
        if checked == expect_checked {
            return Ok(None);
        }
        let describe = |checked: bool| if checked { "checked" } else { "unchecked" };
        Ok(Some(Mismatch::new(
            "verify_checked",
            locator,
            describe(expect_checked),
            describe(checked),
        )))
    }

    /// Asserts that some candidate is attached to the document
    pub async fn verify_exists(
        &self,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> Result<()> {
        raise(self.probe_exists(locator, fallbacks, timeout_ms).await, message)
    }

    /// Asserts that nothing matches `locator`; defaults to the negative timeout
    pub async fn verify_not_exists(
        &self,
        locator: &str,
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> Result<()> {
        raise(self.probe_not_exists(locator, timeout_ms).await, message)
    }

    pub async fn verify_visible(
        &self,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> Result<()> {
        raise(self.probe_visible(locator, fallbacks, timeout_ms).await, message)
    }

    pub async fn verify_enabled(
        &self,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> Result<()> {
        raise(
            self.probe_enabled(locator, fallbacks, true, timeout_ms).await,
            message,
        )
    }

    /// Asserts the element is disabled; defaults to the negative timeout
    pub async fn verify_disabled(
        &self,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> Result<()> {
        raise(
            self.probe_enabled(locator, fallbacks, false, timeout_ms).await,
            message,
        )
    }

    /// Compares the element's text content under `mode`
    pub async fn verify_text(
        &self,
        locator: &str,
        fallbacks: &[&str],
        expected: &str,
        mode: TextMatch,
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> Result<()> {
        raise(
            self.probe_text(locator, fallbacks, expected, mode, timeout_ms)
                .await,
            message,
        )
    }

    pub async fn verify_attribute(
        &self,
        locator: &str,
        fallbacks: &[&str],
        name: &str,
        expected: &str,
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> Result<()> {
        raise(
            self.probe_attribute(locator, fallbacks, name, expected, timeout_ms)
                .await,
            message,
        )
    }

    /// Compares an input's current value exactly
    pub async fn verify_value(
        &self,
        locator: &str,
        fallbacks: &[&str],
        expected: &str,
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> Result<()> {
        raise(
            self.probe_value(locator, fallbacks, expected, timeout_ms).await,
            message,
        )
    }

    /// Waits for exactly `expected` matches of `locator`
    pub async fn verify_count(
        &self,
        locator: &str,
        expected: usize,
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> Result<()> {
        raise(self.probe_count(locator, expected, timeout_ms).await, message)
    }

    pub async fn verify_checked(
        &self,
        locator: &str,
        fallbacks: &[&str],
        expect_checked: bool,
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> Result<()> {
        raise(
            self.probe_checked(locator, fallbacks, expect_checked, timeout_ms)
                .await,
            message,
        )
    }
}
