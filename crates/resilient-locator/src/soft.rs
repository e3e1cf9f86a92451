// Soft verification
//
// Soft checks run exactly the same probes as the hard verifications in
// `verify.rs` but never return an error. Every call counts as one attempt on
// the caller-owned collector; a failure appends a structured record. Turning
// the collected failures into a single error is the collector's job
// (`verify` / `into_result`), never the engine's.

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::verify::{Mismatch, Probe, TextMatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One failed soft check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftFailure {
    pub locator: String,
    /// Name of the check, e.g. `verify_text`
    pub verification_type: String,
    pub expected: String,
    pub actual: String,
    pub message: String,
    pub page_url: String,
    pub timestamp: DateTime<Utc>,
    /// Set for text checks only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<bool>,
    /// Set for text checks only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
}

/// Pass/fail tally of a collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

/// Caller-owned accumulator for soft verification results.
///
/// Create one per test and pass it by `&mut` to the `soft_verify_*` methods.
///
/// # Example
///
/// ```ignore
/// let mut soft = SoftAssertions::new();
/// engine.soft_verify_text(&mut soft, "#title", &[], "Checkout", TextMatch::exact(), None).await;
/// engine.soft_verify_enabled(&mut soft, "#pay", &[], None, None).await;
/// soft.verify()?;
/// ```
#[derive(Debug, Default, Clone)]
pub struct SoftAssertions {
    attempt_count: usize,
    failures: Vec<SoftFailure>,
}

impl SoftAssertions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of soft checks run against this collector
    pub fn attempt_count(&self) -> usize {
        self.attempt_count
    }

    pub fn failures(&self) -> &[SoftFailure] {
        &self.failures
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> SoftSummary {
        SoftSummary {
            total: self.attempt_count,
            passed: self.attempt_count.saturating_sub(self.failures.len()),
            failed: self.failures.len(),
        }
    }

    /// Records a passing check
    pub fn record_pass(&mut self) {
        self.attempt_count += 1;
    }

    /// Records a failing check
    pub fn record_failure(&mut self, failure: SoftFailure) {
        self.attempt_count += 1;
        self.failures.push(failure);
    }

    /// Resets the collector for reuse
    pub fn clear(&mut self) {
        self.attempt_count = 0;
        self.failures.clear();
    }

    /// Fails with every collected failure if there is at least one
    pub fn verify(&self) -> std::result::Result<(), SoftAssertionError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(SoftAssertionError {
                attempts: self.attempt_count,
                failures: self.failures.clone(),
            })
        }
    }

    /// Like `verify`, folded into the crate error as `Error::Assertion`
    pub fn into_result(self) -> Result<()> {
        self.verify()
            .map_err(|e| Error::Assertion(e.to_string()))
    }

    /// Failure records as a JSON array
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.failures)?)
    }
}

/// Aggregate of all soft failures in a collector
#[derive(Debug, Clone)]
pub struct SoftAssertionError {
    pub attempts: usize,
    pub failures: Vec<SoftFailure>,
}

impl fmt::Display for SoftAssertionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} of {} soft assertion(s) failed:",
            self.failures.len(),
            self.attempts
        )?;
        for (i, failure) in self.failures.iter().enumerate() {
            writeln!(f, "  {}. {} (page: {})", i + 1, failure.message, failure.page_url)?;
        }
        Ok(())
    }
}

impl std::error::Error for SoftAssertionError {}

impl Engine {
    /// Folds a probe outcome into the collector; returns whether it passed.
    ///
    /// `text_match` is recorded on failures that never produced a mismatch,
    /// so text checks keep their flags even when the element was missing.
    #[allow(clippy::too_many_arguments)]
    async fn record(
        &self,
        soft: &mut SoftAssertions,
        verification_type: &'static str,
        locator: &str,
        expected: &str,
        text_match: Option<TextMatch>,
        message: Option<&str>,
        probe: Probe,
    ) -> bool {
        let mismatch = match probe {
            Ok(None) => {
                soft.record_pass();
                return true;
            }
            Ok(Some(mismatch)) => mismatch,
            // Errors are data here as well: the check failed to complete.
            Err(e) => Mismatch {
                verification_type,
                locator: locator.to_string(),
                expected: expected.to_string(),
                actual: format!("error: {}", e),
                text_match,
            },
        };

        let failure = SoftFailure {
            locator: mismatch.locator.clone(),
            verification_type: verification_type.to_string(),
            expected: mismatch.expected.clone(),
            actual: mismatch.actual.clone(),
            message: mismatch.message(message),
            page_url: self.page_url().await,
            timestamp: Utc::now(),
            exact: mismatch.text_match.map(|m| m.exact),
            case_sensitive: mismatch.text_match.map(|m| m.case_sensitive),
        };
        tracing::info!(
            locator = %failure.locator,
            verification_type,
            message = %failure.message,
            "Soft assertion failed"
        );
        soft.record_failure(failure);
        false
    }

    pub async fn soft_verify_exists(
        &self,
        soft: &mut SoftAssertions,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> bool {
        let probe = self.probe_exists(locator, fallbacks, timeout_ms).await;
        self.record(
            soft,
            "verify_exists",
            locator,
            "element attached",
            None,
            message,
            probe,
        )
        .await
    }

    pub async fn soft_verify_not_exists(
        &self,
        soft: &mut SoftAssertions,
        locator: &str,
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> bool {
        let probe = self.probe_not_exists(locator, timeout_ms).await;
        self.record(
            soft,
            "verify_not_exists",
            locator,
            "no matching element",
            None,
            message,
            probe,
        )
        .await
    }

    pub async fn soft_verify_visible(
        &self,
        soft: &mut SoftAssertions,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> bool {
        let probe = self.probe_visible(locator, fallbacks, timeout_ms).await;
        self.record(
            soft,
            "verify_visible",
            locator,
            "element visible",
            None,
            message,
            probe,
        )
        .await
    }

    pub async fn soft_verify_enabled(
        &self,
        soft: &mut SoftAssertions,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> bool {
        let probe = self.probe_enabled(locator, fallbacks, true, timeout_ms).await;
        self.record(
            soft,
            "verify_enabled",
            locator,
            "enabled",
            None,
            message,
            probe,
        )
        .await
    }

    pub async fn soft_verify_disabled(
        &self,
        soft: &mut SoftAssertions,
        locator: &str,
        fallbacks: &[&str],
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> bool {
        let probe = self.probe_enabled(locator, fallbacks, false, timeout_ms).await;
        self.record(
            soft,
            "verify_disabled",
            locator,
            "disabled",
            None,
            message,
            probe,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn soft_verify_text(
        &self,
        soft: &mut SoftAssertions,
        locator: &str,
        fallbacks: &[&str],
        expected: &str,
        mode: TextMatch,
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> bool {
        let probe = self
            .probe_text(locator, fallbacks, expected, mode, timeout_ms)
            .await;
        let expected = format!("'{}'", expected);
        self.record(
            soft,
            "verify_text",
            locator,
            &expected,
            Some(mode),
            message,
            probe,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn soft_verify_attribute(
        &self,
        soft: &mut SoftAssertions,
        locator: &str,
        fallbacks: &[&str],
        name: &str,
        expected: &str,
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> bool {
        let probe = self
            .probe_attribute(locator, fallbacks, name, expected, timeout_ms)
            .await;
        let expected = format!("{}='{}'", name, expected);
        self.record(
            soft,
            "verify_attribute",
            locator,
            &expected,
            None,
            message,
            probe,
        )
        .await
    }

    pub async fn soft_verify_value(
        &self,
        soft: &mut SoftAssertions,
        locator: &str,
        fallbacks: &[&str],
        expected: &str,
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> bool {
        let probe = self.probe_value(locator, fallbacks, expected, timeout_ms).await;
        let expected = format!("value '{}'", expected);
        self.record(
            soft,
            "verify_value",
            locator,
            &expected,
            None,
            message,
            probe,
        )
        .await
    }

    pub async fn soft_verify_count(
        &self,
        soft: &mut SoftAssertions,
        locator: &str,
        expected: usize,
        timeout_ms: Option<u64>,
        message: Option<&str>,
    ) -> bool {
        let probe = self.probe_count(locator, expected, timeout_ms).await;
        let expected = format!("{} element(s)", expected);
        self.record(
            soft,
            "verify_count",
            locator,
            &expected,
            None,
            message,
            probe,
        )
        .await
    }
}
