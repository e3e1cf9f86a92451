// Backoff - delay schedule shared by every retry loop in the crate
//
// Delays start at `initial` and double on each retry. Jitter is opt-in and
// proportional: a ratio of 0.25 scales each delay by a random factor in
// [0.75, 1.25]. The interaction retry controller uses the plain doubling
// schedule; the general-purpose `retry_with_backoff` may enable jitter.

use crate::error::{Error, Result};
use rand::Rng;
use std::time::Duration;

/// Exponential backoff schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    initial: Duration,
    factor: f64,
    jitter: f64,
    max_delay: Option<Duration>,
}

impl Backoff {
    /// Doubling schedule without jitter or cap
    pub fn doubling(initial: Duration) -> Self {
        Self {
            initial,
            factor: 2.0,
            jitter: 0.0,
            max_delay: None,
        }
    }

    /// Doubling schedule from an initial delay in seconds
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if the delay is negative, not finite,
    /// or too large to represent as a `Duration`.
    pub fn from_secs_f64(initial_secs: f64) -> Result<Self> {
        if !initial_secs.is_finite() || initial_secs < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "initial_delay must be >= 0, got {}",
                initial_secs
            )));
        }
        let initial = Duration::try_from_secs_f64(initial_secs).map_err(|_| {
            Error::InvalidArgument(format!("initial_delay out of range: {}", initial_secs))
        })?;
        Ok(Self::doubling(initial))
    }

    /// Enables proportional jitter; the ratio is clamped to `[0, 1]`
    pub fn with_jitter(mut self, ratio: f64) -> Self {
        self.jitter = if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    /// Caps every computed delay
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    pub fn initial(&self) -> Duration {
        self.initial
    }

    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Delay before retry number `retry` (zero-based), without jitter
    pub fn base_delay(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.initial.as_secs_f64() * self.factor.powi(exponent);
        let delay = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    /// Delay before retry number `retry` (zero-based), with jitter applied
    pub fn delay(&self, retry: u32) -> Duration {
        let base = self.base_delay(retry);
        if self.jitter == 0.0 || base.is_zero() {
            return base;
        }
        let factor = 1.0 + rand::thread_rng().gen_range(-self.jitter..=self.jitter);
        let jittered = Duration::try_from_secs_f64(base.as_secs_f64() * factor.max(0.0))
            .unwrap_or(Duration::MAX);
        match self.max_delay {
            Some(cap) => jittered.min(cap),
            None => jittered,
        }
    }

    /// Infinite iterator over successive delays
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0u32..).map(move |retry| self.delay(retry))
    }
}
