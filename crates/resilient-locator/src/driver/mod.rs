// Driver - automation capability surface consumed by the engine
//
// The engine never talks to a browser directly. Everything it needs - state
// waits, actions, reads, counts, page-level waits - goes through the Driver
// trait, which has one production binding (Playwright, behind the
// `playwright` feature) and one scripted test double (MockDriver, behind the
// `mock` feature).
//
// Drivers return `Error::Timeout` when a wait exceeds its budget and
// `Error::Driver` for any other adapter failure. The engine decides how those
// map onto ElementNotFound / ElementNotInteractable.

#[cfg(any(test, feature = "mock"))]
pub mod mock;
#[cfg(feature = "playwright")]
pub mod playwright;
pub mod selector;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockDom, MockDriver, MockElement};
#[cfg(feature = "playwright")]
pub use playwright::PlaywrightDriver;
pub use selector::{Selector, SelectorPart};

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element state a driver can wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ElementState::Visible => "visible",
            ElementState::Hidden => "hidden",
            ElementState::Attached => "attached",
            ElementState::Detached => "detached",
        })
    }
}

/// Page-level load states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadState {
    #[serde(rename = "load")]
    Load,
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    #[serde(rename = "networkidle")]
    NetworkIdle,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadState::Load => "load",
            LoadState::DomContentLoaded => "domcontentloaded",
            LoadState::NetworkIdle => "networkidle",
        })
    }
}

/// Mouse button for click actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    /// Left mouse button (default)
    #[default]
    Left,
    Right,
    Middle,
}

/// Position relative to the top-left corner of the element's padding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Element bounding box in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Whether a position relative to the box's corner falls inside it
    pub fn contains_offset(&self, position: Position) -> bool {
        position.x >= 0.0
            && position.y >= 0.0
            && position.x <= self.width
            && position.y <= self.height
    }
}

/// Options for click-style actions
#[derive(Debug, Clone, PartialEq)]
pub struct ClickOptions {
    pub button: MouseButton,
    pub click_count: u32,
    pub position: Option<Position>,
    pub timeout_ms: u64,
}

impl ClickOptions {
    /// Single left click with the given timeout
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            button: MouseButton::Left,
            click_count: 1,
            position: None,
            timeout_ms,
        }
    }

    pub fn button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

/// Which `<option>` to select
///
/// At least one of value, label or index must be set. When several are set
/// the driver prefers value, then label, then index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectBy {
    pub value: Option<String>,
    pub label: Option<String>,
    pub index: Option<usize>,
}

impl SelectBy {
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn index(index: usize) -> Self {
        Self {
            index: Some(index),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.label.is_none() && self.index.is_none()
    }

    /// Rejects an empty selection before any driver work happens
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::InvalidArgument(
                "select_option requires at least one of value, label or index".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for SelectBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(value) = &self.value {
            write!(f, "value={}", value)
        } else if let Some(label) = &self.label {
            write!(f, "label={}", label)
        } else if let Some(index) = self.index {
            write!(f, "index={}", index)
        } else {
            f.write_str("<none>")
        }
    }
}

/// Automation driver capability surface.
///
/// Element-level methods act on the first element matching the selector.
/// `count` reports all matches.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Waits until the selector reaches `state`, or fails with `Error::Timeout`
    async fn wait_for(&self, selector: &Selector, state: ElementState, timeout_ms: u64)
    -> Result<()>;

    async fn click(&self, selector: &Selector, options: &ClickOptions) -> Result<()>;

    async fn double_click(&self, selector: &Selector, options: &ClickOptions) -> Result<()>;

    async fn fill(&self, selector: &Selector, text: &str, timeout_ms: u64) -> Result<()>;

    /// Returns the values of the selected options
    async fn select_option(
        &self,
        selector: &Selector,
        option: &SelectBy,
        timeout_ms: u64,
    ) -> Result<Vec<String>>;

    async fn hover(&self, selector: &Selector, timeout_ms: u64) -> Result<()>;

    async fn press(&self, selector: &Selector, key: &str, timeout_ms: u64) -> Result<()>;

    async fn set_checked(&self, selector: &Selector, checked: bool, timeout_ms: u64)
    -> Result<()>;

    async fn text_content(&self, selector: &Selector) -> Result<Option<String>>;

    async fn inner_text(&self, selector: &Selector) -> Result<String>;

    async fn get_attribute(&self, selector: &Selector, name: &str) -> Result<Option<String>>;

    async fn input_value(&self, selector: &Selector) -> Result<String>;

    async fn bounding_box(&self, selector: &Selector) -> Result<Option<BoundingBox>>;

    async fn is_visible(&self, selector: &Selector) -> Result<bool>;

    async fn is_enabled(&self, selector: &Selector) -> Result<bool>;

    async fn is_checked(&self, selector: &Selector) -> Result<bool>;

    async fn is_editable(&self, selector: &Selector) -> Result<bool>;

    /// Number of elements currently matching the selector
    async fn count(&self, selector: &Selector) -> Result<usize>;

    async fn wait_for_load_state(&self, state: LoadState, timeout_ms: u64) -> Result<()>;

    /// Evaluates a script in the page and returns its JSON result
    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value>;

    /// Current page URL
    async fn url(&self) -> Result<String>;
}
