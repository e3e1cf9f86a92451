// MockDriver - scripted in-memory Driver for exercising the engine
//
// Elements are registered against the rendered selector string the engine
// will ask for, e.g. `#grid >> tbody tr >> nth=0`. Every driver call is
// appended to a call log so tests can assert ordering.
//
// Waits poll the fake document until their deadline and fail only once the
// full timeout has elapsed, so tests that run under `tokio::time::pause`
// observe real timeout budgets without wall-clock cost.

use super::{
    BoundingBox, ClickOptions, Driver, ElementState, LoadState, MouseButton, SelectBy, Selector,
};
use crate::error::{Error, Result};
use crate::locator;
use crate::table;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

/// How often a pending `wait_for` re-checks the document
const WAIT_POLL: Duration = Duration::from_millis(10);

/// A fake element
#[derive(Debug, Clone)]
pub struct MockElement {
    pub visible: bool,
    pub enabled: bool,
    pub checked: bool,
    pub editable: bool,
    pub text: String,
    pub value: String,
    pub attributes: HashMap<String, String>,
    pub bounding_box: Option<BoundingBox>,
    /// Number of elements the selector matches
    pub matches: usize,
    /// `(value, label)` pairs for `<select>` elements
    pub options: Vec<(String, String)>,
    /// Visible/attached waits fail this many times before succeeding
    pub absent_for_waits: u32,
    /// Not in the document before this instant
    pub rendered_at: Option<Instant>,
    /// Actions fail this many times before succeeding
    pub failing_actions: u32,
    /// Every action fails with this reason
    pub action_error: Option<String>,
}

impl Default for MockElement {
    fn default() -> Self {
        Self {
            visible: true,
            enabled: true,
            checked: false,
            editable: false,
            text: String::new(),
            value: String::new(),
            attributes: HashMap::new(),
            bounding_box: None,
            matches: 1,
            options: Vec::new(),
            absent_for_waits: 0,
            rendered_at: None,
            failing_actions: 0,
            action_error: None,
        }
    }
}

impl MockElement {
    /// Visible, enabled element with the given text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    pub fn with_matches(mut self, matches: usize) -> Self {
        self.matches = matches;
        self
    }

    pub fn with_options<I, V, L>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (V, L)>,
        V: Into<String>,
        L: Into<String>,
    {
        self.options = options
            .into_iter()
            .map(|(v, l)| (v.into(), l.into()))
            .collect();
        self
    }

    pub fn appearing_after(mut self, waits: u32) -> Self {
        self.absent_for_waits = waits;
        self
    }

    /// Keeps the element out of the document until `delay` has passed
    pub fn rendering_in(mut self, delay: Duration) -> Self {
        self.rendered_at = Some(Instant::now() + delay);
        self
    }

    /// Whether the selector currently matches anything
    pub fn is_attached(&self) -> bool {
        self.matches > 0 && self.rendered_at.is_none_or(|at| Instant::now() >= at)
    }

    pub fn failing_times(mut self, times: u32) -> Self {
        self.failing_actions = times;
        self
    }

    pub fn failing_with(mut self, reason: impl Into<String>) -> Self {
        self.action_error = Some(reason.into());
        self
    }
}

/// Mutable fake document behind a MockDriver
#[derive(Debug, Default)]
pub struct MockDom {
    elements: HashMap<String, MockElement>,
    count_scripts: HashMap<String, VecDeque<usize>>,
    failing_counts: HashSet<String>,
    calls: Vec<String>,
    url: String,
    evaluate_result: serde_json::Value,
    load_state_fails: bool,
}

impl MockDom {
    pub fn insert(&mut self, selector: impl Into<String>, element: MockElement) {
        self.elements.insert(selector.into(), element);
    }

    pub fn remove(&mut self, selector: &str) -> Option<MockElement> {
        self.elements.remove(selector)
    }

    pub fn element(&self, selector: &str) -> Option<&MockElement> {
        self.elements.get(selector)
    }

    pub fn element_mut(&mut self, selector: &str) -> Option<&mut MockElement> {
        self.elements.get_mut(selector)
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Successive `count` calls on `selector` return these values in order.
    /// The last value repeats once the script is exhausted.
    pub fn script_counts(&mut self, selector: impl Into<String>, counts: Vec<usize>) {
        self.count_scripts.insert(selector.into(), counts.into());
    }

    /// Replaces the body (and optional header row) of a table.
    ///
    /// Registers the table, its row set, each row, each row's cell set and
    /// each cell under the selectors the table engine queries.
    pub fn set_table<R, C>(&mut self, table_locator: &str, headers: &[&str], rows: R)
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let table = table_selector(table_locator);
        let prefix = format!("{} >> ", table);
        self.elements.retain(|key, _| !key.starts_with(&prefix));
        self.count_scripts.retain(|key, _| !key.starts_with(&prefix));

        self.elements
            .entry(table.to_string())
            .or_insert_with(MockElement::default);

        if !headers.is_empty() {
            self.insert(
                table::headers_selector(&table).to_string(),
                MockElement::default().with_matches(headers.len()),
            );
            for (col, header) in headers.iter().enumerate() {
                self.insert(
                    table::header_selector(&table, col).to_string(),
                    MockElement::new(*header),
                );
            }
        }

        let mut row_count = 0;
        for (row, cells) in rows.into_iter().enumerate() {
            row_count += 1;
            let row_selector = table::row_selector(&table, row);
            let mut cell_count = 0;
            for (col, text) in cells.into_iter().enumerate() {
                cell_count += 1;
                self.insert(
                    table::cell_selector(&table, row, col).to_string(),
                    MockElement::new(text),
                );
            }
            self.insert(
                table::cells_selector(&row_selector).to_string(),
                MockElement::default().with_matches(cell_count),
            );
            self.insert(row_selector.to_string(), MockElement::default());
        }

        self.insert(
            table::rows_selector(&table).to_string(),
            MockElement::default().with_matches(row_count),
        );
    }

    fn record(&mut self, call: String) {
        tracing::debug!(call = %call, "MockDriver call");
        self.calls.push(call);
    }

    /// Consumes one scripted absence; such a wait fails outright.
    fn scripted_absence(&mut self, key: &str, state: ElementState) -> bool {
        match self.elements.get_mut(key) {
            Some(element)
                if element.absent_for_waits > 0
                    && matches!(state, ElementState::Visible | ElementState::Attached) =>
            {
                element.absent_for_waits -= 1;
                true
            }
            _ => false,
        }
    }

    fn wait_satisfied(&self, key: &str, state: ElementState) -> bool {
        let Some(element) = self.elements.get(key) else {
            return matches!(state, ElementState::Hidden | ElementState::Detached);
        };
        let attached = element.is_attached();
        match state {
            ElementState::Visible => attached && element.visible,
            ElementState::Attached => attached,
            ElementState::Hidden => !(attached && element.visible),
            ElementState::Detached => !attached,
        }
    }

    /// Checks the element is actionable, consuming one scripted failure.
    /// `Ok(false)` means the element does not exist.
    fn actionable(&mut self, key: &str) -> Result<bool> {
        let Some(element) = self.elements.get_mut(key) else {
            return Ok(false);
        };
        if !element.is_attached() || !element.visible {
            return Ok(false);
        }
        if element.failing_actions > 0 {
            element.failing_actions -= 1;
            return Err(Error::Driver(format!(
                "transient failure acting on '{}'",
                key
            )));
        }
        if let Some(reason) = &element.action_error {
            return Err(Error::Driver(reason.clone()));
        }
        if !element.enabled {
            return Err(Error::Driver(format!("element '{}' is disabled", key)));
        }
        Ok(true)
    }

    fn read(&self, key: &str) -> Result<&MockElement> {
        self.elements
            .get(key)
            .filter(|e| e.is_attached())
            .ok_or_else(|| Error::Driver(format!("no element matches selector '{}'", key)))
    }
}

type Handler = Box<dyn FnMut(&mut MockDom) + Send>;

/// Scripted Driver implementation for tests
#[derive(Default)]
pub struct MockDriver {
    dom: Mutex<MockDom>,
    handlers: Mutex<HashMap<String, Handler>>,
}

impl MockDriver {
    pub fn new() -> Self {
        let driver = Self::default();
        driver.dom.lock().url = "https://mock.test/".to_string();
        driver
    }

    /// Registers an element under a locator string or rendered selector
    pub fn insert(&self, selector: impl Into<String>, element: MockElement) {
        self.dom.lock().insert(selector, element);
    }

    pub fn remove(&self, selector: &str) {
        self.dom.lock().remove(selector);
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.dom.lock().set_url(url);
    }

    pub fn set_table<R, C>(&self, table_locator: &str, headers: &[&str], rows: R)
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        self.dom.lock().set_table(table_locator, headers, rows);
    }

    pub fn script_counts(&self, selector: impl Into<String>, counts: Vec<usize>) {
        self.dom.lock().script_counts(selector, counts);
    }

    pub fn set_evaluate_result(&self, value: serde_json::Value) {
        self.dom.lock().evaluate_result = value;
    }

    /// Makes every `count` on `selector` fail with a driver error
    pub fn fail_count(&self, selector: impl Into<String>) {
        self.dom.lock().failing_counts.insert(selector.into());
    }

    /// Makes every `wait_for_load_state` call time out
    pub fn fail_load_state(&self) {
        self.dom.lock().load_state_fails = true;
    }

    /// Runs arbitrary mutations against the fake document
    pub fn with_dom<T>(&self, f: impl FnOnce(&mut MockDom) -> T) -> T {
        f(&mut *self.dom.lock())
    }

    /// Reads a registered element
    pub fn element(&self, selector: &str) -> Option<MockElement> {
        self.dom.lock().element(selector).cloned()
    }

    /// Runs `handler` after every successful click on `selector`
    pub fn on_click(&self, selector: &str, handler: impl FnMut(&mut MockDom) + Send + 'static) {
        self.handlers
            .lock()
            .insert(format!("click:{}", selector), Box::new(handler));
    }

    /// Runs `handler` after every successful double click on `selector`
    pub fn on_double_click(
        &self,
        selector: &str,
        handler: impl FnMut(&mut MockDom) + Send + 'static,
    ) {
        self.handlers
            .lock()
            .insert(format!("double_click:{}", selector), Box::new(handler));
    }

    /// Runs `handler` after every `evaluate` call
    pub fn on_evaluate(&self, handler: impl FnMut(&mut MockDom) + Send + 'static) {
        self.handlers
            .lock()
            .insert("evaluate".to_string(), Box::new(handler));
    }

    /// Every driver call so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.dom.lock().calls.clone()
    }

    /// Number of calls starting with `prefix`
    pub fn call_count(&self, prefix: &str) -> usize {
        self.dom
            .lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn clear_calls(&self) {
        self.dom.lock().calls.clear();
    }

    fn fire(&self, key: &str) {
        let mut handlers = self.handlers.lock();
        if let Some(handler) = handlers.get_mut(key) {
            let mut dom = self.dom.lock();
            handler(&mut *dom);
        }
    }

    /// Shared flow for actions: record, check, mutate, fire handler.
    async fn act(
        &self,
        kind: &str,
        call: String,
        selector: &Selector,
        timeout_ms: u64,
        apply: impl FnOnce(&mut MockElement),
    ) -> Result<()> {
        let key = selector.to_string();
        let found = {
            let mut dom = self.dom.lock();
            dom.record(call);
            let found = dom.actionable(&key)?;
            if found {
                if let Some(element) = dom.element_mut(&key) {
                    apply(element);
                }
            }
            found
        };

        if !found {
            tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
            return Err(Error::timeout(
                kind,
                timeout_ms,
                format!("waiting for '{}' to be actionable", key),
            ));
        }

        self.fire(&format!("{}:{}", kind, key));
        Ok(())
    }
}

fn table_selector(table_locator: &str) -> Selector {
    locator::parse(table_locator)
        .map(|loc| Selector::from_locator(&loc))
        .unwrap_or_else(|_| Selector::css(table_locator))
}

fn describe_click(options: &ClickOptions) -> String {
    let mut suffix = String::new();
    match options.button {
        MouseButton::Left => {}
        MouseButton::Right => suffix.push_str("[right]"),
        MouseButton::Middle => suffix.push_str("[middle]"),
    }
    if let Some(position) = options.position {
        suffix.push_str(&format!("@{},{}", position.x, position.y));
    }
    suffix
}

#[async_trait]
impl Driver for MockDriver {
    async fn wait_for(
        &self,
        selector: &Selector,
        state: ElementState,
        timeout_ms: u64,
    ) -> Result<()> {
        let key = selector.to_string();
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let absent = {
            let mut dom = self.dom.lock();
            dom.record(format!("wait_for({}) {}", state, key));
            dom.scripted_absence(&key, state)
        };

        if absent {
            tokio::time::sleep_until(deadline).await;
        } else {
            loop {
                if self.dom.lock().wait_satisfied(&key, state) {
                    return Ok(());
                }
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                tokio::time::sleep_until((now + WAIT_POLL).min(deadline)).await;
            }
        }

        Err(Error::timeout(
            "wait_for",
            timeout_ms,
            format!("waiting for '{}' to be {}", key, state),
        ))
    }

    async fn click(&self, selector: &Selector, options: &ClickOptions) -> Result<()> {
        let call = format!("click{} {}", describe_click(options), selector);
        self.act("click", call, selector, options.timeout_ms, |_| {})
            .await
    }

    async fn double_click(&self, selector: &Selector, options: &ClickOptions) -> Result<()> {
        let call = format!("double_click{} {}", describe_click(options), selector);
        self.act("double_click", call, selector, options.timeout_ms, |_| {})
            .await
    }

    async fn fill(&self, selector: &Selector, text: &str, timeout_ms: u64) -> Result<()> {
        let call = format!("fill {} = {}", selector, text);
        let text = text.to_string();
        self.act("fill", call, selector, timeout_ms, move |element| {
            element.value = text;
        })
        .await
    }

    async fn select_option(
        &self,
        selector: &Selector,
        option: &SelectBy,
        timeout_ms: u64,
    ) -> Result<Vec<String>> {
        let key = selector.to_string();
        let call = format!("select_option {} {}", key, option);
        let mut chosen: Option<String> = None;
        self.act("select_option", call, selector, timeout_ms, |element| {
            let picked = if let Some(value) = &option.value {
                element.options.iter().find(|(v, _)| v == value)
            } else if let Some(label) = &option.label {
                element.options.iter().find(|(_, l)| l == label)
            } else {
                option.index.and_then(|i| element.options.get(i))
            };
            if let Some((value, _)) = picked {
                element.value = value.clone();
                chosen = Some(value.clone());
            }
        })
        .await?;

        chosen
            .map(|value| vec![value])
            .ok_or_else(|| Error::Driver(format!("no option matching {} in '{}'", option, key)))
    }

    async fn hover(&self, selector: &Selector, timeout_ms: u64) -> Result<()> {
        let call = format!("hover {}", selector);
        self.act("hover", call, selector, timeout_ms, |_| {}).await
    }

    async fn press(&self, selector: &Selector, key: &str, timeout_ms: u64) -> Result<()> {
        let call = format!("press {} {}", selector, key);
        self.act("press", call, selector, timeout_ms, |_| {}).await
    }

    async fn set_checked(
        &self,
        selector: &Selector,
        checked: bool,
        timeout_ms: u64,
    ) -> Result<()> {
        let call = format!("set_checked({}) {}", checked, selector);
        self.act("set_checked", call, selector, timeout_ms, move |element| {
            element.checked = checked;
        })
        .await
    }

    async fn text_content(&self, selector: &Selector) -> Result<Option<String>> {
        let key = selector.to_string();
        let mut dom = self.dom.lock();
        dom.record(format!("text_content {}", key));
        dom.read(&key).map(|e| Some(e.text.clone()))
    }

    async fn inner_text(&self, selector: &Selector) -> Result<String> {
        let key = selector.to_string();
        let mut dom = self.dom.lock();
        dom.record(format!("inner_text {}", key));
        dom.read(&key).map(|e| e.text.clone())
    }

    async fn get_attribute(&self, selector: &Selector, name: &str) -> Result<Option<String>> {
        let key = selector.to_string();
        let mut dom = self.dom.lock();
        dom.record(format!("get_attribute {} {}", key, name));
        dom.read(&key).map(|e| e.attributes.get(name).cloned())
    }

    async fn input_value(&self, selector: &Selector) -> Result<String> {
        let key = selector.to_string();
        let mut dom = self.dom.lock();
        dom.record(format!("input_value {}", key));
        dom.read(&key).map(|e| e.value.clone())
    }

    async fn bounding_box(&self, selector: &Selector) -> Result<Option<BoundingBox>> {
        let key = selector.to_string();
        let mut dom = self.dom.lock();
        dom.record(format!("bounding_box {}", key));
        dom.read(&key).map(|e| e.bounding_box)
    }

    async fn is_visible(&self, selector: &Selector) -> Result<bool> {
        let key = selector.to_string();
        let mut dom = self.dom.lock();
        dom.record(format!("is_visible {}", key));
        Ok(dom
            .element(&key)
            .is_some_and(|e| e.is_attached() && e.visible))
    }

    async fn is_enabled(&self, selector: &Selector) -> Result<bool> {
        let key = selector.to_string();
        let mut dom = self.dom.lock();
        dom.record(format!("is_enabled {}", key));
        dom.read(&key).map(|e| e.enabled)
    }

    async fn is_checked(&self, selector: &Selector) -> Result<bool> {
        let key = selector.to_string();
        let mut dom = self.dom.lock();
        dom.record(format!("is_checked {}", key));
        dom.read(&key).map(|e| e.checked)
    }

    async fn is_editable(&self, selector: &Selector) -> Result<bool> {
        let key = selector.to_string();
        let mut dom = self.dom.lock();
        dom.record(format!("is_editable {}", key));
        dom.read(&key).map(|e| e.editable && e.enabled)
    }

    async fn count(&self, selector: &Selector) -> Result<usize> {
        let key = selector.to_string();
        let mut dom = self.dom.lock();
        dom.record(format!("count {}", key));
        if dom.failing_counts.contains(&key) {
            return Err(Error::Driver(format!("count failed for '{}'", key)));
        }
        if let Some(script) = dom.count_scripts.get_mut(&key) {
            let next = if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().copied()
            };
            return Ok(next.unwrap_or(0));
        }
        Ok(dom
            .element(&key)
            .filter(|e| e.is_attached())
            .map_or(0, |e| e.matches))
    }

    async fn wait_for_load_state(&self, state: LoadState, timeout_ms: u64) -> Result<()> {
        let fails = {
            let mut dom = self.dom.lock();
            dom.record(format!("wait_for_load_state({})", state));
            dom.load_state_fails
        };
        if fails {
            tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
            return Err(Error::timeout(
                "wait_for_load_state",
                timeout_ms,
                format!("page never reached '{}'", state),
            ));
        }
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value> {
        let result = {
            let mut dom = self.dom.lock();
            dom.record(format!("evaluate {}", expression));
            dom.evaluate_result.clone()
        };
        self.fire("evaluate");
        Ok(result)
    }

    async fn url(&self) -> Result<String> {
        Ok(self.dom.lock().url.clone())
    }
}
