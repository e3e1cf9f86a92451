// Table / grid engine
//
// Row and cell addressing over `<table>`-shaped grids. The public API is
// zero-based and maps onto document-order match indices (`nth=`). Nothing is
// cached: every call waits for the table and re-reads the live rows, so a
// TableEngine is a cheap borrowed view over the Engine.

use crate::driver::{ClickOptions, ElementState, LoadState, Selector};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::verify::TextMatch;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Children of a cell that accept text in place
const EDITABLE_CHILD: &str = "input, textarea, [contenteditable]";

/// Scrolls the document to the bottom to trigger lazy loading
const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// Consecutive unchanged measurements that end an infinite-scroll load
const STABLE_SCROLLS: u32 = 3;

/// Direct cells of a row; `th` counts so row headers keep their column
const ROW_CELLS: &str = ":scope > :is(td, th)";

// Rows and cells are addressed by match index in document order, so a table
// split over several `<tbody>` elements numbers its rows continuously.

pub(crate) fn rows_selector(table: &Selector) -> Selector {
    table.child("tbody tr")
}

pub(crate) fn row_selector(table: &Selector, row: usize) -> Selector {
    rows_selector(table).nth(row)
}

pub(crate) fn cells_selector(row: &Selector) -> Selector {
    row.child(ROW_CELLS)
}

pub(crate) fn cell_selector(table: &Selector, row: usize, col: usize) -> Selector {
    cells_selector(&row_selector(table, row)).nth(col)
}

pub(crate) fn headers_selector(table: &Selector) -> Selector {
    table.child("thead th")
}

pub(crate) fn header_selector(table: &Selector, col: usize) -> Selector {
    headers_selector(table).nth(col)
}

pub(crate) fn editor_selector(cell: &Selector) -> Selector {
    cell.child(EDITABLE_CHILD)
}

/// How an infinite-scroll load ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DynamicLoadOutcome {
    /// Row count stopped growing: everything the page will load is loaded
    Complete { rows: usize, scrolls: u32 },
    /// Scroll budget ran out while rows were still arriving
    MaxScrollsReached { rows: usize, scrolls: u32 },
}

impl DynamicLoadOutcome {
    pub fn row_count(&self) -> usize {
        match self {
            DynamicLoadOutcome::Complete { rows, .. }
            | DynamicLoadOutcome::MaxScrollsReached { rows, .. } => *rows,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, DynamicLoadOutcome::Complete { .. })
    }
}

/// Location of a row found by a paginated search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRow {
    /// Zero-based page index, counted from the page the search started on
    pub page: usize,
    pub row: usize,
}

/// Table operations borrowed from an Engine
#[derive(Debug, Clone, Copy)]
pub struct TableEngine<'a> {
    pub(crate) engine: &'a Engine,
    timeout_ms: Option<u64>,
}

impl<'a> TableEngine<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        Self {
            engine,
            timeout_ms: None,
        }
    }

    /// Overrides how long to wait for the table to become visible
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    fn timeout(&self) -> u64 {
        self.engine.timeout(self.timeout_ms)
    }

    /// Waits for the table and returns its selector
    async fn table(&self, table: &str) -> Result<Selector> {
        let handle = self.engine.resolve(table, &[], Some(self.timeout())).await?;
        Ok(handle.selector().clone())
    }

    async fn row_count_of(&self, table: &Selector) -> Result<usize> {
        self.engine.driver().count(&rows_selector(table)).await
    }

    async fn cell_count(&self, table: &Selector, row: usize) -> Result<usize> {
        self.engine
            .driver()
            .count(&cells_selector(&row_selector(table, row)))
            .await
    }

    async fn text_of(&self, selector: &Selector) -> Result<String> {
        let text = self.engine.driver().text_content(selector).await?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    /// Trimmed text of one cell, or `None` if the row is too short
    async fn cell_text(&self, table: &Selector, row: usize, col: usize) -> Result<Option<String>> {
        if self.cell_count(table, row).await? <= col {
            return Ok(None);
        }
        self.text_of(&cell_selector(table, row, col)).await.map(Some)
    }

    /// Selector of an existing cell, or ElementNotFound naming the table
    async fn existing_cell(
        &self,
        table_locator: &str,
        table: &Selector,
        row: usize,
        col: usize,
    ) -> Result<Selector> {
        let cell = cell_selector(table, row, col);
        if self.engine.driver().count(&cell).await? == 0 {
            return Err(Error::ElementNotFound {
                primary: format!("{} cell ({}, {})", table_locator, row, col),
                fallbacks: Vec::new(),
                timeout_ms: self.timeout(),
                page_url: self.engine.page_url().await,
            });
        }
        Ok(cell)
    }

    /// Index of the first row whose trimmed `key_column` text equals
    /// `key_value` exactly (case-sensitive).
    ///
    /// Rows too short to have `key_column` are skipped.
    ///
    /// # Errors
    ///
    /// Returns `Error::ElementNotFound` naming the table if no row matches.
    pub async fn find_row_by_key(
        &self,
        table: &str,
        key_column: usize,
        key_value: &str,
    ) -> Result<usize> {
        let selector = self.table(table).await?;
        let rows = self.row_count_of(&selector).await?;
        debug!(table, rows, key_column, key_value, "Searching rows by key");

        for row in 0..rows {
            match self.cell_text(&selector, row, key_column).await? {
                Some(text) if text == key_value => {
                    debug!(table, row, "Found row by key");
                    return Ok(row);
                }
                Some(_) => {}
                None => debug!(table, row, key_column, "Row has too few cells, skipping"),
            }
        }

        Err(Error::ElementNotFound {
            primary: format!("{} row where column {} == '{}'", table, key_column, key_value),
            fallbacks: Vec::new(),
            timeout_ms: self.timeout(),
            page_url: self.engine.page_url().await,
        })
    }

    /// First row where every `(column, value)` pair matches exactly
    pub async fn find_row_by_values(
        &self,
        table: &str,
        criteria: &[(usize, &str)],
    ) -> Result<usize> {
        if criteria.is_empty() {
            return Err(Error::InvalidArgument(
                "find_row_by_values requires at least one (column, value) pair".to_string(),
            ));
        }
        let selector = self.table(table).await?;
        let rows = self.row_count_of(&selector).await?;

        'rows: for row in 0..rows {
            for (col, expected) in criteria {
                match self.cell_text(&selector, row, *col).await? {
                    Some(text) if text == *expected => {}
                    _ => continue 'rows,
                }
            }
            return Ok(row);
        }

        let wanted: Vec<String> = criteria
            .iter()
            .map(|(col, value)| format!("{}='{}'", col, value))
            .collect();
        Err(Error::ElementNotFound {
            primary: format!("{} row where {}", table, wanted.join(" and ")),
            fallbacks: Vec::new(),
            timeout_ms: self.timeout(),
            page_url: self.engine.page_url().await,
        })
    }

    /// Trimmed text of a cell
    pub async fn get_cell_value(&self, table: &str, row: usize, col: usize) -> Result<String> {
        let selector = self.table(table).await?;
        let cell = self.existing_cell(table, &selector, row, col).await?;
        self.text_of(&cell).await
    }

    pub async fn click_cell(&self, table: &str, row: usize, col: usize) -> Result<()> {
        let selector = self.table(table).await?;
        let cell = self.existing_cell(table, &selector, row, col).await?;
        let description = format!("{} cell ({}, {})", table, row, col);
        if let Err(e) = self
            .engine
            .driver()
            .click(&cell, &ClickOptions::new(self.timeout()))
            .await
        {
            return Err(self.engine.not_interactable(&description, "click_cell", e).await);
        }
        Ok(())
    }

    /// Types `value` into a cell's in-place editor.
    ///
    /// If the cell has no `input`, `textarea` or `[contenteditable]` child it
    /// is double-clicked once to enter edit mode, then the editor is given the
    /// probe timeout to render.
    ///
    /// # Errors
    ///
    /// Returns `Error::ElementNotInteractable` if no editor appears.
    pub async fn set_cell_value(
        &self,
        table: &str,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<()> {
        let selector = self.table(table).await?;
        let cell = self.existing_cell(table, &selector, row, col).await?;
        let editor = editor_selector(&cell);
        let description = format!("{} cell ({}, {})", table, row, col);
        let driver = self.engine.driver();
        let timeout_ms = self.timeout();

        if driver.count(&editor).await? == 0 {
            debug!(cell = %description, "No editor in cell, double-clicking to enter edit mode");
            if let Err(e) = driver.double_click(&cell, &ClickOptions::new(timeout_ms)).await {
                return Err(self.engine.not_interactable(&description, "set_cell_value", e).await);
            }
            // Editors are often rendered a tick after the double-click
            let probe_ms = self.engine.config().probe_timeout_ms;
            match driver.wait_for(&editor, ElementState::Visible, probe_ms).await {
                Ok(()) => {}
                Err(Error::Timeout { .. }) => {
                    return Err(Error::ElementNotInteractable {
                        locator: description,
                        action: "set_cell_value".to_string(),
                        reason: format!(
                            "no editable input appeared within {}ms of double-click",
                            probe_ms
                        ),
                        page_url: self.engine.page_url().await,
                    });
                }
                Err(e) => {
                    return Err(self
                        .engine
                        .not_interactable(&description, "set_cell_value", e)
                        .await);
                }
            }
        }

        if let Err(e) = driver.fill(&editor, value, timeout_ms).await {
            return Err(self.engine.not_interactable(&description, "set_cell_value", e).await);
        }
        Ok(())
    }

    /// Number of body rows
    pub async fn get_row_count(&self, table: &str) -> Result<usize> {
        let selector = self.table(table).await?;
        self.row_count_of(&selector).await
    }

    /// Trimmed text of every cell in a row
    pub async fn get_row_values(&self, table: &str, row: usize) -> Result<Vec<String>> {
        let selector = self.table(table).await?;
        let cells = self.cell_count(&selector, row).await?;
        let mut values = Vec::with_capacity(cells);
        for col in 0..cells {
            values.push(self.text_of(&cell_selector(&selector, row, col)).await?);
        }
        Ok(values)
    }

    /// Trimmed text of `col` in every row; short rows yield an empty string
    /// so indices line up with row numbers.
    pub async fn get_column_values(&self, table: &str, col: usize) -> Result<Vec<String>> {
        let selector = self.table(table).await?;
        let rows = self.row_count_of(&selector).await?;
        let mut values = Vec::with_capacity(rows);
        for row in 0..rows {
            values.push(self.cell_text(&selector, row, col).await?.unwrap_or_default());
        }
        Ok(values)
    }

    /// Indices of all rows whose `column` text matches `text` under `mode`
    pub async fn search_table(
        &self,
        table: &str,
        column: usize,
        text: &str,
        mode: TextMatch,
    ) -> Result<Vec<usize>> {
        let selector = self.table(table).await?;
        let rows = self.row_count_of(&selector).await?;
        let mut matches = Vec::new();
        for row in 0..rows {
            if let Some(cell) = self.cell_text(&selector, row, column).await? {
                if mode.matches(&cell, text) {
                    matches.push(row);
                }
            }
        }
        debug!(table, column, text, %mode, found = matches.len(), "Searched table");
        Ok(matches)
    }

    /// Trimmed `thead th` texts
    pub async fn get_headers(&self, table: &str) -> Result<Vec<String>> {
        let selector = self.table(table).await?;
        let count = self.engine.driver().count(&headers_selector(&selector)).await?;
        let mut headers = Vec::with_capacity(count);
        for col in 0..count {
            headers.push(self.text_of(&header_selector(&selector, col)).await?);
        }
        Ok(headers)
    }

    /// Column index of the header whose trimmed text equals `header`
    pub async fn find_column_by_header(&self, table: &str, header: &str) -> Result<usize> {
        let headers = self.get_headers(table).await?;
        if let Some(col) = headers.iter().position(|h| h == header) {
            return Ok(col);
        }
        Err(Error::ElementNotFound {
            primary: format!("{} header '{}' (headers: {:?})", table, header, headers),
            fallbacks: Vec::new(),
            timeout_ms: self.timeout(),
            page_url: self.engine.page_url().await,
        })
    }

    /// Waits until the row count holds still across two consecutive polls.
    ///
    /// A heuristic: a network-idle wait is attempted first (failure is only
    /// logged), then the row count is polled every `poll_interval_ms` for at
    /// most `table_max_iterations` polls. Returns the last count seen.
    pub async fn wait_for_table_update(&self, table: &str) -> Result<usize> {
        let config = self.engine.config();
        if let Err(e) = self
            .engine
            .driver()
            .wait_for_load_state(LoadState::NetworkIdle, config.probe_timeout_ms)
            .await
        {
            debug!(table, error = %e, "Network idle not reached, polling row count anyway");
        }

        let selector = self.table(table).await?;
        let mut previous = self.row_count_of(&selector).await?;
        for iteration in 1..=config.table_max_iterations {
            self.engine.poll_sleep().await;
            let current = self.row_count_of(&selector).await?;
            if current == previous {
                debug!(table, rows = current, iteration, "Table stabilized");
                return Ok(current);
            }
            debug!(table, previous, current, iteration, "Row count still changing");
            previous = current;
        }

        warn!(
            table,
            rows = previous,
            max_iterations = config.table_max_iterations,
            "Table did not stabilize"
        );
        Ok(previous)
    }

    /// Scrolls until no new rows arrive.
    ///
    /// Stops after three consecutive scrolls without a row-count change
    /// (`Complete`) or after `max_scrolls` (`MaxScrollsReached`); `None`
    /// uses the configured limit.
    pub async fn load_all_dynamic_rows(
        &self,
        table: &str,
        max_scrolls: Option<u32>,
    ) -> Result<DynamicLoadOutcome> {
        let max_scrolls = max_scrolls.unwrap_or(self.engine.config().max_scrolls);
        let selector = self.table(table).await?;
        let mut rows = self.row_count_of(&selector).await?;
        let mut unchanged = 0;

        for scroll in 1..=max_scrolls {
            self.engine.driver().evaluate(SCROLL_TO_BOTTOM).await?;
            self.engine.poll_sleep().await;
            let current = self.row_count_of(&selector).await?;
            if current == rows {
                unchanged += 1;
                if unchanged >= STABLE_SCROLLS {
                    debug!(table, rows, scrolls = scroll, "All dynamic rows loaded");
                    return Ok(DynamicLoadOutcome::Complete {
                        rows,
                        scrolls: scroll,
                    });
                }
            } else {
                debug!(table, previous = rows, current, scroll, "More rows loaded");
                unchanged = 0;
                rows = current;
            }
        }

        warn!(table, rows, max_scrolls, "Scroll limit reached before rows stopped loading");
        Ok(DynamicLoadOutcome::MaxScrollsReached {
            rows,
            scrolls: max_scrolls,
        })
    }

    /// Searches the current page, then follows "next" up to `max_pages`
    /// pages in total.
    pub async fn find_row_across_pages(
        &self,
        table: &str,
        key_column: usize,
        key_value: &str,
        max_pages: usize,
    ) -> Result<PageRow> {
        let max_pages = max_pages.max(1);
        for page in 0..max_pages {
            match self.find_row_by_key(table, key_column, key_value).await {
                Ok(row) => return Ok(PageRow { page, row }),
                Err(e) if e.is_not_found() => {
                    debug!(table, page, key_value, "Key not on this page");
                }
                Err(e) => return Err(e),
            }
            if page + 1 == max_pages || !self.next_page(None).await? {
                break;
            }
            self.wait_for_table_update(table).await?;
        }

        Err(Error::ElementNotFound {
            primary: format!(
                "{} row where column {} == '{}' (searched up to {} page(s))",
                table, key_column, key_value, max_pages
            ),
            fallbacks: Vec::new(),
            timeout_ms: self.timeout(),
            page_url: self.engine.page_url().await,
        })
    }
}
