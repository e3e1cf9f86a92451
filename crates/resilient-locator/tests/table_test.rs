// Integration tests for table and grid operations
//
// Tests cover:
// - Row lookup by key: exact, trimmed, case-sensitive, first match wins
// - Row lookup by several column values
// - Cell reads, clicks and in-place editing
// - Row/column/header extraction and searching
// - Stabilization waits and infinite-scroll loading
// - Searching across paginated tables

mod common;

use resilient_locator::{DynamicLoadOutcome, Error, MockElement, PageRow, TextMatch};
use std::time::Duration;
use tokio::time::Instant;

const CELL_0_1: &str = "#t >> tbody tr >> nth=0 >> :scope > :is(td, th) >> nth=1";
const EDITOR_0_1: &str = "#t >> tbody tr >> nth=0 >> :scope > :is(td, th) >> nth=1 >> \
                          input, textarea, [contenteditable]";
const ROW_0_CELLS: &str = "#t >> tbody tr >> nth=0 >> :scope > :is(td, th)";
const ROW_3_KEY: &str = "#t >> tbody tr >> nth=3 >> :scope > :is(td, th) >> nth=0";

fn key_rows(n: usize) -> Vec<Vec<String>> {
    (0..n)
        .map(|i| vec![format!("k{i}"), format!("Customer {i}"), format!("{}", i * 10)])
        .collect()
}

// ============================================================================
// Row Lookup by Key
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_find_row_by_key_every_row() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#t", &[], key_rows(8));
    let table = engine.table();

    for i in 0..8 {
        let key = format!("k{i}");
        assert_eq!(table.find_row_by_key("#t", 0, &key).await.unwrap(), i);
        // Same answer on a repeated call against the unchanged table
        assert_eq!(table.find_row_by_key("#t", 0, &key).await.unwrap(), i);
    }
}

#[tokio::test(start_paused = true)]
async fn test_find_row_by_key_first_match_wins() {
    let (driver, engine) = common::mock_engine();
    driver.set_table(
        "#t",
        &[],
        vec![vec!["dup", "first"], vec!["other", "middle"], vec!["dup", "third"]],
    );

    assert_eq!(engine.table().find_row_by_key("#t", 0, "dup").await.unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_find_row_by_key_trims_cell_text() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#t", &[], vec![vec!["x"], vec!["  abc  "]]);

    assert_eq!(engine.table().find_row_by_key("#t", 0, "abc").await.unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_find_row_by_key_is_case_sensitive() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#t", &[], vec![vec!["Abc"]]);

    let err = engine.table().find_row_by_key("#t", 0, "abc").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test(start_paused = true)]
async fn test_find_row_by_key_missing_names_table() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#t", &[], key_rows(3));

    let err = engine.table().find_row_by_key("#t", 0, "zzz").await.unwrap_err();
    assert!(matches!(err, Error::ElementNotFound { .. }));
    let message = err.to_string();
    assert!(message.contains("#t"), "{message}");
    assert!(message.contains("zzz"), "{message}");
}

#[tokio::test(start_paused = true)]
async fn test_find_row_by_key_skips_short_rows() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#t", &[], vec![vec!["only"], vec!["a", "target"]]);

    assert_eq!(engine.table().find_row_by_key("#t", 1, "target").await.unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_table_is_not_found() {
    let (_driver, engine) = common::mock_engine();

    let start = Instant::now();
    let err = engine
        .table()
        .with_timeout(250)
        .find_row_by_key("#orders", 0, "k0")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ElementNotFound { ref primary, .. } if primary == "#orders"));
    assert_eq!(start.elapsed().as_millis(), 250);
}

// ============================================================================
// Row Lookup by Values
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_find_row_by_values() {
    let (driver, engine) = common::mock_engine();
    driver.set_table(
        "#t",
        &[],
        vec![
            vec!["Ada", "London", "admin"],
            vec!["Ada", "Paris", "user"],
            vec!["Grace", "Paris", "admin"],
        ],
    );
    let table = engine.table();

    assert_eq!(table.find_row_by_values("#t", &[(0, "Ada"), (1, "Paris")]).await.unwrap(), 1);
    assert_eq!(table.find_row_by_values("#t", &[(1, "Paris"), (2, "admin")]).await.unwrap(), 2);

    let err = table.find_row_by_values("#t", &[(0, "Ada"), (2, "owner")]).await.unwrap_err();
    assert!(err.is_not_found());

    let err = table.find_row_by_values("#t", &[]).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

// ============================================================================
// Cells
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_get_cell_value_and_out_of_range() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#t", &[], key_rows(2));
    let table = engine.table();

    assert_eq!(table.get_cell_value("#t", 1, 1).await.unwrap(), "Customer 1");

    let err = table.get_cell_value("#t", 5, 0).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("#t cell (5, 0)"));
}

#[tokio::test(start_paused = true)]
async fn test_click_cell() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#t", &[], key_rows(2));

    engine.table().click_cell("#t", 0, 1).await.unwrap();
    assert_eq!(driver.call_count(&format!("click {CELL_0_1}")), 1);
}

#[tokio::test(start_paused = true)]
async fn test_set_cell_value_with_existing_editor() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#t", &[], key_rows(1));
    driver.insert(EDITOR_0_1, MockElement::default().editable());

    engine.table().set_cell_value("#t", 0, 1, "Renamed").await.unwrap();

    assert_eq!(driver.element(EDITOR_0_1).unwrap().value, "Renamed");
    assert_eq!(driver.call_count("double_click"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_set_cell_value_double_clicks_into_edit_mode() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#t", &[], key_rows(1));
    driver.on_double_click(CELL_0_1, |dom| {
        dom.insert(EDITOR_0_1, MockElement::default().editable());
    });

    engine.table().set_cell_value("#t", 0, 1, "Edited").await.unwrap();

    assert_eq!(driver.call_count(&format!("double_click {CELL_0_1}")), 1);
    assert_eq!(driver.element(EDITOR_0_1).unwrap().value, "Edited");
}

#[tokio::test(start_paused = true)]
async fn test_set_cell_value_waits_for_late_editor() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#t", &[], key_rows(1));
    // Grid renders its editor 120ms after the double-click
    driver.on_double_click(CELL_0_1, |dom| {
        dom.insert(
            EDITOR_0_1,
            MockElement::default()
                .editable()
                .rendering_in(Duration::from_millis(120)),
        );
    });

    let start = Instant::now();
    engine.table().set_cell_value("#t", 0, 1, "Late").await.unwrap();

    assert_eq!(driver.element(EDITOR_0_1).unwrap().value, "Late");
    let elapsed = start.elapsed().as_millis();
    assert!((120..200).contains(&elapsed), "elapsed {elapsed}ms");
}

#[tokio::test(start_paused = true)]
async fn test_set_cell_value_without_editor_fails() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#t", &[], key_rows(1));

    let start = Instant::now();
    let err = engine.table().set_cell_value("#t", 0, 1, "x").await.unwrap_err();
    match err {
        Error::ElementNotInteractable {
            locator,
            action,
            reason,
            ..
        } => {
            assert_eq!(locator, "#t cell (0, 1)");
            assert_eq!(action, "set_cell_value");
            assert!(reason.contains("200ms"), "{reason}");
        }
        other => panic!("expected ElementNotInteractable, got {other:?}"),
    }
    // Bounded by the 200ms existence timeout, not the 1000ms default
    assert_eq!(start.elapsed().as_millis(), 200);
    assert_eq!(driver.call_count(&format!("wait_for(visible) {EDITOR_0_1}")), 1);
}

// ============================================================================
// Document-Order Addressing
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_rows_span_multiple_tbodies() {
    let (driver, engine) = common::mock_engine();
    // Two <tbody> groups of two rows: `tbody tr` matches all four, indexed
    // 0..=3 in document order regardless of grouping
    driver.set_table("#t", &[], vec![vec!["a"], vec!["b"], vec!["c"], vec!["d"]]);

    let row = engine.table().find_row_by_key("#t", 0, "d").await.unwrap();

    assert_eq!(row, 3);
    let read = format!("text_content {}", ROW_3_KEY);
    assert!(driver.calls().contains(&read), "{:?}", driver.calls());
}

#[tokio::test(start_paused = true)]
async fn test_row_header_cell_is_column_zero() {
    let (driver, engine) = common::mock_engine();
    // <tr><th>Q1</th><td>120</td><td>95</td></tr>
    driver.set_table("#t", &["", "North", "South"], vec![vec!["Q1", "120", "95"]]);
    let table = engine.table();

    assert_eq!(
        table.get_row_values("#t", 0).await.unwrap(),
        vec!["Q1", "120", "95"]
    );
    assert_eq!(table.find_row_by_key("#t", 0, "Q1").await.unwrap(), 0);
    assert_eq!(table.get_cell_value("#t", 0, 2).await.unwrap(), "95");
    // Cells are counted over td and th alike
    assert!(driver.call_count(&format!("count {}", ROW_0_CELLS)) > 0);
}

// ============================================================================
// Rows, Columns and Headers
// ============================================================================

// ============================================================================
// Rows, Columns and Headers
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_row_and_column_extraction() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#t", &[], vec![vec!["a", " 1 "], vec!["b"], vec!["c", "3"]]);
    let table = engine.table();

    assert_eq!(table.get_row_count("#t").await.unwrap(), 3);
    assert_eq!(table.get_row_values("#t", 0).await.unwrap(), vec!["a", "1"]);
    assert_eq!(table.get_column_values("#t", 1).await.unwrap(), vec!["1", "", "3"]);
}

#[tokio::test(start_paused = true)]
async fn test_headers() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#t", &["Id", " Name ", "Total"], key_rows(1));
    let table = engine.table();

    assert_eq!(table.get_headers("#t").await.unwrap(), vec!["Id", "Name", "Total"]);
    assert_eq!(table.find_column_by_header("#t", "Total").await.unwrap(), 2);

    let err = table.find_column_by_header("#t", "Status").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("Status"));
}

#[tokio::test(start_paused = true)]
async fn test_search_table_modes() {
    let (driver, engine) = common::mock_engine();
    driver.set_table(
        "#t",
        &[],
        vec![vec!["Widget Pro"], vec!["widget"], vec!["Gadget"], vec!["Widget"]],
    );
    let table = engine.table();

    assert_eq!(
        table.search_table("#t", 0, "Widget", TextMatch::exact()).await.unwrap(),
        vec![3]
    );
    assert_eq!(
        table.search_table("#t", 0, "widget", TextMatch::contains().ignore_case()).await.unwrap(),
        vec![0, 1, 3]
    );
    assert!(
        table.search_table("#t", 0, "Sprocket", TextMatch::contains()).await.unwrap().is_empty()
    );
}

// ============================================================================
// Stabilization
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_for_table_update_returns_once_stable() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#t", &[], key_rows(5));
    driver.script_counts("#t >> tbody tr", vec![5, 8, 8]);

    let start = Instant::now();
    let rows = engine.table().wait_for_table_update("#t").await.unwrap();

    assert_eq!(rows, 8);
    // Initial read plus two polls, far below the 10-iteration cap
    assert_eq!(driver.call_count("count #t >> tbody tr"), 3);
    assert_eq!(start.elapsed().as_millis(), 100);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_table_update_gives_up_after_max_iterations() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#t", &[], key_rows(1));
    driver.script_counts("#t >> tbody tr", (1..=20).collect());

    let rows = engine.table().wait_for_table_update("#t").await.unwrap();

    // Initial read plus ten polls, each seeing a new count
    assert_eq!(rows, 11);
    assert_eq!(driver.call_count("count #t >> tbody tr"), 11);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_table_update_tolerates_busy_network() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#t", &[], key_rows(4));
    driver.fail_load_state();

    let start = Instant::now();
    assert_eq!(engine.table().wait_for_table_update("#t").await.unwrap(), 4);
    // Probe timeout for the network wait, then one poll
    assert_eq!(start.elapsed().as_millis(), 250);
}

// ============================================================================
// Infinite Scroll
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_load_all_dynamic_rows_completes() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#feed", &[], key_rows(10));
    let mut loaded = 10;
    driver.on_evaluate(move |dom| {
        if loaded < 25 {
            loaded = (loaded + 10).min(25);
            dom.set_table("#feed", &[], key_rows(loaded));
        }
    });

    let outcome = engine.table().load_all_dynamic_rows("#feed", None).await.unwrap();

    // Two growing scrolls, then three unchanged ones
    assert_eq!(outcome, DynamicLoadOutcome::Complete { rows: 25, scrolls: 5 });
    assert_eq!(driver.call_count("evaluate window.scrollTo"), 5);
}

#[tokio::test(start_paused = true)]
async fn test_load_all_dynamic_rows_hits_scroll_limit() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#feed", &[], key_rows(1));
    driver.script_counts("#feed >> tbody tr", (1..=100).collect());

    let outcome = engine.table().load_all_dynamic_rows("#feed", Some(3)).await.unwrap();

    assert_eq!(outcome, DynamicLoadOutcome::MaxScrollsReached { rows: 4, scrolls: 3 });
    assert!(!outcome.is_complete());
    assert_eq!(outcome.row_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_load_all_dynamic_rows_on_static_table() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#feed", &[], key_rows(7));

    let outcome = engine.table().load_all_dynamic_rows("#feed", None).await.unwrap();
    assert_eq!(outcome, DynamicLoadOutcome::Complete { rows: 7, scrolls: 3 });
}

// ============================================================================
// Paginated Search
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_find_row_across_pages() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#t", &[], vec![vec!["k0"], vec!["k1"]]);
    driver.insert("[rel='next']", MockElement::new("Next"));
    let mut page = 0;
    driver.on_click("[rel='next']", move |dom| {
        page += 1;
        let rows: Vec<Vec<String>> = (0..2).map(|i| vec![format!("p{page}-{i}")]).collect();
        dom.set_table("#t", &[], rows);
    });

    let found = engine.table().find_row_across_pages("#t", 0, "p2-1", 5).await.unwrap();
    assert_eq!(found, PageRow { page: 2, row: 1 });
    assert_eq!(driver.call_count("click [rel='next']"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_find_row_across_pages_stops_without_next_control() {
    let (driver, engine) = common::mock_engine();
    driver.set_table("#t", &[], vec![vec!["k0"]]);

    let err = engine
        .table()
        .find_row_across_pages("#t", 0, "k9", 3)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("searched up to 3 page(s)"));
    assert_eq!(driver.call_count("click"), 0);
}
