// Integration tests for element interactions
//
// Tests cover:
// - Each action resolves once and performs exactly one driver call
// - click_if_exists on absent vs broken elements
// - Action failures wrapped as ElementNotInteractable, resolution failures not
// - select_option validation and selection by value/label/index
// - Reads (text, attribute, input value) and non-raising visibility probes

mod common;

use resilient_locator::{
    BoundingBox, ElementState, Error, LoadState, MockElement, Position, SelectBy,
};
use tokio::time::Instant;

// ============================================================================
// Clicks
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_click_via_fallback() {
    let (driver, engine) = common::mock_engine();
    driver.insert("text=Submit", MockElement::new("Submit"));

    engine
        .click("#submit", &["text=Submit"], Some(100))
        .await
        .expect("fallback should be clicked");

    assert_eq!(driver.calls().last().unwrap(), "click text=Submit");
    assert_eq!(driver.call_count("click"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_click_variants_record_buttons() {
    let (driver, engine) = common::mock_engine();
    driver.insert("#row", MockElement::new("Row"));

    engine.double_click("#row", &[], None).await.unwrap();
    engine.right_click("#row", &[], None).await.unwrap();
    engine.hover("#row", &[], None).await.unwrap();

    let actions: Vec<String> = driver
        .calls()
        .into_iter()
        .filter(|c| !c.starts_with("wait_for"))
        .collect();
    assert_eq!(actions, vec!["double_click #row", "click[right] #row", "hover #row"]);
}

#[tokio::test(start_paused = true)]
async fn test_click_if_exists_absent_returns_false() {
    let (driver, engine) = common::mock_engine();

    let start = Instant::now();
    let clicked = engine
        .click_if_exists("#cookie-accept", &["text=Accept"], None)
        .await
        .expect("absence is not an error");

    assert!(!clicked);
    assert_eq!(driver.call_count("click"), 0);
    // Probe timeout (200ms) per candidate, not the 1s default
    assert_eq!(start.elapsed().as_millis(), 400);
}

#[tokio::test(start_paused = true)]
async fn test_click_if_exists_present_clicks() {
    let (driver, engine) = common::mock_engine();
    driver.insert("#cookie-accept", MockElement::new("Accept"));

    assert!(engine.click_if_exists("#cookie-accept", &[], None).await.unwrap());
    assert_eq!(driver.call_count("click"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_click_if_exists_failing_click_raises() {
    let (driver, engine) = common::mock_engine();
    driver.set_url("https://shop.test/");
    driver.insert("#banner-close", MockElement::new("x").disabled());

    let err = engine
        .click_if_exists("#banner-close", &[], None)
        .await
        .unwrap_err();

    match err {
        Error::ElementNotInteractable { locator, action, page_url, .. } => {
            assert_eq!(locator, "#banner-close");
            assert_eq!(action, "click");
            assert_eq!(page_url, "https://shop.test/");
        }
        other => panic!("expected ElementNotInteractable, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_click_missing_element_is_not_found() {
    let (driver, engine) = common::mock_engine();

    let err = engine.click("#ghost", &[], Some(100)).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(driver.call_count("click"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_click_at_position_inside_and_outside_box() {
    let (driver, engine) = common::mock_engine();
    let bounds = BoundingBox { x: 0.0, y: 0.0, width: 40.0, height: 20.0 };
    driver.insert("#canvas", MockElement::default().with_box(bounds));

    engine
        .click_at_position("#canvas", &[], Position { x: 10.0, y: 5.0 }, None)
        .await
        .unwrap();
    assert_eq!(driver.call_count("click@10,5 #canvas"), 1);

    let err = engine
        .click_at_position("#canvas", &[], Position { x: 50.0, y: 5.0 }, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ElementNotInteractable { .. }));
    assert_eq!(driver.call_count("click"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_on_click_handler_mutates_document() {
    let (driver, engine) = common::mock_engine();
    driver.insert("#open", MockElement::new("Open"));
    driver.on_click("#open", |dom| dom.insert("#dialog", MockElement::new("Dialog")));

    assert!(!engine.is_visible("#dialog", &[], None).await.unwrap());
    engine.click("#open", &[], None).await.unwrap();
    assert!(engine.is_visible("#dialog", &[], None).await.unwrap());
}

// ============================================================================
// Form Input
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_fill_and_clear() {
    let (driver, engine) = common::mock_engine();
    driver.insert("#email", MockElement::default().editable());

    engine.fill("#email", &[], "ada@example.com", None).await.unwrap();
    assert_eq!(engine.get_input_value("#email", &[], None).await.unwrap(), "ada@example.com");

    engine.clear("#email", &[], None).await.unwrap();
    assert_eq!(driver.element("#email").unwrap().value, "");
    assert_eq!(driver.call_count("fill #email = "), 2);
}

#[tokio::test(start_paused = true)]
async fn test_select_option_by_value_label_index() {
    let (driver, engine) = common::mock_engine();
    driver.insert(
        "#country",
        MockElement::default().with_options([
            ("no", "Norway"),
            ("se", "Sweden"),
            ("dk", "Denmark"),
        ]),
    );

    let picked = engine
        .select_option("#country", &[], &SelectBy::label("Sweden"), None)
        .await
        .unwrap();
    assert_eq!(picked, vec!["se"]);

    let picked = engine
        .select_option("#country", &[], &SelectBy::index(2), None)
        .await
        .unwrap();
    assert_eq!(picked, vec!["dk"]);

    engine
        .select_option("#country", &[], &SelectBy::value("no"), None)
        .await
        .unwrap();
    assert_eq!(driver.element("#country").unwrap().value, "no");
}

#[tokio::test(start_paused = true)]
async fn test_select_option_requires_a_choice() {
    let (driver, engine) = common::mock_engine();
    driver.insert("#country", MockElement::default());

    let err = engine
        .select_option("#country", &[], &SelectBy::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(driver.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_select_unknown_option_is_not_interactable() {
    let (driver, engine) = common::mock_engine();
    driver.insert("#country", MockElement::default().with_options([("no", "Norway")]));

    let err = engine
        .select_option("#country", &[], &SelectBy::label("Atlantis"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ElementNotInteractable { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_check_uncheck_and_press() {
    let (driver, engine) = common::mock_engine();
    driver.insert("#terms", MockElement::default());
    driver.insert("#search", MockElement::default().editable());

    engine.check("#terms", &[], None).await.unwrap();
    assert!(driver.element("#terms").unwrap().checked);
    engine.uncheck("#terms", &[], None).await.unwrap();
    assert!(!driver.element("#terms").unwrap().checked);

    engine.press_key("#search", &[], "Enter", None).await.unwrap();
    assert_eq!(driver.call_count("press #search Enter"), 1);
}

// ============================================================================
// Reads and Waits
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_reads() {
    let (driver, engine) = common::mock_engine();
    driver.insert(
        "#status",
        MockElement::new("Paid").with_attribute("data-state", "done"),
    );

    assert_eq!(engine.get_text("#status", &[], None).await.unwrap(), "Paid");
    assert_eq!(
        engine.get_attribute("#status", &[], "data-state", None).await.unwrap(),
        Some("done".to_string())
    );
    assert_eq!(
        engine.get_attribute("#status", &[], "title", None).await.unwrap(),
        None
    );
}

#[tokio::test(start_paused = true)]
async fn test_is_visible_never_raises_for_absence() {
    let (driver, engine) = common::mock_engine();
    driver.insert("#hidden", MockElement::new("x").hidden());

    assert!(!engine.is_visible("#hidden", &[], None).await.unwrap());
    assert!(!engine.is_visible("#absent", &[], None).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_element_hidden_and_detached() {
    let (driver, engine) = common::mock_engine();
    driver.insert("#spinner", MockElement::default().hidden());

    engine
        .wait_for_element("#spinner", &[], ElementState::Hidden, Some(100))
        .await
        .unwrap();
    engine
        .wait_for_element("#toast", &[], ElementState::Detached, Some(100))
        .await
        .unwrap();
    assert!(
        engine
            .wait_for_element("#spinner", &[], ElementState::Detached, Some(100))
            .await
            .is_err()
    );
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_page_load() {
    let (driver, engine) = common::mock_engine();

    engine
        .wait_for_page_load(LoadState::DomContentLoaded, None)
        .await
        .unwrap();
    assert_eq!(driver.calls(), vec!["wait_for_load_state(domcontentloaded)"]);

    driver.fail_load_state();
    let err = engine
        .wait_for_page_load(LoadState::NetworkIdle, Some(300))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
}

// ============================================================================
// Invalid Locators
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_unparseable_locator_is_not_reported_missing() {
    let (driver, engine) = common::mock_engine();

    let start = Instant::now();
    let err = engine.click("", &[], None).await.unwrap_err();
    assert!(matches!(err, Error::InvalidLocator(_)), "{err:?}");

    // Not swallowed as "absent" either
    let err = engine.click_if_exists("   ", &[], None).await.unwrap_err();
    assert!(matches!(err, Error::InvalidLocator(_)), "{err:?}");

    assert_eq!(start.elapsed().as_millis(), 0);
    assert!(driver.calls().is_empty());
}
