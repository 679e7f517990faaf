// Unit tests for cart row interpretation and verification (no browser needed)

use super::*;
use pretty_assertions::assert_eq;

fn reading(name: &str, price: &str, quantity: &str) -> RowReading {
    RowReading::parse(name.to_string(), price, quantity, &Currency::default()).unwrap()
}

fn assertion_message(result: Result<()>) -> String {
    match result {
        Err(HarnessError::Assertion(msg)) => msg,
        other => panic!("expected assertion failure, got {:?}", other),
    }
}

#[test]
fn test_first_match_contains_takes_first_row() {
    let names = ["Atomic Habits Journal", "Atomic Habits", "Sunrise on the Reaping"];

    assert_eq!(
        first_match(names, "Atomic Habits", MatchStrategy::Contains),
        Some(0)
    );
    assert_eq!(
        first_match(names, "Atomic Habits", MatchStrategy::Exact),
        Some(1)
    );
    assert_eq!(
        first_match(names, "Sunrise", MatchStrategy::Contains),
        Some(2)
    );
    assert_eq!(first_match(names, "Sunrise", MatchStrategy::Exact), None);
}

#[test]
fn test_first_match_on_empty_cart() {
    let names: [&str; 0] = [];
    assert_eq!(first_match(names, "Atomic Habits", MatchStrategy::Contains), None);
}

#[test]
fn test_first_match_exact_ignores_padding() {
    let names = ["  Atomic Habits \n"];
    assert_eq!(
        first_match(names, "Atomic Habits", MatchStrategy::Exact),
        Some(0)
    );
}

#[test]
fn test_row_parse_drops_card_price() {
    let row = reading(
        "Sunrise on the Reaping",
        "Rp 350,000 or Rp 315,000 with Periplus card",
        " 2 ",
    );
    assert_eq!(row.price_text, "Rp 350,000");
    assert_eq!(row.item.unit_price, 350_000);
    assert_eq!(row.item.quantity, 2);
    assert_eq!(row.item.line_total(), 700_000);
}

#[test]
fn test_row_parse_rejects_bad_quantity() {
    let err = RowReading::parse(
        "Atomic Habits".to_string(),
        "Rp 108,000",
        "two",
        &Currency::default(),
    )
    .unwrap_err();
    assert_eq!(err.exit_code(), 3);
    assert!(err.to_string().contains("'two'"));
}

#[test]
fn test_row_verify_matches_price_and_quantity() {
    let row = reading(
        "Sunrise on the Reaping",
        "Rp 350,000 or Rp 315,000 with Periplus card",
        "1",
    );
    row.verify("Sunrise on the Reaping", "Rp 350,000", 1).unwrap();
}

#[test]
fn test_row_verify_reports_price_mismatch_first() {
    let row = reading("Atomic Habits", "Rp 108,000", "3");

    let msg = assertion_message(row.verify("Atomic Habits", "Rp 110,000", 1));
    assert_eq!(
        msg,
        "Price for product 'Atomic Habits' is incorrect. Expected: Rp 110,000, Actual: Rp 108,000"
    );
}

#[test]
fn test_row_verify_reports_quantity_mismatch() {
    let row = reading("Atomic Habits", "Rp 108,000", "1");

    let msg = assertion_message(row.verify("Atomic Habits", "Rp 108,000", 4));
    assert!(msg.contains("Expected: 4, Actual: 1"));
}

#[test]
fn test_total_contains_vs_exact() {
    let rendered = "Sub-Total: Rp 216,000";

    verify_total(rendered, "Rp 216,000", MatchStrategy::Contains).unwrap();
    let msg = assertion_message(verify_total(rendered, "Rp 216,000", MatchStrategy::Exact));
    assert!(msg.contains("Expected: Rp 216,000, Actual: Sub-Total: Rp 216,000"));

    verify_total("Rp 216,000", "Rp 216,000", MatchStrategy::Exact).unwrap();
    assert!(verify_total(rendered, "Rp 108,000", MatchStrategy::Contains).is_err());
}
