#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::*;

// ── truncate ──────────────────────────────────────────────────

#[test]
fn test_truncate_short_string() {
    assert_eq!(truncate("Groceries", 20), "Groceries");
}

#[test]
fn test_truncate_exact_length() {
    assert_eq!(truncate("Rent", 4), "Rent");
}

#[test]
fn test_truncate_long_title() {
    assert_eq!(truncate("Weekly farmers market", 10), "Weekly fa…");
}

#[test]
fn test_truncate_zero_max() {
    assert_eq!(truncate("Coffee", 0), "");
}

#[test]
fn test_truncate_unicode() {
    assert_eq!(truncate("café résumé", 5), "café…");
    assert_eq!(truncate("日本語テスト", 4), "日本語…");
}

#[test]
fn test_truncate_one_char() {
    assert_eq!(truncate("Travel", 1), "…");
}

// ── format_amount ─────────────────────────────────────────────

#[test]
fn test_format_amount_basic() {
    assert_eq!(format_amount(dec!(1234.56)), "$1,234.56");
}

#[test]
fn test_format_amount_zero() {
    assert_eq!(format_amount(dec!(0)), "$0.00");
}

#[test]
fn test_format_amount_negative_remaining() {
    assert_eq!(format_amount(dec!(-42.50)), "-$42.50");
    assert_eq!(format_amount(dec!(-99999.01)), "-$99,999.01");
}

#[test]
fn test_format_amount_large() {
    assert_eq!(format_amount(dec!(1234567.89)), "$1,234,567.89");
}

#[test]
fn test_format_amount_pads_and_rounds() {
    assert_eq!(format_amount(dec!(1.5)), "$1.50");
    assert_eq!(format_amount(dec!(2.345)), "$2.34");
    assert_eq!(format_amount(dec!(-0.001)), "$0.00");
}

// ── format_percentage ─────────────────────────────────────────

#[test]
fn test_format_percentage() {
    assert_eq!(format_percentage(dec!(80)), "80.0%");
    assert_eq!(format_percentage(dec!(33.333333)), "33.3%");
    assert_eq!(format_percentage(dec!(0)), "0.0%");
}
