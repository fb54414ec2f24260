//! Tests for core_kernel error types

use core_kernel::{DateRange, MoneyError, Percentage, Ratio, TemporalError, Timezone};
use chrono::NaiveDate;
use rust_decimal_macros::dec;

#[test]
fn test_invalid_ratio_names_both_parts() {
    let err = Ratio::new(3, 2).unwrap_err();
    assert_eq!(err, MoneyError::InvalidRatio { numerator: 3, denominator: 2 });
    assert_eq!(err.to_string(), "Invalid billing ratio 3/2");
}

#[test]
fn test_invalid_percentage_carries_value() {
    let err = Percentage::new(dec!(-5)).unwrap_err();
    assert_eq!(err, MoneyError::InvalidPercentage(dec!(-5)));
    assert!(err.to_string().contains("-5"));
}

#[test]
fn test_unknown_timezone_error() {
    let err = "Mars/Olympus".parse::<Timezone>().unwrap_err();
    assert_eq!(err, TemporalError::InvalidTimezone("Mars/Olympus".to_string()));
}

#[test]
fn test_inverted_period_message() {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    let err = DateRange::new(start, end).unwrap_err();
    assert!(err.to_string().contains("2024-03-01"));
}
