//! Custom Test Assertions
//!
//! Assertion helpers for bill items and order errors that give more
//! meaningful failure messages than plain `assert_eq!`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use domain_order::{BillItem, BillStatus, ErrorCode, OrderError};

/// Tolerance used when comparing client and server amounts
pub const AMOUNT_TOLERANCE: Decimal = dec!(0.01);

/// Asserts that two amounts are equal within [`AMOUNT_TOLERANCE`]
pub fn assert_amount_approx_eq(actual: Decimal, expected: Decimal) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= AMOUNT_TOLERANCE,
        "Amounts differ by more than tolerance: actual={}, expected={}, diff={}",
        actual,
        expected,
        diff
    );
}

/// Asserts the final prices of bill items, in order
pub fn assert_final_prices(items: &[BillItem], expected: &[Decimal]) {
    let actual: Vec<Decimal> = items.iter().map(|item| item.final_price).collect();
    assert_eq!(
        actual.len(),
        expected.len(),
        "Expected {} bill items, got {}: {:?}",
        expected.len(),
        actual.len(),
        actual
    );
    for (a, e) in actual.iter().zip(expected) {
        assert_amount_approx_eq(*a, *e);
    }
}

/// Asserts that every billed item is dated on or before the pending ones
pub fn assert_billed_before_pending(items: &[BillItem]) {
    let last_billed = items
        .iter()
        .filter(|item| item.status == BillStatus::Billed)
        .map(|item| item.billing_date)
        .max();
    let first_pending = items
        .iter()
        .filter(|item| item.status == BillStatus::Pending)
        .map(|item| item.billing_date)
        .min();
    if let (Some(billed), Some(pending)) = (last_billed, first_pending) {
        assert!(
            billed <= pending,
            "Billed item dated {} follows pending item dated {}",
            billed,
            pending
        );
    }
}

/// Asserts that cancellation items reverse exactly their final price
pub fn assert_cancellations_reverse(items: &[BillItem]) {
    for item in items.iter().filter(|item| item.is_cancel_bill_item) {
        assert_eq!(
            item.adjustment_price,
            Some(-item.final_price),
            "Cancelled bill item {} should adjust by {}",
            item.id,
            -item.final_price
        );
    }
}

/// Asserts that a result failed with the given error code
pub fn assert_error_code<T: std::fmt::Debug>(result: &Result<T, OrderError>, code: ErrorCode) {
    match result {
        Ok(value) => panic!("Expected {:?} error, got Ok({:?})", code, value),
        Err(err) => assert_eq!(err.code(), code, "Unexpected error: {}", err),
    }
}

/// Asserts that an error message mentions the given entity id
pub fn assert_error_mentions(err: &OrderError, id: impl std::fmt::Display) {
    let id = id.to_string();
    assert!(err.to_string().contains(&id), "Error '{}' should mention {}", err, id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{CourseId, StudentProductId};

    #[test]
    fn test_amount_tolerance() {
        assert_amount_approx_eq(dec!(10.004), dec!(10.00));
    }

    #[test]
    #[should_panic(expected = "tolerance")]
    fn test_amount_outside_tolerance() {
        assert_amount_approx_eq(dec!(10.02), dec!(10.00));
    }

    #[test]
    fn test_error_code_assertion() {
        let result: Result<(), OrderError> = Err(OrderError::StaleVersion {
            student_product_id: StudentProductId::new(),
            expected: 1,
            actual: 2,
        });
        assert_error_code(&result, ErrorCode::Aborted);
    }

    #[test]
    fn test_error_mentions_id() {
        let course_id = CourseId::new();
        assert_error_mentions(&OrderError::MissingMandatoryCourse { course_id }, course_id);
    }
}
