//! Order domain errors
//!
//! Every failure of an order request surfaces as an [`OrderError`]. Callers
//! see a structured [`ErrorCode`] plus a message naming the offending course,
//! product or student product.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::{CourseId, ProductId, StudentProductId};
use domain_catalog::CatalogError;
use domain_pricing::PricingError;

/// Status code attached to an order error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The request itself is malformed or inconsistent
    InvalidArgument,
    /// The request is valid but the current state forbids it
    FailedPrecondition,
    /// A referenced entity does not exist
    NotFound,
    /// Concurrent modification detected; re-read and resubmit
    Aborted,
    /// Storage or other infrastructure failure
    Internal,
}

/// Errors that can occur while processing an order
#[derive(Debug, Error)]
pub enum OrderError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Course and slot validation
    #[error("Course item {course_id} is missing its slot or weight")]
    CourseItemMissingValue { course_id: CourseId },

    #[error("Duplicate course {course_id} in order item")]
    DuplicateCourseInOrderItem { course_id: CourseId },

    #[error("Course {course_id} does not belong to package {product_id}")]
    CourseNotInPackage { course_id: CourseId, product_id: ProductId },

    #[error("Course {course_id} value {value} exceeds the maximum of {max}")]
    SlotExceedsMaximum { course_id: CourseId, value: u32, max: u32 },

    #[error("Course {course_id} weight {actual} does not match the configured weight {expected}")]
    CourseWeightNotConfigured { course_id: CourseId, expected: u32, actual: u32 },

    #[error("Package {product_id} has {actual} slots, above the maximum of {max_slot}")]
    PackageSlotExceeded { product_id: ProductId, max_slot: u32, actual: u32 },

    #[error("Bill item for product {product_id} has no course items")]
    BillItemMissingCourses { product_id: ProductId },

    #[error("Bill item for product {product_id} is missing its quantity")]
    MissingQuantity { product_id: ProductId },

    #[error("Bill item quantity {actual} for product {product_id} does not match course total {expected}")]
    QuantityMismatch { product_id: ProductId, expected: u32, actual: u32 },

    #[error("Duplicate course {course_id} in bill item")]
    DuplicateCourseInBillItem { course_id: CourseId },

    #[error("Course {course_id} differs between order item and bill item")]
    CourseMismatch { course_id: CourseId },

    #[error("Course {course_id} weight mismatch: order item {expected:?}, bill item {actual:?}")]
    CourseWeightMismatch { course_id: CourseId, expected: Option<u32>, actual: Option<u32> },

    #[error("Course {course_id} slot mismatch: order item {expected:?}, bill item {actual:?}")]
    CourseSlotMismatch { course_id: CourseId, expected: Option<u32>, actual: Option<u32> },

    #[error("Mandatory course {course_id} is missing")]
    MissingMandatoryCourse { course_id: CourseId },

    // Lifecycle
    #[error("Product {product_id} is not associated with package {package_id}")]
    ProductNotAssociated { product_id: ProductId, package_id: ProductId },

    #[error("Student product not found: {0}")]
    StudentProductNotFound(StudentProductId),

    #[error("Invalid effective date {date} for student product {student_product_id}: {reason}")]
    InvalidEffectiveDate {
        student_product_id: StudentProductId,
        date: NaiveDate,
        reason: String,
    },

    #[error("Product {product_id} is unique and already ordered for this student")]
    UniqueProductConflict { product_id: ProductId },

    #[error("Student product {student_product_id} already has a pending order")]
    PendingOrderExists { student_product_id: StudentProductId },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Student product {student_product_id} version mismatch: expected {expected}, found {actual}")]
    StaleVersion {
        student_product_id: StudentProductId,
        expected: i32,
        actual: i32,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl OrderError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        OrderError::InvalidRequest(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        OrderError::Storage(message.into())
    }

    pub fn invalid_effective_date(
        student_product_id: StudentProductId,
        date: NaiveDate,
        reason: impl Into<String>,
    ) -> Self {
        OrderError::InvalidEffectiveDate {
            student_product_id,
            date,
            reason: reason.into(),
        }
    }

    /// Maps the error onto the structured status code
    pub fn code(&self) -> ErrorCode {
        match self {
            OrderError::Catalog(err) if err.is_not_found() => ErrorCode::NotFound,
            OrderError::Catalog(_) => ErrorCode::FailedPrecondition,
            OrderError::Pricing(PricingError::Catalog(err)) if err.is_not_found() => ErrorCode::NotFound,
            OrderError::Pricing(err) if err.is_verification_failure() => ErrorCode::InvalidArgument,
            OrderError::Pricing(_) => ErrorCode::FailedPrecondition,
            OrderError::InvalidRequest(_)
            | OrderError::CourseItemMissingValue { .. }
            | OrderError::DuplicateCourseInOrderItem { .. }
            | OrderError::CourseNotInPackage { .. }
            | OrderError::SlotExceedsMaximum { .. }
            | OrderError::CourseWeightNotConfigured { .. }
            | OrderError::PackageSlotExceeded { .. }
            | OrderError::BillItemMissingCourses { .. }
            | OrderError::MissingQuantity { .. }
            | OrderError::QuantityMismatch { .. }
            | OrderError::DuplicateCourseInBillItem { .. }
            | OrderError::CourseMismatch { .. }
            | OrderError::CourseWeightMismatch { .. }
            | OrderError::CourseSlotMismatch { .. }
            | OrderError::MissingMandatoryCourse { .. }
            | OrderError::ProductNotAssociated { .. }
            | OrderError::InvalidEffectiveDate { .. } => ErrorCode::InvalidArgument,
            OrderError::UniqueProductConflict { .. }
            | OrderError::PendingOrderExists { .. }
            | OrderError::InvalidStateTransition { .. } => ErrorCode::FailedPrecondition,
            OrderError::StudentProductNotFound(_) => ErrorCode::NotFound,
            OrderError::StaleVersion { .. } => ErrorCode::Aborted,
            OrderError::Storage(_) => ErrorCode::Internal,
        }
    }

    /// Only version conflicts are worth resubmitting after a re-read
    pub fn is_retryable(&self) -> bool {
        self.code() == ErrorCode::Aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_version_is_retryable() {
        let err = OrderError::StaleVersion {
            student_product_id: StudentProductId::new(),
            expected: 1,
            actual: 2,
        };
        assert_eq!(err.code(), ErrorCode::Aborted);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_course_errors_are_invalid_argument() {
        let course_id = CourseId::new();
        let err = OrderError::CourseMismatch { course_id };
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains(&course_id.to_string()));
    }

    #[test]
    fn test_catalog_not_found_maps_to_not_found() {
        let err: OrderError = CatalogError::ProductNotFound(ProductId::new()).into();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_storage_is_internal() {
        assert_eq!(OrderError::storage("connection reset").code(), ErrorCode::Internal);
    }
}
