//! Repository implementations
//!
//! Repositories own the SQL and the mapping between rows and domain types.
//! Reads of master data go through the pool; everything written while an
//! order is processed takes a `&mut PgConnection`, so a single
//! `sqlx::Transaction` can span the whole lifecycle operation.
//!
//! Enumerations are stored as text using their storage names
//! (`BILLED`, `UPDATE_SCHEDULED`, `PACKAGE_TYPE_FREQUENCY_BASED`, ...).

pub mod bill_item;
pub mod catalog;
pub mod order;
pub mod package_quantity_type;
pub mod student;
pub mod student_package;
pub mod student_product;

pub use bill_item::BillItemRepository;
pub use catalog::CatalogRepository;
pub use order::OrderRepository;
pub use package_quantity_type::PackageQuantityTypeRepository;
pub use student::StudentRepository;
pub use student_package::StudentPackageRepository;
pub use student_product::StudentProductRepository;

use crate::error::DatabaseError;

/// Reads a non-negative integer column into a count
pub(crate) fn to_u32(value: i32, column: &str) -> Result<u32, DatabaseError> {
    u32::try_from(value)
        .map_err(|_| DatabaseError::InvalidValue(format!("{column} must not be negative, got {value}")))
}

/// Writes a count into an integer column
pub(crate) fn to_i32(value: u32, column: &str) -> Result<i32, DatabaseError> {
    i32::try_from(value)
        .map_err(|_| DatabaseError::InvalidValue(format!("{column} out of range: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_conversions() {
        assert_eq!(to_u32(3, "quantity").unwrap(), 3);
        assert!(to_u32(-1, "quantity").is_err());
        assert_eq!(to_i32(7, "quantity").unwrap(), 7);
        assert!(to_i32(u32::MAX, "quantity").is_err());
    }
}
