//! Student package records
//!
//! Ordering a package also records which courses the student picked, per
//! order, so class allocation can read them without replaying bill items.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{OrderId, ProductId, StudentId, StudentPackageId, StudentProductId};
use crate::request::CourseItem;

/// Courses picked for a package by one order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentPackage {
    pub id: StudentPackageId,
    pub student_id: StudentId,
    pub package_id: ProductId,
    pub student_product_id: StudentProductId,
    pub order_id: OrderId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub course_items: Vec<CourseItem>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudentPackage {
    pub fn new(
        student_id: StudentId,
        package_id: ProductId,
        student_product_id: StudentProductId,
        order_id: OrderId,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        course_items: Vec<CourseItem>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: StudentPackageId::new_v7(),
            student_id,
            package_id,
            student_product_id,
            order_id,
            start_date,
            end_date,
            course_items,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Ends the record the day before its replacement starts
    pub fn supersede(&mut self, replacement_start: NaiveDate) {
        self.end_date = Some(replacement_start.pred_opt().unwrap_or(replacement_start).max(self.start_date));
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    /// Closes the record on a cancellation, withdrawal or graduation date
    pub fn close(&mut self, end_date: NaiveDate) {
        self.end_date = Some(end_date);
        self.is_active = false;
        self.updated_at = Utc::now();
    }
}
