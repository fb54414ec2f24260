//! Course and slot association validation
//!
//! A package order item lists the courses the student picked, each with a
//! slot count or a weight. Every billing item submitted for the same product
//! must carry exactly the same courses with the same values.
//!
//! Checks run in a fixed order and the first failure is returned:
//!
//! ```text
//! order item   1. every course carries the value its package type needs
//!              2. no course appears twice
//!              3. every course belongs to the package
//!              4. slots within the course maximum; weights equal the
//!                 configured course weight
//!              5. slot total within the package maximum (slot packages)
//! bill items   6. course list present
//!              7. quantity present (quantity-priced packages)
//!              8. quantity equals the course total
//!              9. no course appears twice
//!             10. same course set as the order item
//!             11. same weight and slot per course
//! package     12. every mandatory course present
//! ```

use std::collections::{HashMap, HashSet};

use core_kernel::CourseId;
use domain_catalog::{Package, PackageType, QuantityType};
use domain_pricing::quantity_from_courses;
use crate::error::OrderError;
use crate::request::{BillingItem, CourseItem, OrderItem};

/// Validates the course items of one package order item
#[derive(Debug, Clone, Copy)]
pub struct CourseValidator<'a> {
    package: &'a Package,
    package_type: PackageType,
}

impl<'a> CourseValidator<'a> {
    pub fn new(package: &'a Package, package_type: PackageType) -> Self {
        Self { package, package_type }
    }

    fn quantity_type(&self) -> QuantityType {
        self.package_type.quantity_type()
    }

    /// Quantity-priced packages need a quantity on every billing item
    fn requires_quantity(&self) -> bool {
        matches!(
            self.package_type,
            PackageType::FrequencyBased | PackageType::ScheduleBased
        )
    }

    fn value_of(&self, course: &CourseItem) -> Option<u32> {
        if self.quantity_type().uses_slots() {
            course.slot
        } else {
            course.weight
        }
    }

    /// Validates an order item and the billing items submitted for its product
    ///
    /// # Arguments
    ///
    /// * `item` - The package order item
    /// * `billing_items` - Non-cancel billing items for the same product; empty
    ///   when the server prices the order
    ///
    /// # Returns
    ///
    /// The package quantity: total slots or total weight across the courses.
    pub fn validate(&self, item: &OrderItem, billing_items: &[&BillingItem]) -> Result<u32, OrderError> {
        self.check_order_item(item)?;
        let quantity = quantity_from_courses(self.quantity_type(), item.course_quantities());
        if self.quantity_type().uses_slots() && quantity > self.package.max_slot {
            return Err(OrderError::PackageSlotExceeded {
                product_id: self.package.product_id,
                max_slot: self.package.max_slot,
                actual: quantity,
            });
        }

        for billing_item in billing_items {
            self.check_billing_item(item, billing_item, quantity)?;
        }

        let picked: HashSet<&CourseId> = item.course_items.iter().map(|c| &c.course_id).collect();
        if let Some(missing) = self
            .package
            .mandatory_courses()
            .find(|course| !picked.contains(&course.course_id))
        {
            return Err(OrderError::MissingMandatoryCourse {
                course_id: missing.course_id,
            });
        }

        Ok(quantity)
    }

    fn check_order_item(&self, item: &OrderItem) -> Result<(), OrderError> {
        if let Some(course) = item.course_items.iter().find(|c| self.value_of(c).is_none()) {
            return Err(OrderError::CourseItemMissingValue {
                course_id: course.course_id,
            });
        }

        if let Some(course_id) = first_duplicate(&item.course_items) {
            return Err(OrderError::DuplicateCourseInOrderItem { course_id });
        }

        for course in &item.course_items {
            let package_course = self.package.course(&course.course_id).ok_or(
                OrderError::CourseNotInPackage {
                    course_id: course.course_id,
                    product_id: self.package.product_id,
                },
            )?;
            let value = self.value_of(course).unwrap_or_default();
            if !self.quantity_type().uses_slots() {
                if value != package_course.course_weight {
                    return Err(OrderError::CourseWeightNotConfigured {
                        course_id: course.course_id,
                        expected: package_course.course_weight,
                        actual: value,
                    });
                }
            } else if value > package_course.max_slots_per_course {
                return Err(OrderError::SlotExceedsMaximum {
                    course_id: course.course_id,
                    value,
                    max: package_course.max_slots_per_course,
                });
            }
        }
        Ok(())
    }

    fn check_billing_item(
        &self,
        item: &OrderItem,
        billing_item: &BillingItem,
        quantity: u32,
    ) -> Result<(), OrderError> {
        let product_id = billing_item.product_id;
        if billing_item.course_items.is_empty() {
            return Err(OrderError::BillItemMissingCourses { product_id });
        }

        if self.requires_quantity() {
            let actual = billing_item
                .quantity
                .ok_or(OrderError::MissingQuantity { product_id })?;
            if actual != quantity {
                return Err(OrderError::QuantityMismatch {
                    product_id,
                    expected: quantity,
                    actual,
                });
            }
        }

        if let Some(course_id) = first_duplicate(&billing_item.course_items) {
            return Err(OrderError::DuplicateCourseInBillItem { course_id });
        }

        let ordered: HashMap<&CourseId, &CourseItem> =
            item.course_items.iter().map(|c| (&c.course_id, c)).collect();
        let billed: HashMap<&CourseId, &CourseItem> =
            billing_item.course_items.iter().map(|c| (&c.course_id, c)).collect();

        let mismatch = item
            .course_items
            .iter()
            .map(|c| &c.course_id)
            .find(|id| !billed.contains_key(id))
            .or_else(|| {
                billing_item
                    .course_items
                    .iter()
                    .map(|c| &c.course_id)
                    .find(|id| !ordered.contains_key(id))
            });
        if let Some(course_id) = mismatch {
            return Err(OrderError::CourseMismatch { course_id: *course_id });
        }

        for course in &item.course_items {
            // Both sides contain the course after the set check above
            let Some(billed_course) = billed.get(&course.course_id) else {
                continue;
            };
            if course.weight != billed_course.weight {
                return Err(OrderError::CourseWeightMismatch {
                    course_id: course.course_id,
                    expected: course.weight,
                    actual: billed_course.weight,
                });
            }
            if course.slot != billed_course.slot {
                return Err(OrderError::CourseSlotMismatch {
                    course_id: course.course_id,
                    expected: course.slot,
                    actual: billed_course.slot,
                });
            }
        }
        Ok(())
    }
}

fn first_duplicate(courses: &[CourseItem]) -> Option<CourseId> {
    let mut seen = HashSet::new();
    courses
        .iter()
        .map(|c| c.course_id)
        .find(|id| !seen.insert(*id))
}
