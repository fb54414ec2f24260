//! Student product aggregate
//!
//! A student product records one student's subscription to one product. It
//! is versioned: every change bumps `version_number`, and storage only
//! accepts a write whose expected version matches the stored one.
//!
//! # State Machine
//!
//! ```text
//! (order NEW) ──► Created ──┬──► UpdateScheduled   (replaced by a new Created row)
//!                           ├──► Cancelled
//!                           ├──► Withdrawn
//!                           └──► Graduated
//! ```
//!
//! `Cancelled`, `Withdrawn` and `Graduated` are terminal.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{DiscountId, LocationId, ProductId, StudentId, StudentProductId};
use crate::error::OrderError;

/// Persisted label of a student product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudentProductLabel {
    Created,
    UpdateScheduled,
    Updated,
    WithdrawalScheduled,
    GraduationScheduled,
}

impl StudentProductLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentProductLabel::Created => "CREATED",
            StudentProductLabel::UpdateScheduled => "UPDATE_SCHEDULED",
            StudentProductLabel::Updated => "UPDATED",
            StudentProductLabel::WithdrawalScheduled => "WITHDRAWAL_SCHEDULED",
            StudentProductLabel::GraduationScheduled => "GRADUATION_SCHEDULED",
        }
    }
}

impl FromStr for StudentProductLabel {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(StudentProductLabel::Created),
            "UPDATE_SCHEDULED" => Ok(StudentProductLabel::UpdateScheduled),
            "UPDATED" => Ok(StudentProductLabel::Updated),
            "WITHDRAWAL_SCHEDULED" => Ok(StudentProductLabel::WithdrawalScheduled),
            "GRADUATION_SCHEDULED" => Ok(StudentProductLabel::GraduationScheduled),
            other => Err(OrderError::storage(format!("unknown student product label {other}"))),
        }
    }
}

/// Persisted status of a student product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudentProductStatus {
    Ordered,
    Cancelled,
}

impl StudentProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentProductStatus::Ordered => "ORDERED",
            StudentProductStatus::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for StudentProductStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ORDERED" => Ok(StudentProductStatus::Ordered),
            "CANCELLED" => Ok(StudentProductStatus::Cancelled),
            other => Err(OrderError::storage(format!("unknown student product status {other}"))),
        }
    }
}

/// Lifecycle state derived from label and status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Created,
    UpdateScheduled,
    Cancelled,
    Withdrawn,
    Graduated,
}

impl LifecycleState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LifecycleState::Cancelled | LifecycleState::Withdrawn | LifecycleState::Graduated
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A student's subscription to a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProduct {
    pub id: StudentProductId,
    pub student_id: StudentId,
    pub location_id: LocationId,
    pub product_id: ProductId,
    pub start_date: NaiveDate,
    /// Last active date; open-ended one-time products have none
    pub end_date: Option<NaiveDate>,
    pub label: StudentProductLabel,
    pub status: StudentProductStatus,
    /// Optimistic concurrency token, starts at 1
    pub version_number: i32,
    /// First student product of an update chain
    pub root_student_product_id: Option<StudentProductId>,
    pub updated_from_student_product_id: Option<StudentProductId>,
    pub updated_to_student_product_id: Option<StudentProductId>,
    /// Ordered as an add-on of a package
    pub is_associated: bool,
    pub discount_id: Option<DiscountId>,
    pub quantity: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudentProduct {
    /// Creates a student product in the `Created` state
    pub fn new(
        student_id: StudentId,
        location_id: LocationId,
        product_id: ProductId,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: StudentProductId::new_v7(),
            student_id,
            location_id,
            product_id,
            start_date,
            end_date,
            label: StudentProductLabel::Created,
            status: StudentProductStatus::Ordered,
            version_number: 1,
            root_student_product_id: None,
            updated_from_student_product_id: None,
            updated_to_student_product_id: None,
            is_associated: false,
            discount_id: None,
            quantity: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_discount(mut self, discount_id: Option<DiscountId>) -> Self {
        self.discount_id = discount_id;
        self
    }

    pub fn with_quantity(mut self, quantity: Option<u32>) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn associated(mut self) -> Self {
        self.is_associated = true;
        self
    }

    pub fn state(&self) -> LifecycleState {
        if self.status == StudentProductStatus::Cancelled {
            return LifecycleState::Cancelled;
        }
        match self.label {
            StudentProductLabel::Created => LifecycleState::Created,
            StudentProductLabel::UpdateScheduled | StudentProductLabel::Updated => {
                LifecycleState::UpdateScheduled
            }
            StudentProductLabel::WithdrawalScheduled => LifecycleState::Withdrawn,
            StudentProductLabel::GraduationScheduled => LifecycleState::Graduated,
        }
    }

    /// Returns true while the subscription covers the date
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.status == StudentProductStatus::Ordered
            && self.start_date <= date
            && self.end_date.map_or(true, |end| date <= end)
    }

    /// Builds the replacement row of an update chain
    pub fn successor(&self, effective_date: NaiveDate) -> StudentProduct {
        let mut next = StudentProduct::new(
            self.student_id,
            self.location_id,
            self.product_id,
            effective_date,
            self.end_date,
        );
        next.root_student_product_id = Some(self.root_student_product_id.unwrap_or(self.id));
        next.updated_from_student_product_id = Some(self.id);
        next.is_associated = self.is_associated;
        next.discount_id = self.discount_id;
        next.quantity = self.quantity;
        next
    }

    /// Checks that a change can be applied from the current state
    ///
    /// # Errors
    ///
    /// * `PendingOrderExists` - a withdrawal or graduation is already scheduled
    /// * `InvalidStateTransition` - the row is superseded or cancelled
    pub fn ensure_changeable(&self, to: LifecycleState) -> Result<(), OrderError> {
        match self.state() {
            LifecycleState::Created => Ok(()),
            LifecycleState::Withdrawn | LifecycleState::Graduated => {
                Err(OrderError::PendingOrderExists {
                    student_product_id: self.id,
                })
            }
            from => Err(OrderError::InvalidStateTransition {
                from: format!("{:?}", from),
                to: format!("{:?}", to),
            }),
        }
    }

    /// Validates the effective date of a change
    ///
    /// Recurring products accept dates in `[start, end)`; one-time products
    /// accept any date from the start. No change may take effect before the
    /// order date.
    pub fn validate_effective_date(
        &self,
        date: NaiveDate,
        order_date: NaiveDate,
        recurring: bool,
    ) -> Result<(), OrderError> {
        if date < order_date {
            return Err(OrderError::invalid_effective_date(self.id, date, "before the order date"));
        }
        if date < self.start_date {
            return Err(OrderError::invalid_effective_date(
                self.id,
                date,
                format!("before the start date {}", self.start_date),
            ));
        }
        if recurring {
            if let Some(end) = self.end_date {
                if date >= end {
                    return Err(OrderError::invalid_effective_date(
                        self.id,
                        date,
                        format!("on or after the end date {end}"),
                    ));
                }
            }
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.version_number += 1;
        self.updated_at = Utc::now();
    }

    /// Marks the row as replaced by `successor` from `effective_date`
    pub fn schedule_update(
        &mut self,
        effective_date: NaiveDate,
        successor: StudentProductId,
    ) -> Result<(), OrderError> {
        self.ensure_changeable(LifecycleState::UpdateScheduled)?;
        self.label = StudentProductLabel::UpdateScheduled;
        self.end_date = Some(effective_date);
        self.updated_to_student_product_id = Some(successor);
        self.touch();
        Ok(())
    }

    pub fn cancel(&mut self, cancellation_date: NaiveDate) -> Result<(), OrderError> {
        self.ensure_changeable(LifecycleState::Cancelled)?;
        self.status = StudentProductStatus::Cancelled;
        self.end_date = Some(cancellation_date);
        self.touch();
        Ok(())
    }

    pub fn schedule_withdrawal(&mut self, effective_date: NaiveDate) -> Result<(), OrderError> {
        self.ensure_changeable(LifecycleState::Withdrawn)?;
        self.label = StudentProductLabel::WithdrawalScheduled;
        self.end_date = Some(effective_date);
        self.touch();
        Ok(())
    }

    pub fn schedule_graduation(&mut self, effective_date: NaiveDate) -> Result<(), OrderError> {
        self.ensure_changeable(LifecycleState::Graduated)?;
        self.label = StudentProductLabel::GraduationScheduled;
        self.end_date = Some(effective_date);
        self.touch();
        Ok(())
    }
}
