//! Order lifecycle planning
//!
//! Each order item is turned into a [`Changes`] set: the student products,
//! bill items and package records to write, plus the events to publish once
//! the transaction commits. Planning is pure; the service reads current state
//! from the transaction, plans, then writes the result.
//!
//! # Affected periods
//!
//! ```text
//! update      periods ending on/after the effective date, re-priced;
//!             adjustment = new final - old full-period final * new ratio
//! cancel      periods ending on/after the cancellation date;
//!             adjustment = -old final
//! withdrawal  same selection as cancel, no proration
//! graduation  pending periods starting on/after the effective date
//! ```

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

use core_kernel::{BillingSchedulePeriodId, DiscountId, LocationId, OrderId, StudentId};
use domain_catalog::Catalog;
use domain_pricing::{adjustment_for_update, prorate, BillLine, BillingAmounts};
use crate::bill_item::{BillItem, BillStatus};
use crate::error::OrderError;
use crate::events::OrderEvent;
use crate::request::OrderItem;
use crate::student_package::StudentPackage;
use crate::student_product::{LifecycleState, StudentProduct};

/// Order-wide inputs to planning
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    pub order_id: OrderId,
    pub order_date: NaiveDate,
    pub student_id: StudentId,
    pub location_id: LocationId,
    pub catalog: &'a Catalog,
}

/// Bill lines priced for one order item
#[derive(Debug, Clone, Default)]
pub struct PricedItem {
    pub lines: Vec<BillLine>,
    pub quantity: Option<u32>,
    pub discount_id: Option<DiscountId>,
}

/// Current state of the student product an order item changes
#[derive(Debug, Clone)]
pub struct CurrentState {
    pub student_product: StudentProduct,
    pub bill_items: Vec<BillItem>,
    pub package: Option<StudentPackage>,
}

/// A student product write guarded by the version it was read at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedUpdate {
    pub student_product: StudentProduct,
    pub expected_version: i32,
}

/// Everything one order writes
#[derive(Debug, Clone, Default)]
pub struct Changes {
    pub created_student_products: Vec<StudentProduct>,
    pub updated_student_products: Vec<VersionedUpdate>,
    pub new_bill_items: Vec<BillItem>,
    pub changed_bill_items: Vec<BillItem>,
    pub packages: Vec<StudentPackage>,
    pub events: Vec<OrderEvent>,
}

impl Changes {
    pub fn merge(&mut self, other: Changes) {
        self.created_student_products.extend(other.created_student_products);
        self.updated_student_products.extend(other.updated_student_products);
        self.new_bill_items.extend(other.new_bill_items);
        self.changed_bill_items.extend(other.changed_bill_items);
        self.packages.extend(other.packages);
        self.events.extend(other.events);
    }

    /// Amounts a client must have submitted for this order
    pub fn expected_amounts(&self) -> Vec<BillingAmounts> {
        self.new_bill_items
            .iter()
            .chain(self.changed_bill_items.iter())
            .map(BillItem::amounts)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.created_student_products.is_empty()
            && self.updated_student_products.is_empty()
            && self.new_bill_items.is_empty()
            && self.changed_bill_items.is_empty()
    }
}

/// Rejects a change made against an outdated read of the student product
pub fn ensure_version(student_product: &StudentProduct, expected: Option<i32>) -> Result<(), OrderError> {
    match expected {
        Some(expected) if expected != student_product.version_number => Err(OrderError::StaleVersion {
            student_product_id: student_product.id,
            expected,
            actual: student_product.version_number,
        }),
        _ => Ok(()),
    }
}

/// Plans a new student product with one bill item per priced line
///
/// # Errors
///
/// * `ProductNotAssociated` - the add-on is not associated with its package
/// * `UniqueProductConflict` - a unique product is still active for the student
pub fn plan_new(
    ctx: &PlanContext<'_>,
    item: &OrderItem,
    priced: PricedItem,
    existing: &[StudentProduct],
) -> Result<Changes, OrderError> {
    let product = ctx.catalog.product(&item.product_id)?;
    let start_date = item.start_date.unwrap_or(ctx.order_date);

    if let Some(package_id) = item.package_associated_id {
        if !ctx.catalog.is_associated(&package_id, &product.id) {
            return Err(OrderError::ProductNotAssociated {
                product_id: product.id,
                package_id,
            });
        }
    }

    if product.is_unique
        && existing.iter().any(|sp| {
            sp.state() != LifecycleState::Cancelled && sp.end_date.map_or(true, |end| end >= start_date)
        })
    {
        return Err(OrderError::UniqueProductConflict { product_id: product.id });
    }

    let end_date = if product.is_recurring() {
        priced.lines.iter().filter_map(|line| line.period_end).max()
    } else {
        ctx.catalog.package(&product.id).ok().and_then(|package| package.end_date)
    };

    let mut student_product = StudentProduct::new(ctx.student_id, ctx.location_id, product.id, start_date, end_date)
        .with_discount(priced.discount_id)
        .with_quantity(priced.quantity);
    if item.package_associated_id.is_some() {
        student_product = student_product.associated();
    }

    let mut changes = Changes::default();
    changes.new_bill_items = priced
        .lines
        .iter()
        .map(|line| {
            BillItem::from_line(ctx.order_id, &student_product, line).with_package(item.package_associated_id)
        })
        .collect();

    if product.kind.is_package() {
        changes.packages.push(StudentPackage::new(
            ctx.student_id,
            product.id,
            student_product.id,
            ctx.order_id,
            start_date,
            end_date,
            item.course_items.clone(),
        ));
    }

    changes.events.push(OrderEvent::StudentProductCreated {
        order_id: ctx.order_id,
        student_product_id: student_product.id,
        student_id: ctx.student_id,
        location_id: ctx.location_id,
        product_id: product.id,
        start_date,
        discount_id: priced.discount_id,
        timestamp: Utc::now(),
    });
    changes.created_student_products.push(student_product);

    debug!(
        order_id = %ctx.order_id,
        product_id = %item.product_id,
        bill_items = changes.new_bill_items.len(),
        "Planned new student product"
    );
    Ok(changes)
}

/// Plans the replacement of a student product from an effective date
///
/// The current row is relabelled `UpdateScheduled` and linked to a new
/// `Created` row. Each re-priced period carries the difference against the
/// old item for the same period: the old item's full-period amount is
/// prorated by the new line's ratio before subtracting.
pub fn plan_update(
    ctx: &PlanContext<'_>,
    item: &OrderItem,
    current: CurrentState,
    priced: PricedItem,
    effective_date: NaiveDate,
) -> Result<Changes, OrderError> {
    let CurrentState {
        student_product: mut old,
        bill_items,
        package,
    } = current;
    let product = ctx.catalog.product(&old.product_id)?;

    ensure_version(&old, item.student_product_version)?;
    old.ensure_changeable(LifecycleState::UpdateScheduled)?;
    old.validate_effective_date(effective_date, ctx.order_date, product.is_recurring())?;

    let expected_version = old.version_number;
    let next = old
        .successor(effective_date)
        .with_discount(priced.discount_id)
        .with_quantity(priced.quantity.or(old.quantity));
    old.schedule_update(effective_date, next.id)?;

    let previous: HashMap<Option<BillingSchedulePeriodId>, &BillItem> = bill_items
        .iter()
        .filter(|b| !b.is_cancel_bill_item)
        .map(|b| (b.billing_schedule_period_id, b))
        .collect();
    let within_end = |line: &BillLine| match (line.period_start, next.end_date) {
        (Some(start), Some(end)) => start <= end,
        _ => true,
    };

    let mut changes = Changes::default();
    for line in priced.lines.iter().filter(|line| within_end(line)) {
        let old_item = previous.get(&line.period_id);
        let old_final = old_item.map_or(Decimal::ZERO, |b| prorate(b.full_period_final(), line.ratio));
        let adjustment = adjustment_for_update(old_final, line.final_price);
        changes.new_bill_items.push(
            BillItem::from_line(ctx.order_id, &next, line)
                .with_package(item.package_associated_id)
                .with_adjustment(adjustment, old_item.map(|b| b.id)),
        );
    }

    if let Some(mut old_package) = package {
        let course_items = if item.course_items.is_empty() {
            old_package.course_items.clone()
        } else {
            item.course_items.clone()
        };
        let replacement = StudentPackage::new(
            ctx.student_id,
            old_package.package_id,
            next.id,
            ctx.order_id,
            effective_date,
            next.end_date,
            course_items,
        );
        old_package.supersede(effective_date);
        changes.packages.push(old_package);
        changes.packages.push(replacement);
    }

    let now = Utc::now();
    changes.events.push(OrderEvent::StudentProductUpdated {
        order_id: ctx.order_id,
        student_product_id: old.id,
        replaced_by: next.id,
        effective_date,
        timestamp: now,
    });
    changes.events.push(OrderEvent::StudentProductCreated {
        order_id: ctx.order_id,
        student_product_id: next.id,
        student_id: next.student_id,
        location_id: next.location_id,
        product_id: next.product_id,
        start_date: effective_date,
        discount_id: next.discount_id,
        timestamp: now,
    });

    changes.created_student_products.push(next);
    changes.updated_student_products.push(VersionedUpdate {
        student_product: old,
        expected_version,
    });
    Ok(changes)
}

/// Which existing bill items an ending transition touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    Cancel,
    Withdrawal,
    Graduation,
}

impl Ending {
    fn target(&self) -> LifecycleState {
        match self {
            Ending::Cancel => LifecycleState::Cancelled,
            Ending::Withdrawal => LifecycleState::Withdrawn,
            Ending::Graduation => LifecycleState::Graduated,
        }
    }

    fn affects(&self, item: &BillItem, date: NaiveDate) -> bool {
        if item.is_cancel_bill_item {
            return false;
        }
        match self {
            Ending::Cancel | Ending::Withdrawal => item.ends_on_or_after(date),
            Ending::Graduation => item.status == BillStatus::Pending && item.starts_on_or_after(date),
        }
    }
}

fn plan_ending(
    ctx: &PlanContext<'_>,
    item: &OrderItem,
    current: CurrentState,
    date: NaiveDate,
    ending: Ending,
) -> Result<Changes, OrderError> {
    let CurrentState {
        student_product: mut sp,
        bill_items,
        package,
    } = current;
    let product = ctx.catalog.product(&sp.product_id)?;

    ensure_version(&sp, item.student_product_version)?;
    sp.ensure_changeable(ending.target())?;
    sp.validate_effective_date(date, ctx.order_date, product.is_recurring())?;

    let expected_version = sp.version_number;
    match ending {
        Ending::Cancel => sp.cancel(date)?,
        Ending::Withdrawal => sp.schedule_withdrawal(date)?,
        Ending::Graduation => sp.schedule_graduation(date)?,
    }

    let mut changes = Changes::default();
    for mut bill_item in bill_items.into_iter().filter(|b| ending.affects(b, date)) {
        bill_item.cancel();
        changes.changed_bill_items.push(bill_item);
    }
    let refund: Decimal = changes
        .changed_bill_items
        .iter()
        .filter_map(|b| b.adjustment_price)
        .map(|adjustment| -adjustment)
        .sum();

    if let Some(mut package) = package {
        package.close(date);
        changes.packages.push(package);
    }

    let (order_id, student_product_id, timestamp) = (ctx.order_id, sp.id, Utc::now());
    changes.events.push(match ending {
        Ending::Cancel => OrderEvent::StudentProductCancelled {
            order_id,
            student_product_id,
            cancellation_date: date,
            refund,
            timestamp,
        },
        Ending::Withdrawal => OrderEvent::StudentProductWithdrawn {
            order_id,
            student_product_id,
            effective_date: date,
            refund,
            timestamp,
        },
        Ending::Graduation => OrderEvent::StudentProductGraduated {
            order_id,
            student_product_id,
            effective_date: date,
            refund,
            timestamp,
        },
    });

    debug!(
        order_id = %ctx.order_id,
        student_product_id = %student_product_id,
        affected = changes.changed_bill_items.len(),
        ?ending,
        "Planned ending transition"
    );
    changes.updated_student_products.push(VersionedUpdate {
        student_product: sp,
        expected_version,
    });
    Ok(changes)
}

/// Plans a cancellation: affected items are flagged and fully refunded
pub fn plan_cancel(
    ctx: &PlanContext<'_>,
    item: &OrderItem,
    current: CurrentState,
    cancellation_date: NaiveDate,
) -> Result<Changes, OrderError> {
    plan_ending(ctx, item, current, cancellation_date, Ending::Cancel)
}

pub fn plan_withdrawal(
    ctx: &PlanContext<'_>,
    item: &OrderItem,
    current: CurrentState,
    effective_date: NaiveDate,
) -> Result<Changes, OrderError> {
    plan_ending(ctx, item, current, effective_date, Ending::Withdrawal)
}

/// Plans a graduation; periods already billed stay untouched
pub fn plan_graduation(
    ctx: &PlanContext<'_>,
    item: &OrderItem,
    current: CurrentState,
    effective_date: NaiveDate,
) -> Result<Changes, OrderError> {
    plan_ending(ctx, item, current, effective_date, Ending::Graduation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{BillingScheduleId, ProductId, Ratio};
    use domain_catalog::{
        BillingSchedule, BillingSchedulePeriod, Cadence, Product, ProductKind, ProductPrice,
    };
    use domain_pricing::{BillingCalculator, BillingRequest};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Setup {
        catalog: Catalog,
        product_id: ProductId,
        student_id: StudentId,
        location_id: LocationId,
    }

    fn monthly_fee() -> Setup {
        let product_id = ProductId::new();
        let schedule_id = BillingScheduleId::new();
        let periods = [(1, 31), (2, 29), (3, 31)]
            .iter()
            .map(|(m, last)| {
                let start = date(2024, *m, 1);
                BillingSchedulePeriod::new(format!("M{m}"), start, date(2024, *m, *last), start).unwrap()
            })
            .collect();
        let mut catalog = Catalog::new();
        catalog.insert_schedule(BillingSchedule::new(schedule_id, "Monthly", periods).unwrap());
        catalog.insert_product(
            Product::new(product_id, "Tuition", ProductKind::Fee(Cadence::Recurring))
                .with_billing_schedule(schedule_id),
        );
        catalog.insert_price(ProductPrice::new(product_id, dec!(100)));
        Setup {
            catalog,
            product_id,
            student_id: StudentId::new(),
            location_id: LocationId::new(),
        }
    }

    fn ctx(setup: &Setup, order_date: NaiveDate) -> PlanContext<'_> {
        PlanContext {
            order_id: OrderId::new(),
            order_date,
            student_id: setup.student_id,
            location_id: setup.location_id,
            catalog: &setup.catalog,
        }
    }

    fn priced(setup: &Setup, order_date: NaiveDate, start: NaiveDate) -> PricedItem {
        let lines = BillingCalculator::new(&setup.catalog)
            .compute(&BillingRequest::new(setup.product_id, order_date, start))
            .unwrap();
        PricedItem {
            lines,
            ..Default::default()
        }
    }

    fn created(setup: &Setup) -> CurrentState {
        let order_date = date(2024, 1, 1);
        let changes = plan_new(
            &ctx(setup, order_date),
            &OrderItem::new(setup.product_id),
            priced(setup, order_date, order_date),
            &[],
        )
        .unwrap();
        CurrentState {
            student_product: changes.created_student_products[0].clone(),
            bill_items: changes.new_bill_items,
            package: None,
        }
    }

    #[test]
    fn test_new_order_bills_each_period() {
        let setup = monthly_fee();
        let state = created(&setup);
        assert_eq!(state.bill_items.len(), 3);
        assert_eq!(state.student_product.end_date, Some(date(2024, 3, 31)));
        assert_eq!(state.bill_items[0].status, BillStatus::Billed);
        assert_eq!(state.bill_items[2].status, BillStatus::Pending);
    }

    #[test]
    fn test_unique_product_conflict() {
        let mut setup = monthly_fee();
        let product = setup.catalog.product(&setup.product_id).unwrap().clone().unique();
        setup.catalog.insert_product(product);
        let existing = created(&setup).student_product;

        let order_date = date(2024, 2, 1);
        let err = plan_new(
            &ctx(&setup, order_date),
            &OrderItem::new(setup.product_id),
            priced(&setup, order_date, order_date),
            &[existing],
        )
        .unwrap_err();
        assert!(matches!(err, OrderError::UniqueProductConflict { .. }));
    }

    #[test]
    fn test_cancel_touches_only_affected_periods() {
        let setup = monthly_fee();
        let state = created(&setup);
        let mut item = OrderItem::new(setup.product_id);
        item.student_product_id = Some(state.student_product.id);

        let changes = plan_cancel(&ctx(&setup, date(2024, 2, 10)), &item, state, date(2024, 2, 10)).unwrap();
        assert_eq!(changes.changed_bill_items.len(), 2);
        for bill_item in &changes.changed_bill_items {
            assert!(bill_item.is_cancel_bill_item);
            assert_eq!(bill_item.adjustment_price, Some(dec!(-100)));
        }
        assert_eq!(changes.updated_student_products[0].expected_version, 1);
        assert_eq!(changes.updated_student_products[0].student_product.version_number, 2);
    }

    #[test]
    fn test_graduation_leaves_billed_periods() {
        let setup = monthly_fee();
        let state = created(&setup);
        let mut item = OrderItem::new(setup.product_id);
        item.student_product_id = Some(state.student_product.id);

        let changes = plan_graduation(&ctx(&setup, date(2024, 1, 15)), &item, state, date(2024, 2, 1)).unwrap();
        assert_eq!(changes.changed_bill_items.len(), 2);
        assert!(changes.changed_bill_items.iter().all(|b| b.billing_from >= Some(date(2024, 2, 1))));
    }

    #[test]
    fn test_stale_version_rejected() {
        let setup = monthly_fee();
        let state = created(&setup);
        let mut item = OrderItem::new(setup.product_id);
        item.student_product_id = Some(state.student_product.id);
        item.student_product_version = Some(7);

        let err = plan_withdrawal(&ctx(&setup, date(2024, 2, 1)), &item, state, date(2024, 2, 1)).unwrap_err();
        assert!(matches!(err, OrderError::StaleVersion { expected: 7, actual: 1, .. }));
    }

    #[test]
    fn test_update_carries_adjustments() {
        let setup = monthly_fee();
        let state = created(&setup);
        let old_id = state.student_product.id;
        let mut item = OrderItem::new(setup.product_id);
        item.student_product_id = Some(old_id);
        item.student_product_version = Some(1);

        let order_date = date(2024, 2, 1);
        let mut repriced = priced(&setup, order_date, order_date);
        for line in &mut repriced.lines {
            line.final_price = dec!(80);
        }
        let changes = plan_update(&ctx(&setup, order_date), &item, state, repriced, order_date).unwrap();

        assert_eq!(changes.new_bill_items.len(), 2);
        assert!(changes.new_bill_items.iter().all(|b| b.adjustment_price == Some(dec!(-20))));
        let next = &changes.created_student_products[0];
        assert_eq!(next.updated_from_student_product_id, Some(old_id));
        assert_ne!(next.id, old_id);
        assert_eq!(
            changes.updated_student_products[0].student_product.state(),
            LifecycleState::UpdateScheduled
        );
    }

    #[test]
    fn test_update_within_prorated_first_period() {
        let setup = monthly_fee();
        let mut state = created(&setup);
        let half = Ratio::new(1, 2).unwrap();
        state.bill_items[0].ratio = half;
        state.bill_items[0].final_price = dec!(50);
        let mut item = OrderItem::new(setup.product_id);
        item.student_product_id = Some(state.student_product.id);

        let order_date = date(2024, 1, 25);
        let mut repriced = priced(&setup, order_date, order_date);
        repriced.lines[0].ratio = half;
        repriced.lines[0].final_price = dec!(45);
        let changes = plan_update(&ctx(&setup, order_date), &item, state, repriced, order_date).unwrap();

        assert_eq!(changes.new_bill_items[0].adjustment_price, Some(dec!(-5)));
    }
}

