//! Order service
//!
//! Orchestrates one create-order request end to end:
//!
//! 1. Validates the request shape
//! 2. Loads the catalog snapshot and the student's discount context
//! 3. Per order item: validates courses, prices it, reads the current
//!    student product under lock and plans the lifecycle transition
//! 4. Verifies client-submitted billing items against the computed ones
//! 5. Writes everything in one transaction and commits
//! 6. Publishes events; publication failures are logged, never returned

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use chrono::NaiveDate;
use core_kernel::{Clock, OrderId, ProductId, StudentProductId};
use domain_catalog::PriceType;
use domain_pricing::{
    verify_billing_items, BillingAmounts, BillingCalculator, BillingRequest, DiscountQuery,
    DiscountResolver,
};
use crate::bill_item::BillItem;
use crate::courses::CourseValidator;
use crate::error::OrderError;
use crate::events::OrderEvent;
use crate::lifecycle::{
    plan_cancel, plan_graduation, plan_new, plan_update, plan_withdrawal, Changes, CurrentState,
    PlanContext, PricedItem,
};
use crate::ports::{EventPublisher, Order, OrderStore, OrderTransaction, StudentContext};
use crate::request::{BillingItem, CreateOrderRequest, OrderItem, OrderType};
use crate::student_product::StudentProduct;

/// A student product with its bill items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentProductView {
    pub student_product: StudentProduct,
    pub bill_items: Vec<BillItem>,
}

/// Processes orders against a store
pub struct OrderService<S: OrderStore> {
    store: Arc<S>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl<S: OrderStore> Clone for OrderService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            publisher: self.publisher.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<S: OrderStore> OrderService<S> {
    pub fn new(store: Arc<S>, publisher: Arc<dyn EventPublisher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            publisher,
            clock,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Order date in the organisation's timezone
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Creates an order
    ///
    /// # Returns
    ///
    /// The id of the committed order.
    ///
    /// # Errors
    ///
    /// Any validation, pricing, verification or storage failure. Nothing is
    /// written when an error is returned.
    #[instrument(
        skip(self, request),
        fields(student_id = %request.student_id, order_type = request.order_type.as_str())
    )]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderId, OrderError> {
        info!(
            items = request.order_items.len(),
            billing_items = request.billing_items.len(),
            upcoming_billing_items = request.upcoming_billing_items.len(),
            "Received order"
        );

        let (order, events) = match self.process(&request).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, code = ?err.code(), "Order rejected");
                return Err(err);
            }
        };

        info!(order_id = %order.id, events = events.len(), "Order committed");
        for event in &events {
            if let Err(err) = self.publisher.publish(event).await {
                warn!(
                    order_id = %order.id,
                    event_type = event.event_type(),
                    error = %err,
                    "Failed to publish event"
                );
            }
        }
        Ok(order.id)
    }

    /// Reads a student product and its bill items
    pub async fn student_product(&self, id: StudentProductId) -> Result<StudentProductView, OrderError> {
        let student_product = self
            .store
            .student_product(id)
            .await?
            .ok_or(OrderError::StudentProductNotFound(id))?;
        let bill_items = self.store.bill_items(id).await?;
        Ok(StudentProductView {
            student_product,
            bill_items,
        })
    }

    async fn process(&self, request: &CreateOrderRequest) -> Result<(Order, Vec<OrderEvent>), OrderError> {
        request.validate()?;
        let order_date = self.clock.today();

        let mut seen = HashSet::new();
        let product_ids: Vec<ProductId> = request
            .order_items
            .iter()
            .flat_map(|item| std::iter::once(item.product_id).chain(item.package_associated_id))
            .filter(|id| seen.insert(*id))
            .collect();
        let catalog = self.store.load_catalog(&product_ids).await?;
        let context = self
            .store
            .load_student_context(request.student_id, request.location_id)
            .await?;

        let order = Order::from_request(request, order_date);
        let ctx = PlanContext {
            order_id: order.id,
            order_date,
            student_id: request.student_id,
            location_id: request.location_id,
            catalog: &catalog,
        };

        let mut tx = self.store.begin().await?;
        let mut changes = Changes::default();
        for item in &request.order_items {
            changes.merge(plan_item(&mut tx, &ctx, &context, request, item).await?);
        }

        if !request.is_server_priced() {
            let submitted: Vec<BillingAmounts> = request
                .billing_items
                .iter()
                .chain(request.upcoming_billing_items.iter())
                .map(BillingItem::amounts)
                .collect();
            verify_billing_items(&changes.expected_amounts(), &submitted)?;
        }

        tx.insert_order(&order).await?;
        for student_product in &changes.created_student_products {
            tx.insert_student_product(student_product).await?;
        }
        for update in &changes.updated_student_products {
            tx.update_student_product(&update.student_product, update.expected_version)
                .await?;
        }
        tx.insert_bill_items(&changes.new_bill_items).await?;
        tx.update_bill_items(&changes.changed_bill_items).await?;
        for package in &changes.packages {
            tx.upsert_student_package(package).await?;
        }
        tx.commit().await?;

        let mut events = vec![OrderEvent::OrderCreated {
            order_id: order.id,
            student_id: order.student_id,
            location_id: order.location_id,
            order_type: order.order_type,
            timestamp: order.created_at,
        }];
        events.extend(changes.events);
        Ok((order, events))
    }
}

async fn plan_item<T: OrderTransaction>(
    tx: &mut T,
    ctx: &PlanContext<'_>,
    context: &StudentContext,
    request: &CreateOrderRequest,
    item: &OrderItem,
) -> Result<Changes, OrderError> {
    let product = ctx.catalog.product(&item.product_id)?;

    // Updates without course items keep the courses already ordered
    let validate_courses = request.order_type == OrderType::New
        || (request.order_type == OrderType::Update
            && !item.is_cancellation()
            && !item.course_items.is_empty());
    let quantity = match product.kind.package_type() {
        Some(package_type) if validate_courses => {
            let package = ctx.catalog.package(&product.id)?;
            let billing_items: Vec<&BillingItem> = request.billing_items_for(&item.product_id).collect();
            Some(CourseValidator::new(package, package_type).validate(item, &billing_items)?)
        }
        _ => None,
    };

    if request.order_type == OrderType::New {
        let start_date = item.start_date.unwrap_or(ctx.order_date);
        let priced = price_item(ctx, context, item, start_date, quantity)?;
        let existing = tx.student_products_for(ctx.student_id, product.id).await?;
        return plan_new(ctx, item, priced, &existing);
    }

    let current = current_state(tx, ctx, item).await?;
    let missing_date = || OrderError::invalid_request(format!("order item for product {} has no date", item.product_id));

    match (request.order_type, item.cancellation_date) {
        (OrderType::Update, Some(cancellation_date)) => plan_cancel(ctx, item, current, cancellation_date),
        (OrderType::Update, None) => {
            let effective_date = item.effective_date.ok_or_else(missing_date)?;
            let quantity = quantity.or(current.student_product.quantity);
            let priced = price_item(ctx, context, item, effective_date, quantity)?;
            plan_update(ctx, item, current, priced, effective_date)
        }
        (OrderType::Withdrawal, _) => {
            let date = item.effective_date.or(item.cancellation_date).ok_or_else(missing_date)?;
            plan_withdrawal(ctx, item, current, date)
        }
        (OrderType::Graduate, _) => {
            let date = item.effective_date.or(item.cancellation_date).ok_or_else(missing_date)?;
            plan_graduation(ctx, item, current, date)
        }
        (OrderType::New, _) => Err(OrderError::invalid_request("new order item reached the change path")),
    }
}

async fn current_state<T: OrderTransaction>(
    tx: &mut T,
    ctx: &PlanContext<'_>,
    item: &OrderItem,
) -> Result<CurrentState, OrderError> {
    let id = item
        .student_product_id
        .ok_or_else(|| OrderError::invalid_request("order item requires a student product"))?;
    let student_product = tx
        .student_product_for_update(id)
        .await?
        .ok_or(OrderError::StudentProductNotFound(id))?;
    if student_product.student_id != ctx.student_id || student_product.product_id != item.product_id {
        return Err(OrderError::invalid_request(format!(
            "student product {id} does not belong to this student and product"
        )));
    }
    let bill_items = tx.bill_items_for_student_product(id).await?;
    let package = tx.student_package_for(id).await?;
    Ok(CurrentState {
        student_product,
        bill_items,
        package,
    })
}

fn price_item(
    ctx: &PlanContext<'_>,
    context: &StudentContext,
    item: &OrderItem,
    start_date: NaiveDate,
    quantity: Option<u32>,
) -> Result<PricedItem, OrderError> {
    let discount = DiscountResolver::new(ctx.catalog)
        .resolve(&DiscountQuery {
            product_id: item.product_id,
            student_id: ctx.student_id,
            location_id: ctx.location_id,
            order_date: ctx.order_date,
            explicit: item.discount_id,
            student_enrolled: context.enrolled,
            tags: &context.tags,
        })?
        .cloned();

    let price_type = if context.enrolled {
        PriceType::Enrolled
    } else {
        PriceType::Default
    };
    let mut billing = BillingRequest::new(item.product_id, ctx.order_date, start_date).with_price_type(price_type);
    if let Some(quantity) = quantity {
        billing = billing.with_quantity(quantity);
    }
    let discount_id = discount.as_ref().map(|d| d.id);
    if let Some(discount) = discount {
        billing = billing.with_discount(discount);
    }

    let lines = BillingCalculator::new(ctx.catalog).compute(&billing)?;
    Ok(PricedItem {
        lines,
        quantity,
        discount_id,
    })
}
