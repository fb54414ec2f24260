//! Discount synchronisation
//!
//! When a student's org-level discount tags change, a message names each
//! student product whose discount must follow. The handler turns the message
//! into a server-priced UPDATE order from the message's effective date, so
//! the remaining periods are re-priced and carry adjustment prices.

use tracing::{debug, info};

use core_kernel::OrderId;
use crate::error::OrderError;
use crate::events::UpdateProductDiscount;
use crate::ports::OrderStore;
use crate::request::{CreateOrderRequest, OrderItem, OrderType};
use crate::service::OrderService;
use crate::student_product::LifecycleState;

/// Applies discount change messages to existing student products
pub struct DiscountSyncHandler<S: OrderStore> {
    service: OrderService<S>,
}

impl<S: OrderStore> DiscountSyncHandler<S> {
    pub fn new(service: OrderService<S>) -> Self {
        Self { service }
    }

    /// Handles a raw JSON message
    pub async fn handle_payload(&self, payload: &[u8]) -> Result<Option<OrderId>, OrderError> {
        let message = UpdateProductDiscount::from_json(payload)?;
        self.handle(message).await
    }

    /// Handles one message
    ///
    /// # Returns
    ///
    /// The id of the update order, or `None` when nothing had to change:
    /// the student product already carries the discount, or it has since been
    /// replaced or ended.
    pub async fn handle(&self, message: UpdateProductDiscount) -> Result<Option<OrderId>, OrderError> {
        let student_product = self
            .service
            .store()
            .student_product(message.student_product_id)
            .await?
            .ok_or(OrderError::StudentProductNotFound(message.student_product_id))?;

        if student_product.state() != LifecycleState::Created {
            debug!(
                student_product_id = %student_product.id,
                state = %student_product.state(),
                "Skipping discount sync for inactive student product"
            );
            return Ok(None);
        }
        if student_product.discount_id == message.discount_id {
            debug!(student_product_id = %student_product.id, "Discount already applied");
            return Ok(None);
        }

        let mut item = OrderItem::new(student_product.product_id);
        item.discount_id = message.discount_id;
        // Changes never take effect in the past
        let effective_date = message
            .effective_date
            .max(student_product.start_date)
            .max(self.service.today());
        item.effective_date = Some(effective_date);
        item.student_product_id = Some(student_product.id);
        item.student_product_version = Some(student_product.version_number);

        let mut request = CreateOrderRequest::new(message.student_id, message.location_id, OrderType::Update);
        request.order_comment = Some("Discount synchronisation".to_string());
        request.order_items.push(item);

        let order_id = self.service.create_order(request).await?;
        info!(
            order_id = %order_id,
            student_product_id = %message.student_product_id,
            discount_id = ?message.discount_id,
            "Synchronised discount"
        );
        Ok(Some(order_id))
    }
}
