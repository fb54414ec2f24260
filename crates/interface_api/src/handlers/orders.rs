//! Order handlers

use axum::{extract::State, http::StatusCode, Json};
use domain_order::OrderStore;

use crate::dto::order::{CreateOrderBody, CreateOrderResponse};
use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::handlers::health::ReadinessProbe;
use crate::AppState;

/// Creates an order
pub async fn create_order<S>(
    State(state): State<AppState<S>>,
    ValidatedJson(body): ValidatedJson<CreateOrderBody>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError>
where
    S: OrderStore + ReadinessProbe + 'static,
{
    let order_id = state.service.create_order(body.into()).await?;
    Ok((StatusCode::CREATED, Json(CreateOrderResponse { order_id })))
}
