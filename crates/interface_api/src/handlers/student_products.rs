//! Student product handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use core_kernel::StudentProductId;
use domain_order::OrderStore;

use crate::dto::order::StudentProductResponse;
use crate::error::ApiError;
use crate::handlers::health::ReadinessProbe;
use crate::AppState;

/// Gets a student product with its bill items
pub async fn get_student_product<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentProductResponse>, ApiError>
where
    S: OrderStore + ReadinessProbe + 'static,
{
    let view = state.service.student_product(StudentProductId::from_uuid(id)).await?;
    Ok(Json(view.into()))
}
