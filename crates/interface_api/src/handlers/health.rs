//! Health check handlers

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use domain_order::adapters::InMemoryOrderStore;
use domain_order::OrderStore;
use infra_db::PgOrderStore;

use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Whether a store can currently serve requests
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn is_ready(&self) -> bool;
}

#[async_trait]
impl ReadinessProbe for PgOrderStore {
    async fn is_ready(&self) -> bool {
        match self.health_check().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "Database not ready");
                false
            }
        }
    }
}

#[async_trait]
impl ReadinessProbe for InMemoryOrderStore {
    async fn is_ready(&self) -> bool {
        true
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check (includes the store)
pub async fn readiness_check<S>(State(state): State<AppState<S>>) -> Result<Json<HealthResponse>, StatusCode>
where
    S: OrderStore + ReadinessProbe + 'static,
{
    if !state.service.store().is_ready().await {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(HealthResponse {
        status: "ready".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
