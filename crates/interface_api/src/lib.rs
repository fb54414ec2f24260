//! HTTP API Layer
//!
//! This crate provides the REST API for the order system using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: order creation, student product reads, health checks
//! - **Middleware**: request logging and tracing
//! - **DTOs**: validated request bodies and response bodies
//! - **Error Handling**: order error codes mapped onto HTTP statuses
//!
//! The router is generic over the order store, so the same routes run on
//! PostgreSQL in production and on the in-memory store in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::new(service));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_order::{OrderService, OrderStore};

use crate::handlers::health::ReadinessProbe;
use crate::handlers::{health, orders, student_products};
use crate::middleware::request_logging;

/// Application state shared across handlers
pub struct AppState<S: OrderStore> {
    pub service: OrderService<S>,
}

impl<S: OrderStore> AppState<S> {
    pub fn new(service: OrderService<S>) -> Self {
        Self { service }
    }
}

impl<S: OrderStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

/// Creates the main API router
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router<S>(state: AppState<S>) -> Router
where
    S: OrderStore + ReadinessProbe + 'static,
{
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check::<S>));

    let api_routes = Router::new()
        .route("/orders", post(orders::create_order::<S>))
        .route("/student-products/:id", get(student_products::get_student_product::<S>));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .map_response(|res: axum::http::Response<_>| res.map(axum::body::Body::new))
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(request_logging)),
        )
        .with_state(state)
}
