//! HTTP API tests
//!
//! Drive the router over the in-memory order store with `axum-test`.

use axum::http::StatusCode;
use axum_test::TestServer;
use rust_decimal_macros::dec;

use domain_order::{CreateOrderRequest, StudentProductLabel};
use interface_api::dto::order::{CreateOrderResponse, StudentProductResponse};
use interface_api::error::ErrorResponse;
use interface_api::handlers::health::HealthResponse;
use interface_api::{create_router, AppState};
use test_utils::*;

fn server(harness: &OrderHarness) -> TestServer {
    TestServer::new(create_router(AppState::new(harness.service.clone()))).unwrap()
}

fn package_order(scenario: &PackageScenario) -> CreateOrderRequest {
    let start = DateFixtures::late_january();
    scenario.new_package_order(start, start)
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_and_readiness() {
        let scenario = PackageScenario::frequency_package();
        let harness = OrderHarness::new(scenario.catalog.clone(), DateFixtures::late_january());
        let server = server(&harness);

        let health = server.get("/health").await;
        health.assert_status_ok();
        assert_eq!(health.json::<HealthResponse>().status, "healthy");

        server.get("/health/ready").await.assert_status_ok();
    }
}

mod order_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_order() {
        let scenario = PackageScenario::frequency_package();
        let harness = OrderHarness::new(scenario.catalog.clone(), DateFixtures::late_january());
        let server = server(&harness);

        let response = server.post("/api/v1/orders").json(&package_order(&scenario)).await;

        response.assert_status(StatusCode::CREATED);
        let body: CreateOrderResponse = response.json();
        assert!(harness.store.order(body.order_id).await.is_some());
    }

    #[tokio::test]
    async fn test_empty_order_is_bad_request() {
        let scenario = PackageScenario::frequency_package();
        let harness = OrderHarness::new(scenario.catalog.clone(), DateFixtures::late_january());
        let server = server(&harness);

        let mut request = package_order(&scenario);
        request.order_items.clear();
        request.billing_items.clear();
        request.upcoming_billing_items.clear();

        let response = server.post("/api/v1/orders").json(&request).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let scenario = PackageScenario::frequency_package();
        let harness = OrderHarness::new(scenario.catalog.clone(), DateFixtures::late_january());
        let server = server(&harness);

        let response = server
            .post("/api/v1/orders")
            .json(&serde_json::json!({ "student_id": "not-a-uuid" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_wrong_price_is_rejected() {
        let scenario = PackageScenario::frequency_package();
        let harness = OrderHarness::new(scenario.catalog.clone(), DateFixtures::late_january());
        let server = server(&harness);

        let mut request = package_order(&scenario);
        request.billing_items[0].final_price += dec!(5);

        let response = server.post("/api/v1/orders").json(&request).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert!(!body.message.is_empty());
        assert!(harness.store.snapshot().await.orders.is_empty());
    }
}

mod student_product_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_student_product() {
        let scenario = PackageScenario::frequency_package();
        let harness = OrderHarness::new(scenario.catalog.clone(), DateFixtures::late_january());
        let server = server(&harness);
        server
            .post("/api/v1/orders")
            .json(&package_order(&scenario))
            .await
            .assert_status(StatusCode::CREATED);
        let sp = harness.student_products_labelled(StudentProductLabel::Created).await.remove(0);

        let response = server.get(&format!("/api/v1/student-products/{}", sp.id)).await;

        response.assert_status_ok();
        let body: StudentProductResponse = response.json();
        assert_eq!(body.student_product.id, sp.id);
        assert_final_prices(&body.bill_items, &[dec!(145), dec!(290), dec!(290)]);
    }

    #[tokio::test]
    async fn test_unknown_student_product_is_not_found() {
        let scenario = PackageScenario::frequency_package();
        let harness = OrderHarness::new(scenario.catalog.clone(), DateFixtures::late_january());
        let server = server(&harness);

        let response = server
            .get(&format!("/api/v1/student-products/{}", uuid::Uuid::new_v4()))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
