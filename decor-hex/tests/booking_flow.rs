//! End-to-end booking flow over the HTTP surface.
//!
//! Drives the full lifecycle against an in-memory SQLite store and the
//! sandbox checkout provider: place a booking, assign a decorator, open a
//! checkout session, settle it, and settle it again.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use decor_checkout::SandboxCheckout;
use decor_hex::{MarketplaceService, inbound::HttpServer};
use decor_repo::SqliteRepo;

async fn test_app() -> (Router, SandboxCheckout) {
    let repo = SqliteRepo::new("sqlite::memory:").await.unwrap();
    let sandbox = SandboxCheckout::new();
    let service = MarketplaceService::new(repo, sandbox.clone());
    (HttpServer::new(service).router(), sandbox)
}

fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_full_booking_and_settlement_flow() {
    let (app, sandbox) = test_app().await;

    // 1. Place a booking: starts assigned, carries a tracking id.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/bookings",
            serde_json::json!({ "userEmail": "alice@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let booking = json_body(response).await;
    let booking_id = booking["id"].as_str().unwrap().to_string();
    let tracking_id = booking["trackingId"].as_str().unwrap().to_string();
    assert_eq!(booking["deliveryStatus"], "assigned");
    assert!(tracking_id.starts_with("PS-"));

    // 2. Assign a decorator: materials-prepared, assignedAt stamped.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            &format!("/bookings/{}/role", booking_id),
            serde_json::json!({
                "decoratorName": "Mina",
                "decoratorEmail": "mina@example.com",
                "decoratorStatus": "accepted"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let assigned = json_body(response).await;
    assert_eq!(assigned["deliveryStatus"], "materials-prepared");
    assert!(assigned["assignedAt"].is_string());

    // 3. Open a checkout session for the booking's cost.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/payment-checkout-session",
            serde_json::json!({
                "bookingId": booking_id,
                "trackingId": tracking_id,
                "cost": 450.0,
                "email": "alice@example.com",
                "serviceName": "Wedding stage decoration"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let session = json_body(response).await;
    let url = session["url"].as_str().unwrap();
    let session_id = url.rsplit('/').next().unwrap().to_string();

    // The customer completes the hosted flow.
    sandbox.mark_paid(&session_id).unwrap();

    // 4. Settle: booking moves to planning-phase, one ledger row appears.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            &format!("/payment-success?session_id={}", session_id),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let settlement = json_body(response).await;
    assert_eq!(settlement["success"], true);
    assert_eq!(settlement["alreadySettled"], false);
    assert_eq!(settlement["bookingUpdated"], true);
    assert_eq!(settlement["trackingId"], tracking_id.as_str());
    let transaction_id = settlement["transactionId"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(get_request("/bookings?email=alice@example.com"))
        .await
        .unwrap();
    let bookings = json_body(response).await;
    assert_eq!(bookings[0]["deliveryStatus"], "planning-phase");
    assert_eq!(bookings[0]["paymentStatus"], "paid");

    let response = app
        .clone()
        .oneshot(get_request("/payments?email=alice@example.com"))
        .await
        .unwrap();
    let payments = json_body(response).await;
    assert_eq!(payments.as_array().unwrap().len(), 1);
    assert_eq!(payments[0]["trackingId"], tracking_id.as_str());
    assert_eq!(payments[0]["amount"], 45000);

    // 5. Re-settle the same session: identical tracking id, no new ledger
    // row, booking untouched.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            &format!("/payment-success?session_id={}", session_id),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let replay = json_body(response).await;
    assert_eq!(replay["success"], true);
    assert_eq!(replay["alreadySettled"], true);
    assert_eq!(replay["trackingId"], tracking_id.as_str());
    assert_eq!(replay["transactionId"], transaction_id.as_str());

    let response = app
        .clone()
        .oneshot(get_request("/payments?email=alice@example.com"))
        .await
        .unwrap();
    let payments = json_body(response).await;
    assert_eq!(payments.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_user_registration_is_idempotent_per_email() {
    let (app, _) = test_app().await;

    let body = serde_json::json!({ "email": "deco@example.com", "role": "decorator" });

    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/users", body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created["status"], "pending");
    let first_id = created["id"].as_str().unwrap().to_string();

    // Same email again: 200 with the stored record, not a second insert.
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/users", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let existing = json_body(response).await;
    assert_eq!(existing["id"], first_id.as_str());

    let response = app.clone().oneshot(get_request("/users")).await.unwrap();
    let users = json_body(response).await;
    assert_eq!(users.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_role_lookup_defaults_to_user() {
    let (app, _) = test_app().await;

    let response = app
        .clone()
        .oneshot(get_request("/users/nobody@example.com/role"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn test_invalid_status_transition_is_rejected() {
    let (app, _) = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/bookings",
            serde_json::json!({ "userEmail": "alice@example.com" }),
        ))
        .await
        .unwrap();
    let booking = json_body(response).await;
    let booking_id = booking["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            &format!("/bookings/{}/status", booking_id),
            serde_json::json!({ "status": "completed" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("transition"));
}

#[tokio::test]
async fn test_malformed_ids_are_client_errors() {
    let (app, _) = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            "/bookings/not-a-uuid/status",
            serde_json::json!({ "status": "cancelled" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get_request("/services/not-a-uuid"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_booking_returns_404() {
    let (app, _) = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            &format!("/bookings/{}/role", uuid::Uuid::new_v4()),
            serde_json::json!({
                "decoratorName": "Mina",
                "decoratorEmail": "mina@example.com"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_crud_and_filters() {
    let (app, _) = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/services",
            serde_json::json!({
                "serviceName": "Wedding stage decoration",
                "category": "wedding",
                "cost": 450.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let listing = json_body(response).await;
    let listing_id = listing["id"].as_str().unwrap().to_string();

    app.clone()
        .oneshot(json_request(
            Method::POST,
            "/services",
            serde_json::json!({
                "serviceName": "Birthday balloons",
                "category": "birthday",
                "cost": 80.0
            }),
        ))
        .await
        .unwrap();

    // Substring search is case-insensitive.
    let response = app
        .clone()
        .oneshot(get_request("/services?search=WEDDING"))
        .await
        .unwrap();
    let hits = json_body(response).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);

    // Budget range filtering.
    let response = app
        .clone()
        .oneshot(get_request("/services?minBudget=50&maxBudget=100"))
        .await
        .unwrap();
    let hits = json_body(response).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);
    assert_eq!(hits[0]["category"], "birthday");

    let response = app
        .clone()
        .oneshot(get_request(&format!("/services/{}", listing_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/services/{}", listing_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/services/{}", listing_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
