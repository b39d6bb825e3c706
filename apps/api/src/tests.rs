//! Router tests: requests go through the full stack (extractors, guards,
//! repositories, error envelope) against an in-memory database.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mbg_db::{Database, DbConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::{build_router, ApiConfig, AppState};

async fn test_app() -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = ApiConfig::from_lookup(|_| None).unwrap();
    build_router(Arc::new(AppState::new(db, config)))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn register(app: &Router, email: &str, role: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": email,
            "name": "Petugas",
            "password": "rahasia123",
            "role": role,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

async fn login(app: &Router, email: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "rahasia123" })),
    )
    .await
}

async fn token(app: &Router, email: &str) -> String {
    let (status, body) = login(app, email).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["accessToken"].as_str().unwrap().to_string()
}

/// Registers the first account (ADMIN) and returns its access token.
async fn admin(app: &Router) -> String {
    register(app, "admin@mbg.local", "ADMIN").await;
    token(app, "admin@mbg.local").await
}

/// Registers and approves a staff account, returning its access token.
async fn staff(app: &Router, admin: &str, email: &str, role: &str) -> String {
    let user = register(app, email, role).await;
    let id = user["id"].as_str().unwrap();
    let (status, _) = send(
        app,
        Method::POST,
        &format!("/api/users/{id}/approve"),
        Some(admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    token(app, email).await
}

async fn create(app: &Router, token: &str, uri: &str, body: Value) -> Value {
    let (status, body) = send(app, Method::POST, uri, Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{uri}: {body}");
    body["data"].clone()
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], "up");
}

#[tokio::test]
async fn test_registration_and_approval() {
    let app = test_app().await;
    let admin_token = admin(&app).await;

    let (_, me) = send(&app, Method::GET, "/api/auth/me", Some(&admin_token), None).await;
    assert_eq!(me["data"]["role"], "ADMIN");
    assert!(me["data"].get("passwordHash").is_none());

    let user = register(&app, "dapur@mbg.local", "KITCHEN_STAFF").await;
    assert_eq!(user["isApproved"], false);

    let (status, body) = login(&app, "dapur@mbg.local").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "FORBIDDEN");

    let id = user["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/users/{id}/approve"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let kitchen = token(&app, "dapur@mbg.local").await;
    let (_, me) = send(&app, Method::GET, "/api/auth/me", Some(&kitchen), None).await;
    assert_eq!(me["data"]["role"], "KITCHEN_STAFF");

    // Only ADMIN manages accounts
    let (status, _) = send(&app, Method::GET, "/api/users", Some(&kitchen), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_authentication_failures() {
    let app = test_app().await;
    admin(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/items", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, Method::GET, "/api/items", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "admin@mbg.local", "password": "salah-sekali" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token() {
    let app = test_app().await;
    register(&app, "admin@mbg.local", "ADMIN").await;
    let (_, session) = login(&app, "admin@mbg.local").await;
    let access = session["data"]["accessToken"].as_str().unwrap();
    let refresh = session["data"]["refreshToken"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/refresh",
        None,
        Some(json!({ "refreshToken": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["accessToken"].is_string());

    // An access token is not a refresh token
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/refresh",
        None,
        Some(json!({ "refreshToken": access })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // ...and a refresh token does not authenticate requests
    let (status, _) = send(&app, Method::GET, "/api/auth/me", Some(refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_item_crud_and_errors() {
    let app = test_app().await;
    let admin_token = admin(&app).await;
    let warehouse = staff(&app, &admin_token, "gudang@mbg.local", "WAREHOUSE_STAFF").await;
    let kitchen = staff(&app, &admin_token, "dapur@mbg.local", "KITCHEN_STAFF").await;

    let rice = json!({
        "sku": "BRS-01",
        "code": "BRS-01",
        "name": "Beras",
        "itemType": "RAW_MATERIAL",
        "unit": "kg",
        "reorderPoint": 100.0,
        "priceCents": 1250,
    });

    let (status, _) = send(&app, Method::POST, "/api/items", Some(&kitchen), Some(rice.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let item = create(&app, &warehouse, "/api/items", rice.clone()).await;
    assert_eq!(item["sku"], "BRS-01");

    let mut duplicate = rice;
    duplicate["code"] = json!("BRS-02");
    let (status, body) = send(&app, Method::POST, "/api/items", Some(&warehouse), Some(duplicate)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["fields"], json!(["sku"]));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/items",
        Some(&warehouse),
        Some(json!({ "sku": "", "code": "X", "name": "X", "itemType": "RAW_MATERIAL", "unit": "kg" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["fields"], json!(["sku"]));

    let (status, body) = send(&app, Method::GET, "/api/items/does-not-exist", Some(&kitchen), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, body) = send(&app, Method::GET, "/api/items?limit=1&search=beras", Some(&kitchen), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["pagination"]["limit"], 1);
    assert_eq!(body["data"][0]["sku"], "BRS-01");

    let (status, _) = send(&app, Method::GET, "/api/items?itemType=SOMETHING", Some(&kitchen), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_over_reservation_leaves_stock_unchanged() {
    let app = test_app().await;
    let admin_token = admin(&app).await;

    let warehouse = create(
        &app,
        &admin_token,
        "/api/locations",
        json!({ "code": "WH-01", "name": "Gudang Pusat", "type": "CENTRAL_WAREHOUSE" }),
    )
    .await;
    let meal = create(
        &app,
        &admin_token,
        "/api/items",
        json!({ "sku": "MEAL", "code": "MEAL", "name": "Paket", "itemType": "FINISHED_GOOD", "unit": "portion" }),
    )
    .await;
    let school = create(
        &app,
        &admin_token,
        "/api/beneficiaries",
        json!({ "code": "SDN-01", "name": "SD Negeri 01", "beneficiaryType": "SCHOOL", "targetPortions": 300 }),
    )
    .await;
    let stock = create(
        &app,
        &admin_token,
        "/api/stock",
        json!({
            "itemId": meal["id"],
            "locationId": warehouse["id"],
            "quantity": 100.0,
            "batchNumber": "B1",
        }),
    )
    .await;

    let order = json!({
        "beneficiaryId": school["id"],
        "sourceLocationId": warehouse["id"],
        "scheduledDate": "2026-03-02",
        "items": [{ "itemId": meal["id"], "quantity": 101.0 }],
    });
    let (status, body) = send(&app, Method::POST, "/api/delivery-orders", Some(&admin_token), Some(order)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");

    let stock_id = stock["id"].as_str().unwrap();
    let (_, body) = send(&app, Method::GET, &format!("/api/stock/{stock_id}"), Some(&admin_token), None).await;
    assert_eq!(body["data"]["quantity"], 100.0);
    assert_eq!(body["data"]["reservedQuantity"], 0.0);

    // A fitting order reserves, dispatches and is confirmed
    let order = json!({
        "beneficiaryId": school["id"],
        "sourceLocationId": warehouse["id"],
        "scheduledDate": "2026-03-02",
        "items": [{ "itemId": meal["id"], "quantity": 60.0 }],
    });
    let created_order = create(&app, &admin_token, "/api/delivery-orders", order).await;
    let id = created_order["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/delivery-orders/{id}/dispatch"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["deliveryOrder"]["status"], "DISPATCHED");

    // Cancelling after dispatch is an invalid transition
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/delivery-orders/{id}/cancel"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_STATUS_TRANSITION");

    let (_, body) = send(&app, Method::GET, &format!("/api/stock/{stock_id}"), Some(&admin_token), None).await;
    assert_eq!(body["data"]["quantity"], 40.0);
    assert_eq!(body["data"]["availableQuantity"], 40.0);
}

#[tokio::test]
async fn test_recipe_scale_endpoint() {
    let app = test_app().await;
    let admin_token = admin(&app).await;

    let meal = create(
        &app,
        &admin_token,
        "/api/items",
        json!({ "sku": "MEAL", "code": "MEAL", "name": "Paket", "itemType": "FINISHED_GOOD", "unit": "portion" }),
    )
    .await;
    let rice = create(
        &app,
        &admin_token,
        "/api/items",
        json!({ "sku": "RICE", "code": "RICE", "name": "Beras", "itemType": "RAW_MATERIAL", "unit": "kg", "priceCents": 1200 }),
    )
    .await;
    let recipe = create(
        &app,
        &admin_token,
        "/api/recipes",
        json!({
            "code": "NASI",
            "name": "Nasi",
            "outputItemId": meal["id"],
            "portionSize": 100.0,
            "portionUnit": "portion",
            "items": [{ "itemId": rice["id"], "quantity": 8.0, "unit": "kg" }],
        }),
    )
    .await;
    let id = recipe["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/recipes/{id}/scale?quantity=250"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ingredients"][0]["quantity"], 20.0);
    assert_eq!(body["data"]["totalCostCents"], 24_000);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/recipes/{id}/scale"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/recipes/{id}/scale?quantity=1e300"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"], json!(["quantity"]));
}

#[tokio::test]
async fn test_reporting_dashboard() {
    let app = test_app().await;
    let admin_token = admin(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/reporting/dashboard", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalItems"], 0);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/reporting/production?from=2026-03-05&to=2026-03-01",
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, "/api/reporting/expiring?days=7", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, body) =
        send(&app, Method::GET, "/api/reporting/expiring?days=100000000", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"], json!(["days"]));
}
