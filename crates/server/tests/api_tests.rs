use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{Duration, Utc};
use tower::ServiceExt;

use puremeds_engine::EngineBuilder;
use puremeds_ledger::MemoryLedger;
use puremeds_server::api::{AppState, router};
use puremeds_store_memory::MemoryProductStore;

// -- Helpers --------------------------------------------------------------

struct TestApp {
    app: axum::Router,
    ledger: Arc<MemoryLedger>,
}

fn build_app() -> TestApp {
    let store = Arc::new(MemoryProductStore::new());
    let ledger = Arc::new(MemoryLedger::new());

    let engine = EngineBuilder::new()
        .store(store.clone())
        .ledger(ledger.clone())
        .build()
        .expect("engine should build");

    let state = AppState {
        engine: Arc::new(engine),
        store,
        max_upload_bytes: 5 * 1024 * 1024,
    };

    TestApp {
        app: router(state),
        ledger,
    }
}

fn new_product_json(batch_code: &str) -> serde_json::Value {
    serde_json::json!({
        "product_name": "Paracetamol",
        "chemical_name": "Acetaminophen",
        "manufacturer": "Acme",
        "price": 4.99,
        "purpose": "Pain relief",
        "side_effects": ["Nausea"],
        "category": "Pain Relief",
        "available_stock": 100,
        "batch_code": batch_code,
        "expiry_date": (Utc::now() + Duration::days(365)).to_rfc3339(),
    })
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post_json(app: &axum::Router, uri: &str, body: &serde_json::Value) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(http::Method::POST)
                .uri(uri)
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get(app: &axum::Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Register a batch through the API and return the response body.
async fn register(app: &axum::Router, batch_code: &str) -> serde_json::Value {
    let response = post_json(app, "/v1/products", &new_product_json(batch_code)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

fn multipart_upload(field: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "puremeds-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"qr.png\"\r\n\
             Content-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

async fn post_multipart(
    app: &axum::Router,
    uri: &str,
    field: &str,
    bytes: &[u8],
) -> axum::response::Response {
    let (content_type, body) = multipart_upload(field, bytes);
    app.clone()
        .oneshot(
            Request::builder()
                .method(http::Method::POST)
                .uri(uri)
                .header(http::header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

// -- Health ---------------------------------------------------------------

#[tokio::test]
async fn health_returns_200() {
    let t = build_app();

    let response = get(&t.app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["metrics"].is_object());
    assert_eq!(json["metrics"]["verifications"], 0);
}

// -- Registration ---------------------------------------------------------

#[tokio::test]
async fn register_returns_created_product() {
    let t = build_app();

    let body = register(&t.app, "PM-12345").await;
    let product = &body["product"];
    assert_eq!(product["batch_code"], "PM-12345");
    assert_eq!(product["fingerprint"].as_str().unwrap().len(), 64);
    assert!(body["tx_reference"].as_str().unwrap().starts_with("0x"));

    // The QR artifact is a base64 PNG.
    let png = B64
        .decode(product["qr_png"].as_str().unwrap())
        .expect("qr_png is base64");
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn register_duplicate_batch_conflicts() {
    let t = build_app();
    register(&t.app, "PM-1").await;

    let response = post_json(&t.app, "/v1/products", &new_product_json("PM-1")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("batch_code"));
}

#[tokio::test]
async fn register_invalid_batch_code_is_bad_request() {
    let t = build_app();

    let response = post_json(&t.app, "/v1/products", &new_product_json("BATCH-1")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_past_expiry_is_bad_request() {
    let t = build_app();

    let mut body = new_product_json("PM-2");
    body["expiry_date"] =
        serde_json::json!((Utc::now() - Duration::days(1)).to_rfc3339());
    let response = post_json(&t.app, "/v1/products", &body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_with_ledger_down_is_bad_gateway() {
    let t = build_app();
    t.ledger.set_available(false);

    let response = post_json(&t.app, "/v1/products", &new_product_json("PM-3")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

// -- Verification ---------------------------------------------------------

#[tokio::test]
async fn verify_known_fingerprint() {
    let t = build_app();
    let body = register(&t.app, "PM-12345").await;
    let fingerprint = body["product"]["fingerprint"].as_str().unwrap();

    let response = post_json(
        &t.app,
        "/v1/verify/fingerprint",
        &serde_json::json!({ "fingerprint": fingerprint }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["is_valid"], true);
    assert_eq!(json["is_known_to_store"], true);
    assert_eq!(json["is_expired"], false);
    assert_eq!(json["ledger_check"]["is_valid"], true);
    assert_eq!(json["message"], "Medicine verified successfully!");
    assert_eq!(json["product"]["chemical_name"], "Acetaminophen");
}

#[tokio::test]
async fn verify_unknown_fingerprint_is_200_not_error() {
    let t = build_app();

    let response = post_json(
        &t.app,
        "/v1/verify/fingerprint",
        &serde_json::json!({ "fingerprint": "ab".repeat(32) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["is_valid"], false);
    assert_eq!(json["is_known_to_store"], false);
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .contains("not distributed by PureMeds")
    );
}

#[tokio::test]
async fn verify_malformed_fingerprint_is_400() {
    let t = build_app();

    let response = post_json(
        &t.app,
        "/v1/verify/fingerprint",
        &serde_json::json!({ "fingerprint": "xyz" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verify_accepts_hash_field_alias() {
    let t = build_app();
    let body = register(&t.app, "PM-7").await;
    let fingerprint = body["product"]["fingerprint"].as_str().unwrap();

    let response = post_json(
        &t.app,
        "/v1/verify/fingerprint",
        &serde_json::json!({ "hash": fingerprint }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn verify_with_ledger_down_still_succeeds() {
    let t = build_app();
    let body = register(&t.app, "PM-4").await;
    let fingerprint = body["product"]["fingerprint"].as_str().unwrap().to_owned();

    t.ledger.set_available(false);
    let response = post_json(
        &t.app,
        "/v1/verify/fingerprint",
        &serde_json::json!({ "fingerprint": fingerprint }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["is_valid"], true);
    assert!(json["ledger_check"].is_null());
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .ends_with("Note: Blockchain verification unavailable.")
    );
}

#[tokio::test]
async fn verify_image_round_trip() {
    let t = build_app();
    let body = register(&t.app, "PM-12345").await;
    let png = B64
        .decode(body["product"]["qr_png"].as_str().unwrap())
        .unwrap();

    let response = post_multipart(&t.app, "/v1/verify/image", "qr_image", &png).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["is_valid"], true);
    assert_eq!(json["batch_code"], "PM-12345");
}

#[tokio::test]
async fn verify_image_with_garbage_is_400() {
    let t = build_app();

    let response =
        post_multipart(&t.app, "/v1/verify/image", "qr_image", b"not an image").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("unreadable image"));
}

#[tokio::test]
async fn verify_image_missing_field_is_400() {
    let t = build_app();

    let response = post_multipart(&t.app, "/v1/verify/image", "wrong_field", b"x").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// -- Catalog --------------------------------------------------------------

#[tokio::test]
async fn list_and_featured_products() {
    let t = build_app();
    for i in 1..=5 {
        register(&t.app, &format!("PM-{i}")).await;
    }

    let response = get(&t.app, "/v1/products?page=1&limit=2").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["total"], 5);
    assert_eq!(json["products"].as_array().unwrap().len(), 2);
    assert_eq!(json["total_pages"], 3);

    let response = get(&t.app, "/v1/products/featured").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn get_product_and_404() {
    let t = build_app();
    register(&t.app, "PM-1").await;

    let response = get(&t.app, "/v1/products/PM-1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["batch_code"], "PM-1");

    let response = get(&t.app, "/v1/products/PM-404").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_product_removes_verification() {
    let t = build_app();
    let body = register(&t.app, "PM-1").await;
    let fingerprint = body["product"]["fingerprint"].as_str().unwrap().to_owned();

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method(http::Method::DELETE)
                .uri("/v1/products/PM-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The batch is gone from the store, so verification now reports it
    // as not distributed.
    let response = post_json(
        &t.app,
        "/v1/verify/fingerprint",
        &serde_json::json!({ "fingerprint": fingerprint }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["is_valid"], false);
}

// -- Supply chain ---------------------------------------------------------

#[tokio::test]
async fn supply_chain_lookup_and_stock() {
    let t = build_app();
    register(&t.app, "PM-1").await;

    let response = get(&t.app, "/v1/supply-chain/PM-1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["batch_code"], "PM-1");
    assert_eq!(json["stock_remaining"], 100);
    assert_eq!(json["platform"]["name"], "PureMeds");

    let response = post_json(
        &t.app,
        "/v1/supply-chain/PM-1/stock",
        &serde_json::json!({ "quantity": 30 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["stock_remaining"], 70);

    let response = post_json(
        &t.app,
        "/v1/supply-chain/PM-1/stock",
        &serde_json::json!({ "quantity": -5 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(&t.app, "/v1/supply-chain/PM-404").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
