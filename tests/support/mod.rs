//! Shared test support: an in-process fake of the storefront backend and
//! helpers for driving the cart router.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use dashmap::DashMap;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt; // for `oneshot`

use vibe_cart::backend::{CartBackend, HttpBackend};
use vibe_cart::cart::{AppState, CartStore, MemoryStorage};
use vibe_cart::config::Config;
use vibe_cart::router::create_app_router;

pub const TOKEN: &str = "shopper-token";

/// Handle on a running fake backend
#[derive(Clone)]
pub struct FakeBackend {
    pub base_url: String,
    /// Last synced cart per bearer token (`"anonymous"` without one)
    pub synced: Arc<DashMap<String, Value>>,
    /// Orders received, keyed by generated order id
    pub orders: Arc<DashMap<String, Value>>,
}

impl FakeBackend {
    pub fn config(&self) -> Config {
        Config::new(self.base_url.clone())
    }

    pub fn client(&self, token: Option<&str>) -> HttpBackend {
        let backend = HttpBackend::new(&self.config()).unwrap();
        match token {
            Some(token) => backend.with_token(token),
            None => backend,
        }
    }

    /// Waits until the synced cart for `key` satisfies `check`
    pub async fn wait_for_sync(&self, key: &str, check: impl Fn(&Value) -> bool) -> Value {
        for _ in 0..200 {
            if let Some(cart) = self.synced.get(key) {
                if check(cart.value()) {
                    return cart.value().clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("cart for {key} never reached the expected state");
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn sync_cart(
    State(fake): State<FakeBackend>,
    headers: HeaderMap,
    Json(cart): Json<Value>,
) -> impl IntoResponse {
    let key = bearer(&headers).unwrap_or_else(|| "anonymous".to_string());
    fake.synced.insert(key, cart);
    Json(json!({ "success": true }))
}

fn coupon_catalogue() -> Vec<Value> {
    vec![
        json!({
            "_id": "c1",
            "code": "VIBE10",
            "type": "percentage",
            "discount": 10,
            "validUntil": "2026-12-31"
        }),
        json!({
            "_id": "c2",
            "code": "MAKHANA20",
            "type": "percentage",
            "discount": 20,
            "category": "makhana"
        }),
        json!({
            "_id": "c3",
            "code": "FLAT50",
            "type": "fixed",
            "discount": 50
        }),
    ]
}

async fn validate_coupon(Json(body): Json<Value>) -> impl IntoResponse {
    let code = body["code"].as_str().unwrap_or_default().to_string();
    let order_amount = body["orderAmount"].as_f64().unwrap_or_default();

    if code == "BROKEN" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }
    if code == "EMPTY" {
        return Json(json!({ "success": true, "data": {} })).into_response();
    }

    match coupon_catalogue().into_iter().find(|c| c["code"] == code.as_str()) {
        Some(coupon) => {
            let discount = coupon["discount"].as_f64().unwrap_or_default();
            Json(json!({
                "success": true,
                "data": {
                    "coupon": coupon,
                    "discountAmount": order_amount * discount / 100.0
                }
            }))
            .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "Coupon not found" })),
        )
            .into_response(),
    }
}

async fn list_coupons() -> impl IntoResponse {
    Json(json!({ "success": true, "data": { "coupons": coupon_catalogue() } }))
}

async fn create_order(
    State(fake): State<FakeBackend>,
    headers: HeaderMap,
    Json(order): Json<Value>,
) -> impl IntoResponse {
    if bearer(&headers).is_none() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Not authorized" })),
        );
    }

    let out_of_stock = order["items"]
        .as_array()
        .map(|items| items.iter().any(|i| i["quantity"].as_u64() > Some(10)))
        .unwrap_or(false);
    if out_of_stock {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": "Insufficient stock" })),
        );
    }

    let id = format!("ord_{}", fake.orders.len() + 1);
    fake.orders.insert(id.clone(), order);
    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": { "order": { "_id": id, "status": "pending" } }
        })),
    )
}

/// Starts the fake backend on an ephemeral port
pub async fn spawn_fake_backend() -> FakeBackend {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let fake = FakeBackend {
        base_url: format!("http://{addr}/api/"),
        synced: Arc::new(DashMap::new()),
        orders: Arc::new(DashMap::new()),
    };

    let app = Router::new()
        .route("/api/cart/sync", put(sync_cart))
        .route("/api/coupons/validate", post(validate_coupon))
        .route("/api/coupons", get(list_coupons))
        .route("/api/orders", post(create_order))
        .with_state(fake.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    fake
}

/// Builds the cart router backed by `fake`, with in-memory storage
pub fn create_test_app(fake: &FakeBackend, token: Option<&str>) -> Router {
    let backend: Arc<dyn CartBackend> = Arc::new(fake.client(token));
    let store = CartStore::new(Box::new(MemoryStorage::new()), backend);
    create_app_router(Arc::new(AppState::new(store)))
}

/// Helper function to send a JSON request and get the response
pub async fn send_request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(serde_json::to_string(&body).unwrap())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));

    (status, body)
}

/// A product with a single `100g` variant
pub fn makhana(stock: Option<u32>) -> Value {
    json!({
        "_id": "P",
        "name": "Peri Peri Makhana",
        "image": "/images/makhana.png",
        "category": "makhana",
        "sizes": [{ "size": "100g", "price": 150, "stock": stock }]
    })
}

pub fn chips() -> Value {
    json!({
        "_id": "C",
        "name": "Ragi Chips",
        "category": "chips",
        "sizes": [{ "size": "50g", "price": 100, "stock": 20 }]
    })
}

pub fn shipping_address() -> Value {
    json!({
        "firstName": "Asha",
        "lastName": "Rao",
        "address": "12 MG Road",
        "city": "Pune",
        "state": "MH",
        "pincode": "411001",
        "phone": "9999999999"
    })
}
