#![allow(dead_code)]

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

/// A request as seen by the fake backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

impl Recorded {
    /// Values of a url-encoded field, in body order. Repeated keys yield several values.
    pub fn form_values(&self, key: &str) -> Vec<String> {
        self.body
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .filter(|(k, _)| decode(k) == key)
            .map(|(_, v)| decode(v))
            .collect()
    }
}

fn decode(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(b) = u8::from_str_radix(&raw[i + 1..i + 3], 16) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[derive(Default)]
pub struct FakeBackend {
    pub requests: Mutex<Vec<Recorded>>,
    /// Settlement requests for this order id answer with an error envelope.
    pub fail_order: Mutex<Option<u64>>,
    pub media: Mutex<Vec<Value>>,
}

impl FakeBackend {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, prefix: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.starts_with(prefix))
            .collect()
    }

    fn record(&self, method: &'static str, path: String, headers: &HeaderMap, body: String) {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push(Recorded {
            method,
            path,
            authorization,
            body,
        });
    }
}

type Shared = Arc<FakeBackend>;

fn success(data: Value) -> Response {
    Json(json!({"status": "success", "message": "ok", "data": data})).into_response()
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"status": "error", "message": message}))).into_response()
}

fn is_expired(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "Bearer expired")
}

async fn list_shops(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.record("GET", "/api/shops".into(), &headers, String::new());
    success(json!({
        "data": [
            {"id": 1, "name": "Tea House", "user_id": 7, "is_active": "1"},
            {"id": "2", "name": "Spice Co", "user_id": 7, "is_active": 0}
        ],
        "current_page": 1,
        "last_page": 2,
        "per_page": 2,
        "total": 3
    }))
}

async fn get_shop(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    state.record("GET", format!("/api/shops/{id}"), &headers, String::new());
    if id == 1 {
        success(json!({"id": 1, "name": "Tea House", "user_id": 7}))
    } else {
        failure(StatusCode::NOT_FOUND, "Shop not found")
    }
}

async fn order_lines(
    State(state): State<Shared>,
    Path(user_id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    state.record("GET", format!("/api/orders/shop/{user_id}"), &headers, String::new());
    success(json!([
        {"id": 1, "order_id": 1, "order_item_id": 101, "line_total": "50.00", "is_settled": "0"},
        {"id": 2, "order": {"id": 1}, "order_item_id": 102, "line_total": 30, "is_settled": 0},
        {"id": 3, "order_id": "2", "line_total": "20", "is_settled": false},
        {"id": 4, "order_id": 3, "line_total": "15", "is_settled": "1"}
    ]))
}

async fn accounts(
    State(state): State<Shared>,
    Path(user_id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    state.record(
        "GET",
        format!("/api/bank-accounts/user/{user_id}"),
        &headers,
        String::new(),
    );
    success(json!([
        {"id": 5, "user_id": user_id, "bank_name": "City Bank", "account_name": "Karim",
         "account_no": "0012", "type": "bank", "route": "225"}
    ]))
}

async fn add_account(State(state): State<Shared>, headers: HeaderMap, body: String) -> Response {
    state.record("POST", "/api/bank-accounts/add".into(), &headers, body.clone());
    let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    if parsed["account_no"] == "000" {
        return failure(StatusCode::UNPROCESSABLE_ENTITY, "The account no has already been taken.");
    }
    let mut created = parsed;
    created["id"] = json!(99);
    success(created)
}

async fn settle(
    State(state): State<Shared>,
    Path(seller): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let recorded = Recorded {
        method: "POST",
        path: format!("/api/transactions/settle/{seller}"),
        authorization: None,
        body: body.clone(),
    };
    let order_id: Option<u64> = recorded
        .form_values("order_id")
        .first()
        .and_then(|v| v.parse().ok());
    state.record("POST", recorded.path, &headers, body);
    if order_id.is_some() && order_id == *state.fail_order.lock().unwrap() {
        return success_with_status("error", "Insufficient wallet balance");
    }
    success(Value::Null)
}

fn success_with_status(status: &str, message: &str) -> Response {
    Json(json!({"status": status, "message": message})).into_response()
}

async fn reverse(
    State(state): State<Shared>,
    Path(seller): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Response {
    state.record(
        "POST",
        format!("/api/transactions/reverse/{seller}"),
        &headers,
        body,
    );
    success(Value::Null)
}

async fn seller_report(
    State(state): State<Shared>,
    Path(user_id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    state.record("GET", format!("/api/reports/shop/{user_id}"), &headers, String::new());
    if is_expired(&headers) {
        return failure(StatusCode::UNAUTHORIZED, "Unauthenticated.");
    }
    success(json!({"total_shops": 2, "total_orders": 4, "total_sales": "115.00"}))
}

async fn shop_sales(
    State(state): State<Shared>,
    Path(shop_id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    state.record(
        "GET",
        format!("/api/reports/shop/sales/{shop_id}"),
        &headers,
        String::new(),
    );
    if shop_id == 2 {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    success(json!({"shop_id": shop_id, "total_orders": 3, "total_sales": 80}))
}

async fn transactions(
    State(state): State<Shared>,
    Path(user_id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    state.record(
        "GET",
        format!("/api/transactions/user/{user_id}"),
        &headers,
        String::new(),
    );
    success(json!({
        "data": [{"id": 1, "amount": "80", "type": "settlement", "source": "wallet", "order_id": 1}],
        "current_page": 1,
        "last_page": 1
    }))
}

async fn media_page(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.record("GET", "/api/media".into(), &headers, String::new());
    let items = state.media.lock().unwrap().clone();
    success(json!({"data": items, "current_page": 1, "last_page": 1}))
}

async fn media_upload(State(state): State<Shared>, headers: HeaderMap, body: String) -> Response {
    state.record("POST", "/api/media/upload".into(), &headers, body.clone());
    if !body.contains("filename=\"logo.png\"") {
        return failure(StatusCode::UNPROCESSABLE_ENTITY, "The file field is required.");
    }
    let mut media = state.media.lock().unwrap();
    let item = json!({
        "id": media.len() + 1,
        "url": "https://cdn.test/logo.png",
        "file_name": "logo.png"
    });
    media.insert(0, item.clone());
    success(item)
}

/// Serves the fake backend on an ephemeral port and returns its base URL.
pub async fn spawn_backend(state: Shared) -> String {
    let app = Router::new()
        .route("/api/shops", get(list_shops))
        .route("/api/shops/{id}", get(get_shop))
        .route("/api/orders/shop/{user_id}", get(order_lines))
        .route("/api/bank-accounts/user/{user_id}", get(accounts))
        .route("/api/bank-accounts/add", post(add_account))
        .route("/api/transactions/settle/{seller}", post(settle))
        .route("/api/transactions/reverse/{seller}", post(reverse))
        .route("/api/transactions/user/{user_id}", get(transactions))
        .route("/api/reports/shop/{user_id}", get(seller_report))
        .route("/api/reports/shop/sales/{shop_id}", get(shop_sales))
        .route("/api/media", get(media_page))
        .route("/api/media/upload", post(media_upload))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
