//! Integration tests for ShopHub.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shophub-integration-tests
//! ```
//!
//! No external services are needed. Behavioral tests drive
//! [`ShopSession`] over the in-memory `MockApi`; wire-contract tests run the
//! real `ApiClient` against [`FakeCommerceServer`], an in-process axum app
//! that records every request and replies with scripted responses.
//!
//! # Test Categories
//!
//! - `cart_sync` - local cart, hydration and push behavior
//! - `checkout_flow` - checkout ordering, validation and failure handling
//! - `api_client` - HTTP paths, methods, headers, bodies and error mapping

// Test support crate: panicking on broken fixtures is the desired behavior.
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use shophub_core::{Quantity, UserId, UserRole};
use shophub_storefront::api::mock::{MockApi, sample_product};
use shophub_storefront::config::ApiConfig;
use shophub_storefront::session::{AuthSession, BearerToken, SessionUser};
use shophub_storefront::{ApiClient, ShopSession};
use tokio::task::JoinHandle;

pub const PHONE: &str = "0911223344";
pub const ADDRESS: &str = "Bole Road, Addis Ababa";
pub const TOKEN: &str = "test-token-1";

pub const COFFEE: &str = "p-coffee";
pub const HONEY: &str = "p-honey";
pub const BERBERE: &str = "p-berbere";

#[must_use]
pub fn qty(n: u32) -> Quantity {
    Quantity::new(n).unwrap()
}

#[must_use]
pub fn account(role: UserRole) -> AuthSession {
    AuthSession::signed_in(
        SessionUser {
            id: UserId::new("u-100"),
            name: Some("Selam".to_string()),
            role,
        },
        BearerToken::new(TOKEN),
    )
}

#[must_use]
pub fn customer() -> AuthSession {
    account(UserRole::Customer)
}

/// A mock API with three products in its catalog.
#[must_use]
pub fn catalog() -> MockApi {
    MockApi::new()
        .with_product(sample_product(COFFEE, "Yirgacheffe Coffee", 450))
        .with_product(sample_product(HONEY, "Tigray White Honey", 300))
        .with_product(sample_product(BERBERE, "Berbere Spice", 120))
}

/// A signed-in customer session over [`catalog`].
#[must_use]
pub fn shop() -> ShopSession<MockApi> {
    ShopSession::new(catalog(), customer())
}

// =============================================================================
// Fake HTTP server
// =============================================================================

/// One request as the fake server saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Path relative to the API base, e.g. `/cart/mycart`.
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Clone)]
struct Scripted {
    status: StatusCode,
    body: String,
    retry_after: Option<u64>,
}

#[derive(Default)]
struct ServerState {
    requests: Vec<RecordedRequest>,
    responses: HashMap<(Method, String), Scripted>,
}

type Shared = Arc<Mutex<ServerState>>;

/// Mount point of the API, so tests also cover base URLs with a path.
const API_PREFIX: &str = "/api";

/// In-process commerce API with scripted responses.
///
/// Unscripted routes answer 404 with a JSON message.
pub struct FakeCommerceServer {
    base_url: String,
    state: Shared,
    task: JoinHandle<()>,
}

impl FakeCommerceServer {
    pub async fn start() -> Self {
        let state = Shared::default();
        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}{API_PREFIX}"),
            state,
            task,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A real client pointed at this server.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&ApiConfig::new(format!("{}/", self.base_url))).unwrap()
    }

    /// Answer `method path` with a JSON body.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: &Value) {
        self.script(method, path, status, body.to_string(), None);
    }

    /// Answer `method path` with a raw, possibly non-JSON body.
    pub fn respond_raw(&self, method: Method, path: &str, status: u16, body: &str) {
        self.script(method, path, status, body.to_string(), None);
    }

    /// Answer `method path` with 429 and a `Retry-After` header.
    pub fn rate_limit(&self, method: Method, path: &str, retry_after: u64) {
        self.script(
            method,
            path,
            429,
            json!({"message": "Too many requests"}).to_string(),
            Some(retry_after),
        );
    }

    fn script(&self, method: Method, path: &str, status: u16, body: String, retry_after: Option<u64>) {
        self.state.lock().unwrap().responses.insert(
            (method, path.to_string()),
            Scripted {
                status: StatusCode::from_u16(status).unwrap(),
                body,
                retry_after,
            },
        );
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// `METHOD /path` for every request so far.
    #[must_use]
    pub fn routes(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }
}

impl Drop for FakeCommerceServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix(API_PREFIX)
        .unwrap_or_else(|| uri.path())
        .to_string();
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = serde_json::from_slice(&body).ok();

    let mut state = state.lock().unwrap();
    state.requests.push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        authorization,
        body,
    });

    let Some(scripted) = state.responses.get(&(method, path)).cloned() else {
        return (
            StatusCode::NOT_FOUND,
            [(CONTENT_TYPE, "application/json")],
            json!({"message": "Route not found"}).to_string(),
        )
            .into_response();
    };

    let mut response = (
        scripted.status,
        [(CONTENT_TYPE, "application/json")],
        scripted.body,
    )
        .into_response();
    if let Some(seconds) = scripted.retry_after {
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(seconds));
    }
    response
}

/// JSON for a product as the API returns it.
#[must_use]
pub fn product_json(id: &str, name: &str, price: u32, stock: i64) -> Value {
    json!({
        "success": true,
        "product": {
            "_id": id,
            "name": name,
            "price": price,
            "stock": stock,
            "category": "Pantry",
            "images": [{"imageUrl": format!("https://cdn.shophub.test/{id}.jpg"), "imageId": id}],
            "description": "",
            "averageRating": 4.5,
            "totalRating": 12
        }
    })
}
