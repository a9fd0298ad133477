#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crm_console::api::ApiClient;
use crm_console::config::ConsoleConfig;
use crm_console::session::Session;

pub const TOKEN: &str = "test-token";
pub const PASSWORD: &str = "secret";

/// One request as seen by the mock backend
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
}

#[derive(Default)]
pub struct MockState {
    requests: Mutex<Vec<Recorded>>,
    delay: Mutex<Option<Duration>>,
}

impl MockState {
    /// Hold every organization list response for `delay` before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    fn delay(&self) -> Option<Duration> {
        *self.delay.lock().unwrap()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }

    fn record(&self, method: &'static str, path: String, headers: &HeaderMap, query: &HashMap<String, String>) {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
        self.requests.lock().unwrap().push(Recorded {
            method,
            path,
            query: query.clone(),
            authorization: header("authorization"),
            request_id: header("x-request-id"),
        });
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    /// Start an in-process CRM backend on a free port
    pub async fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind mock backend")?;
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/api/v1/auth/login", post(login))
            .route("/api/v1/users", get(users))
            .route("/api/v1/organizations", get(organizations).post(create_organization))
            .route("/api/v1/organizations/:id", axum::routing::delete(delete_organization))
            .route("/api/v1/products", get(products))
            .route("/api/v1/domains", get(domains))
            .route("/api/v1/subscriptions", get(subscriptions))
            .route("/api/v1/audit-logs", get(audit_logs))
            .with_state(state.clone());

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { base_url: format!("http://127.0.0.1:{}/api/v1", port), state })
    }

    pub fn config(&self) -> ConsoleConfig {
        self.config_with_timeout(5_000)
    }

    pub fn config_with_timeout(&self, request_timeout_ms: u64) -> ConsoleConfig {
        let mut config = ConsoleConfig::default();
        config.api.base_url = self.base_url.clone();
        config.api.request_timeout_ms = request_timeout_ms;
        config
    }

    /// Client with an empty in-memory session
    pub fn client(&self) -> Result<ApiClient> {
        Ok(ApiClient::new(&self.config(), Session::in_memory())?)
    }

    /// Client whose session already holds the valid token
    pub fn logged_in_client(&self) -> Result<ApiClient> {
        let session = Session::in_memory();
        session.establish(TOKEN, "bearer", None)?;
        Ok(ApiClient::new(&self.config(), session)?)
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN))
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Could not validate credentials" }))).into_response()
}

pub fn user_rows() -> Vec<Value> {
    vec![
        json!({ "id": 1, "email": "ada@acme.test", "full_name": "Ada", "role": "admin", "status": "active", "organization_id": 10 }),
        json!({ "id": 2, "email": "bob@acme.test", "full_name": "Bob", "role": "viewer", "status": "active", "organization_id": 10 }),
        json!({ "id": 3, "email": "cy@globex.test", "full_name": "Cy", "role": "admin", "status": "inactive", "organization_id": 20 }),
        json!({ "id": 4, "email": "di@globex.test", "full_name": "Di", "role": "admin", "status": "active", "organization_id": 20 }),
        json!({ "id": 5, "email": "ed@acme.test", "full_name": "Ed", "role": "Admin", "status": "active", "organization_id": 10 }),
    ]
}

async fn login(State(state): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    state.record("POST", "/auth/login".into(), &headers, &HashMap::new());
    if body["password"] != PASSWORD {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Incorrect email or password" }))).into_response();
    }
    Json(json!({
        "access_token": TOKEN,
        "token_type": "bearer",
        "expires_in": 3600,
        "user": { "id": 1, "email": body["email"], "name": "Test Admin", "role": "admin" }
    }))
    .into_response()
}

/// Paginated; rejects the `role` filter like the real backend does for some combinations
async fn users(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record("GET", "/users".into(), &headers, &query);
    if !authorized(&headers) {
        return unauthorized();
    }
    if query.contains_key("role") {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "detail": "role filter not supported with pagination" })))
            .into_response();
    }

    let matching: Vec<Value> = user_rows()
        .into_iter()
        .filter(|u| query.get("status").map_or(true, |s| u["status"] == s.as_str()))
        .filter(|u| {
            query.get("search").map_or(true, |s| u["email"].as_str().is_some_and(|e| e.contains(s.as_str())))
        })
        .collect();
    let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let page_size: usize = query.get("page_size").and_then(|p| p.parse().ok()).unwrap_or(25);
    let items: Vec<Value> = matching.iter().skip((page - 1) * page_size).take(page_size).cloned().collect();

    Json(json!({ "items": items, "total": matching.len(), "page": page, "page_size": page_size })).into_response()
}

/// Bare array
async fn organizations(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record("GET", "/organizations".into(), &headers, &query);
    if !authorized(&headers) {
        return unauthorized();
    }
    if let Some(delay) = state.delay() {
        tokio::time::sleep(delay).await;
    }
    Json(json!([
        { "id": 10, "name": "Acme", "slug": "acme", "status": "active", "tier": "enterprise", "user_count": 3 },
        { "id": 20, "name": "Globex", "slug": "globex", "status": "trial", "created_at": "2024-03-01T09:30:00Z" }
    ]))
    .into_response()
}

async fn create_organization(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    state.record("POST", "/organizations".into(), &headers, &HashMap::new());
    if !authorized(&headers) {
        return unauthorized();
    }
    body["id"] = json!(99);
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn delete_organization(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.record("DELETE", format!("/organizations/{}", id), &headers, &HashMap::new());
    if !authorized(&headers) {
        return unauthorized();
    }
    StatusCode::NO_CONTENT.into_response()
}

/// Paginated inside a `data` envelope
async fn products(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record("GET", "/products".into(), &headers, &query);
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "data": {
            "items": [{ "id": "p-1", "name": "CRM Seat", "category": "license", "price": "49.90", "status": "active" }],
            "total": 7
        }
    }))
    .into_response()
}

/// Unexpected shape
async fn domains(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record("GET", "/domains".into(), &headers, &query);
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "results": [] })).into_response()
}

async fn subscriptions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record("GET", "/subscriptions".into(), &headers, &query);
    (StatusCode::FORBIDDEN, Json(json!({ "detail": "Superuser privileges required: internal policy 7" }))).into_response()
}

/// Always answers as if the token had expired server-side
async fn audit_logs(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record("GET", "/audit-logs".into(), &headers, &query);
    unauthorized()
}
