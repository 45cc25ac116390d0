//! Shared test utilities: an in-process mock of the insurance backend.
//!
//! The mock runs on its own thread and runtime so it works from both sync
//! (`assert_cmd`) and async (`tokio::test`) tests. It keeps records in memory,
//! checks the `x-api-key` header and can be told to fail selected routes. A
//! lenient mock accepts everything the real backend would reject.

#![allow(dead_code)]

use axum::extract::{Path, Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::net::TcpListener as StdTcpListener;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tokio::runtime::Builder;
use tokio::sync::oneshot;

pub const VALID_KEYS: &[&str] = &["demo-key-12345", "test-key-67890"];

/// Path of the API description shipped with the crate.
pub fn shipped_spec_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("openapi.yaml")
}

/// One request as the mock saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct SeenRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub api_key: Option<String>,
}

/// Forced answer for requests matching a method and path prefix.
#[derive(Debug, Clone)]
pub struct Fault {
    pub method: Method,
    pub path_prefix: String,
    pub status: StatusCode,
}

impl Fault {
    pub fn new(method: Method, path_prefix: &str, status: u16) -> Self {
        Self {
            method,
            path_prefix: path_prefix.to_string(),
            status: StatusCode::from_u16(status).expect("valid status"),
        }
    }
}

#[derive(Default)]
struct Store {
    records: BTreeMap<&'static str, Vec<Value>>,
    next_id: u64,
    audit: Vec<Value>,
}

impl Store {
    fn insert(&mut self, collection: &'static str, mut body: Map<String, Value>) -> Value {
        self.next_id += 1;
        let id = format!("{}-{:05}", collection.to_ascii_uppercase(), self.next_id);
        body.insert("id".into(), json!(id));
        body.insert("createdAt".into(), json!("2026-01-01T00:00:00Z"));
        let record = Value::Object(body);
        self.records.entry(collection).or_default().push(record.clone());
        self.audit("create", collection, &id);
        record
    }

    fn list(&self, collection: &str) -> Vec<Value> {
        self.records.get(collection).cloned().unwrap_or_default()
    }

    fn find_mut(&mut self, collection: &str, id: &str) -> Option<&mut Map<String, Value>> {
        self.records
            .get_mut(collection)?
            .iter_mut()
            .filter_map(Value::as_object_mut)
            .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
    }

    fn remove(&mut self, collection: &'static str, id: &str) -> bool {
        let Some(records) = self.records.get_mut(collection) else {
            return false;
        };
        let before = records.len();
        records.retain(|r| r.get("id").and_then(Value::as_str) != Some(id));
        let removed = records.len() != before;
        if removed {
            self.audit("delete", collection, id);
        }
        removed
    }

    fn audit(&mut self, action: &str, collection: &str, id: &str) {
        self.audit.push(json!({
            "action": action,
            "entityType": collection,
            "entityId": id,
        }));
    }
}

#[derive(Clone, Default)]
struct Mock {
    store: Arc<Mutex<Store>>,
    faults: Arc<Vec<Fault>>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    /// Skip key checks and validation, answer 200 for unknown ids.
    lenient: bool,
}

/// Handle to a running mock backend; shuts it down on drop.
pub struct MockBackend {
    base_url: String,
    state: Mock,
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<thread::JoinHandle<()>>,
}

impl MockBackend {
    pub fn start() -> Self {
        Self::with_faults(Vec::new())
    }

    pub fn with_faults(faults: Vec<Fault>) -> Self {
        Self::spawn(faults, false)
    }

    /// A backend that never rejects a request.
    pub fn lenient() -> Self {
        Self::spawn(Vec::new(), true)
    }

    fn spawn(faults: Vec<Fault>, lenient: bool) -> Self {
        let listener = StdTcpListener::bind("127.0.0.1:0").expect("bind mock backend");
        listener.set_nonblocking(true).expect("nonblocking listener");
        let addr = listener.local_addr().expect("local addr");

        let state = Mock {
            faults: Arc::new(faults),
            lenient,
            ..Mock::default()
        };
        let app = router(state.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let join = thread::spawn(move || {
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("mock runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).expect("tokio listener");
                let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                });
                let _ = server.await;
            });
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            shutdown: Some(shutdown_tx),
            join: Some(join),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.state.seen.lock().unwrap().clone()
    }

    pub fn records(&self, collection: &str) -> Vec<Value> {
        self.state.store.lock().unwrap().list(collection)
    }

    /// Insert a record directly, bypassing validation.
    pub fn seed(&self, collection: &'static str, body: Value) -> String {
        let body = body.as_object().cloned().unwrap_or_default();
        let record = self.state.store.lock().unwrap().insert(collection, body);
        record["id"].as_str().unwrap().to_string()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// A raw TCP backend that waits `delay`, then writes `reply` verbatim to
/// every connection. Returns its base URL.
pub fn raw_backend(delay: Duration, reply: &'static [u8]) -> String {
    let listener = StdTcpListener::bind("127.0.0.1:0").expect("bind raw backend");
    let addr = listener.local_addr().expect("addr");
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            thread::spawn(move || {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                thread::sleep(delay);
                let _ = stream.write_all(reply);
                let _ = stream.flush();
            });
        }
    });
    format!("http://{addr}")
}

/// A port nothing listens on.
pub fn closed_port_url() -> String {
    let listener = StdTcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

// ============================================================================
// Routing
// ============================================================================

const CRUD_COLLECTIONS: &[&str] = &[
    "policies",
    "claims",
    "customers",
    "quotes",
    "payments",
    "agents",
    "beneficiaries",
    "documents",
    "renewals",
    "endorsements",
    "inspections",
    "subrogation",
];

fn router(state: Mock) -> Router {
    let mut app: Router<Mock> = Router::new();
    for &name in CRUD_COLLECTIONS {
        app = app
            .route(
                &format!("/api/{name}"),
                get(move |State(s): State<Mock>| async move { list(&s, name) }).post(
                    move |State(s): State<Mock>, Json(body): Json<Value>| async move {
                        create(&s, name, body)
                    },
                ),
            )
            .route(
                &format!("/api/{name}/:id"),
                get(move |State(s): State<Mock>, Path(id): Path<String>| async move {
                    fetch(&s, name, &id)
                })
                .put(
                    move |State(s): State<Mock>, Path(id): Path<String>, Json(body): Json<Value>| async move {
                        update(&s, name, &id, body)
                    },
                )
                .delete(move |State(s): State<Mock>, Path(id): Path<String>| async move {
                    remove(&s, name, &id)
                }),
            );
    }

    for &name in &["reinsurance", "notifications", "telematics"] {
        app = app.route(
            &format!("/api/{name}"),
            get(move |State(s): State<Mock>| async move { list(&s, name) }).post(
                move |State(s): State<Mock>, Json(body): Json<Value>| async move {
                    create(&s, name, body)
                },
            ),
        );
    }

    app = app
        .route(
            "/api/claims/:id/approve",
            post(|State(s): State<Mock>, Path(id): Path<String>| async move {
                transition(&s, "claims", &id, "approved")
            }),
        )
        .route(
            "/api/claims/:id/reject",
            post(|State(s): State<Mock>, Path(id): Path<String>| async move {
                transition(&s, "claims", &id, "rejected")
            }),
        )
        .route(
            "/api/renewals/:id/approve",
            post(|State(s): State<Mock>, Path(id): Path<String>| async move {
                transition(&s, "renewals", &id, "approved")
            }),
        )
        .route(
            "/api/inspections/:id/complete",
            post(complete_inspection),
        )
        .route("/api/quotes/:id/convert", post(convert_quote))
        .route(
            "/api/risk-assessment",
            post(|State(s): State<Mock>, Json(body): Json<Value>| async move {
                create(&s, "risk-assessment", body)
            }),
        )
        .route("/api/risk-assessment/:policy_id", get(risk_by_policy))
        .route(
            "/api/payments/policy/:policy_id",
            get(|State(s): State<Mock>, Path(policy): Path<String>| async move {
                by_policy(&s, "payments", &policy)
            }),
        )
        .route(
            "/api/telematics/policy/:policy_id",
            get(|State(s): State<Mock>, Path(policy): Path<String>| async move {
                by_policy(&s, "telematics", &policy)
            }),
        )
        .route("/api/fraud-detection/analyze", post(analyze_fraud))
        .route(
            "/api/fraud-detection/reports",
            get(|State(s): State<Mock>| async move { list(&s, "fraud-reports") }),
        )
        .route("/api/analytics/claims-summary", get(claims_summary))
        .route("/api/analytics/policies-summary", get(policies_summary))
        .route("/api/analytics/loss-ratio", get(loss_ratio))
        .route("/api/audit-trail", get(audit_trail))
        .route("/api/auth/validate", post(|| async { Json(json!({ "valid": true })) }));

    app.layer(middleware::from_fn_with_state(state.clone(), inject_faults))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .with_state(state)
}

async fn record_request(State(state): State<Mock>, req: Request, next: Next) -> Response {
    let seen = SeenRequest {
        method: req.method().clone(),
        path: req.uri().path().to_string(),
        query: req.uri().query().map(str::to_string),
        api_key: req
            .headers()
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    state.seen.lock().unwrap().push(seen);
    next.run(req).await
}

async fn require_api_key(State(state): State<Mock>, req: Request, next: Next) -> Response {
    let valid = state.lenient
        || req
            .headers()
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|key| VALID_KEYS.contains(&key));
    if !valid {
        return error(StatusCode::UNAUTHORIZED, "Invalid or missing API key");
    }
    next.run(req).await
}

async fn inject_faults(State(state): State<Mock>, req: Request, next: Next) -> Response {
    let path = req.uri().path();
    if let Some(fault) = state
        .faults
        .iter()
        .find(|f| f.method == req.method() && path.starts_with(&f.path_prefix))
    {
        return error(fault.status, "Injected failure");
    }
    next.run(req).await
}

// ============================================================================
// Handlers
// ============================================================================

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn list(state: &Mock, collection: &str) -> Response {
    Json(Value::Array(state.store.lock().unwrap().list(collection))).into_response()
}

fn create(state: &Mock, collection: &'static str, body: Value) -> Response {
    let Value::Object(body) = body else {
        return error(StatusCode::BAD_REQUEST, "Request body must be an object");
    };
    if !state.lenient {
        if let Err(details) = validate(collection, &body) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Validation failed", "details": details })),
            )
                .into_response();
        }
    }
    let record = state.store.lock().unwrap().insert(collection, body);
    (StatusCode::CREATED, Json(record)).into_response()
}

fn validate(collection: &str, body: &Map<String, Value>) -> Result<(), Vec<String>> {
    let (required, positive): (&[&str], &str) = match collection {
        "policies" => (
            &[
                "policyNumber",
                "policyType",
                "holderName",
                "holderEmail",
                "premium",
                "coverageAmount",
                "startDate",
                "endDate",
            ],
            "premium",
        ),
        "claims" => (&["claimNumber", "policyId", "claimType", "claimAmount"], "claimAmount"),
        _ => return Ok(()),
    };

    let mut details: Vec<String> = required
        .iter()
        .filter(|field| !body.contains_key(**field))
        .map(|field| format!("{field} is required"))
        .collect();
    if let Some(value) = body.get(positive) {
        if !value.as_f64().is_some_and(|v| v > 0.0) {
            details.push(format!("{positive} must be a positive number"));
        }
    }
    if collection == "policies" {
        if let Some(kind) = body.get("policyType").and_then(Value::as_str) {
            if !["auto", "home", "life", "health"].contains(&kind) {
                details.push(format!("policyType {kind} is not supported"));
            }
        }
    }
    if details.is_empty() {
        Ok(())
    } else {
        Err(details)
    }
}

fn fetch(state: &Mock, collection: &str, id: &str) -> Response {
    let mut store = state.store.lock().unwrap();
    match store.find_mut(collection, id) {
        Some(record) => Json(Value::Object(record.clone())).into_response(),
        None if state.lenient => Json(json!({ "id": id })).into_response(),
        None => error(StatusCode::NOT_FOUND, "Resource not found"),
    }
}

fn update(state: &Mock, collection: &str, id: &str, body: Value) -> Response {
    let Value::Object(changes) = body else {
        return error(StatusCode::BAD_REQUEST, "Request body must be an object");
    };
    let mut store = state.store.lock().unwrap();
    let Some(record) = store.find_mut(collection, id) else {
        return error(StatusCode::NOT_FOUND, "Resource not found");
    };
    record.extend(changes);
    record.insert("updatedAt".into(), json!("2026-01-02T00:00:00Z"));
    let updated = Value::Object(record.clone());
    store.audit("update", collection, id);
    Json(updated).into_response()
}

fn remove(state: &Mock, collection: &'static str, id: &str) -> Response {
    if state.store.lock().unwrap().remove(collection, id) {
        Json(json!({ "message": "Deleted successfully" })).into_response()
    } else {
        error(StatusCode::NOT_FOUND, "Resource not found")
    }
}

fn transition(state: &Mock, collection: &str, id: &str, status: &str) -> Response {
    let mut store = state.store.lock().unwrap();
    let Some(record) = store.find_mut(collection, id) else {
        return error(StatusCode::NOT_FOUND, "Resource not found");
    };
    record.insert("status".into(), json!(status));
    let updated = Value::Object(record.clone());
    store.audit(status, collection, id);
    Json(updated).into_response()
}

fn by_policy(state: &Mock, collection: &str, policy_id: &str) -> Response {
    let matching: Vec<Value> = state
        .store
        .lock()
        .unwrap()
        .list(collection)
        .into_iter()
        .filter(|r| r.get("policyId").and_then(Value::as_str) == Some(policy_id))
        .collect();
    Json(Value::Array(matching)).into_response()
}

async fn risk_by_policy(State(state): State<Mock>, Path(policy_id): Path<String>) -> Response {
    let found = state
        .store
        .lock()
        .unwrap()
        .list("risk-assessment")
        .into_iter()
        .rev()
        .find(|r| r.get("policyId").and_then(Value::as_str) == Some(policy_id.as_str()));
    match found {
        Some(record) => Json(record).into_response(),
        None if state.lenient => Json(json!({ "policyId": policy_id })).into_response(),
        None => error(StatusCode::NOT_FOUND, "Risk assessment not found"),
    }
}

async fn complete_inspection(
    State(state): State<Mock>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut store = state.store.lock().unwrap();
    let Some(record) = store.find_mut("inspections", &id) else {
        return error(StatusCode::NOT_FOUND, "Resource not found");
    };
    record.insert("status".into(), json!("completed"));
    record.insert("findings".into(), body.get("findings").cloned().unwrap_or(Value::Null));
    record.insert("approved".into(), body.get("approved").cloned().unwrap_or(json!(false)));
    Json(Value::Object(record.clone())).into_response()
}

async fn convert_quote(State(state): State<Mock>, Path(id): Path<String>) -> Response {
    let mut store = state.store.lock().unwrap();
    let Some(quote) = store.find_mut("quotes", &id) else {
        return error(StatusCode::NOT_FOUND, "Quote not found");
    };
    if quote.get("status").and_then(Value::as_str) != Some("approved") {
        return error(StatusCode::BAD_REQUEST, "Only approved quotes can be converted");
    }
    quote.insert("status".into(), json!("converted"));
    let mut policy = Map::new();
    policy.insert("policyNumber".into(), json!(format!("POL-FROM-{id}")));
    policy.insert("policyType".into(), quote.get("policyType").cloned().unwrap_or(json!("auto")));
    policy.insert("holderName".into(), quote.get("customerName").cloned().unwrap_or(Value::Null));
    policy.insert("holderEmail".into(), quote.get("customerEmail").cloned().unwrap_or(Value::Null));
    policy.insert("coverageAmount".into(), quote.get("coverageAmount").cloned().unwrap_or(Value::Null));
    policy.insert("premium".into(), json!(1000.0));
    policy.insert("status".into(), json!("active"));
    policy.insert("quoteId".into(), json!(id));
    let record = store.insert("policies", policy);
    Json(record).into_response()
}

async fn analyze_fraud(State(state): State<Mock>, Json(body): Json<Value>) -> Response {
    let Some(claim_id) = body.get("claimId").and_then(Value::as_str) else {
        return error(StatusCode::BAD_REQUEST, "claimId is required");
    };
    let mut store = state.store.lock().unwrap();
    if store.find_mut("claims", claim_id).is_none() {
        return error(StatusCode::NOT_FOUND, "Claim not found");
    }
    let mut report = Map::new();
    report.insert("claimId".into(), json!(claim_id));
    report.insert("riskScore".into(), json!(12));
    report.insert("flagged".into(), json!(false));
    Json(store.insert("fraud-reports", report)).into_response()
}

fn amounts(records: &[Value], field: &str) -> f64 {
    records.iter().filter_map(|r| r.get(field).and_then(Value::as_f64)).sum()
}

async fn claims_summary(State(state): State<Mock>) -> Response {
    let claims = state.store.lock().unwrap().list("claims");
    let by_status = |status: &str| {
        claims
            .iter()
            .filter(|c| c.get("status").and_then(Value::as_str) == Some(status))
            .count()
    };
    Json(json!({
        "totalClaims": claims.len(),
        "pending": by_status("pending"),
        "approved": by_status("approved"),
        "rejected": by_status("rejected"),
        "totalAmount": amounts(&claims, "claimAmount"),
    }))
    .into_response()
}

async fn policies_summary(State(state): State<Mock>) -> Response {
    let policies = state.store.lock().unwrap().list("policies");
    Json(json!({
        "totalPolicies": policies.len(),
        "totalPremium": amounts(&policies, "premium"),
        "totalCoverage": amounts(&policies, "coverageAmount"),
    }))
    .into_response()
}

async fn loss_ratio(State(state): State<Mock>) -> Response {
    let store = state.store.lock().unwrap();
    let premium = amounts(&store.list("policies"), "premium");
    let paid = amounts(
        &store
            .list("claims")
            .into_iter()
            .filter(|c| c.get("status").and_then(Value::as_str) == Some("approved"))
            .collect::<Vec<_>>(),
        "claimAmount",
    );
    let ratio = if premium > 0.0 { paid / premium } else { 0.0 };
    Json(json!({ "lossRatio": ratio * 100.0, "totalClaims": paid, "totalPremiums": premium }))
        .into_response()
}

async fn audit_trail(State(state): State<Mock>) -> Response {
    Json(Value::Array(state.store.lock().unwrap().audit.clone())).into_response()
}
