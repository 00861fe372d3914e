//! REST front for the sidecar router. Each route builds the same
//! `{method, params}` request the stdio protocol uses and unwraps the
//! response envelope into an HTTP status and JSON body.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::ipc::{self, AppState, Request};

type Shared = Arc<Mutex<AppState>>;

pub fn status_for_code(code: &str) -> StatusCode {
    match code {
        "bad_params" | "bad_json" => StatusCode::BAD_REQUEST,
        "not_found" | "not_implemented" => StatusCode::NOT_FOUND,
        "no_workspace" => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Internal failures keep their code but never their message.
pub fn unwrap_envelope(envelope: Value) -> (StatusCode, Value) {
    if envelope.get("ok").and_then(|v| v.as_bool()) == Some(true) {
        let result = envelope.get("result").cloned().unwrap_or(Value::Null);
        return (StatusCode::OK, result);
    }
    let code = envelope
        .pointer("/error/code")
        .and_then(|v| v.as_str())
        .unwrap_or("internal");
    let status = status_for_code(code);
    let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
        json!({ "error": { "code": code, "message": "internal server error" } })
    } else {
        json!({ "error": envelope.get("error").cloned().unwrap_or(Value::Null) })
    };
    (status, body)
}

async fn dispatch(state: Shared, method: &str, params: Value) -> Response {
    let req = Request {
        id: Uuid::new_v4().to_string(),
        method: method.to_string(),
        params,
    };
    let joined = tokio::task::spawn_blocking(move || {
        let mut guard = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        ipc::handle_request(&mut guard, req)
    })
    .await;

    match joined {
        Ok(envelope) => {
            let (status, body) = unwrap_envelope(envelope);
            (status, Json(body)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "request task failed");
            let (status, body) = unwrap_envelope(ipc::err("", "internal", "task failed", None));
            (status, Json(body)).into_response()
        }
    }
}

fn with_query(query: HashMap<String, String>, extra: Value) -> Value {
    let mut params = json!(query);
    if let (Some(obj), Value::Object(extra)) = (params.as_object_mut(), extra) {
        obj.extend(extra);
    }
    params
}

/// `POST /api/jobs` accepts a bare job, a bare array, or `{jobs: [...]}`.
pub fn jobs_body_params(body: Value) -> Value {
    if body.is_array() {
        return json!({ "jobs": body });
    }
    if body.get("jobs").is_some() || body.get("job").is_some() {
        return body;
    }
    json!({ "job": body })
}

async fn health(State(state): State<Shared>) -> Response {
    dispatch(state, "health", json!({})).await
}

async fn import_clearance(
    State(state): State<Shared>,
    Path((year, month)): Path<(String, String)>,
) -> Response {
    let params = json!({ "year": year, "month": month });
    dispatch(state, "analytics.importClearance", params).await
}

async fn import_clearance_for_importer(
    State(state): State<Shared>,
    Path((year, month, importer)): Path<(String, String, String)>,
) -> Response {
    let params = json!({ "year": year, "month": month, "importer": importer });
    dispatch(state, "analytics.importClearance", params).await
}

async fn import_clearance_for_ie_code(
    State(state): State<Shared>,
    Path((year, month, ie_code)): Path<(String, String, String)>,
) -> Response {
    let params = json!({ "year": year, "month": month, "ieCode": ie_code });
    dispatch(state, "analytics.importClearance", params).await
}

async fn date_validity(
    State(state): State<Shared>,
    Path(year): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let params = with_query(query, json!({ "year": year }));
    dispatch(state, "analytics.dateValidity", params).await
}

async fn event_timeline(
    State(state): State<Shared>,
    Path(year): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let params = with_query(query, json!({ "year": year }));
    dispatch(state, "analytics.eventTimeline", params).await
}

async fn status_distribution(
    State(state): State<Shared>,
    Path(year): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let params = with_query(query, json!({ "year": year }));
    dispatch(state, "analytics.statusDistribution", params).await
}

async fn importers(State(state): State<Shared>, Path(year): Path<String>) -> Response {
    dispatch(state, "importers.list", json!({ "year": year })).await
}

async fn jobs_list(
    State(state): State<Shared>,
    Path(year): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let params = with_query(query, json!({ "year": year }));
    dispatch(state, "jobs.list", params).await
}

async fn jobs_get(
    State(state): State<Shared>,
    Path((year, job_no)): Path<(String, String)>,
) -> Response {
    dispatch(state, "jobs.get", json!({ "year": year, "jobNo": job_no })).await
}

async fn jobs_delete(
    State(state): State<Shared>,
    Path((year, job_no)): Path<(String, String)>,
) -> Response {
    dispatch(state, "jobs.delete", json!({ "year": year, "jobNo": job_no })).await
}

async fn jobs_upsert(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    dispatch(state, "jobs.upsert", jobs_body_params(body)).await
}

pub fn router(state: AppState) -> Router {
    let shared: Shared = Arc::new(Mutex::new(state));
    Router::new()
        .route("/api/health", get(health))
        .route("/api/import-clearance/{year}/{month}", get(import_clearance))
        .route(
            "/api/import-clearance/{year}/{month}/{importer}",
            get(import_clearance_for_importer),
        )
        .route(
            "/api/import-clearance/{year}/{month}/ie-code/{ie_code}",
            get(import_clearance_for_ie_code),
        )
        .route("/api/date-validity/{year}", get(date_validity))
        .route("/api/event-timeline/{year}", get(event_timeline))
        .route("/api/status-distribution/{year}", get(status_distribution))
        .route("/api/importers/{year}", get(importers))
        .route("/api/jobs", post(jobs_upsert))
        .route("/api/jobs/{year}", get(jobs_list))
        .route("/api/jobs/{year}/{job_no}", get(jobs_get).delete(jobs_delete))
        .with_state(shared)
}

pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "serving REST API");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
