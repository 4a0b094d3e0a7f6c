//! In-memory stand-in for the Cloud Build v1 builds API.
//!
//! Builds are stored as raw JSON objects per project so the server stays
//! independent of the client's schema. Every route requires a bearer token.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const METADATA_TYPE: &str =
    "type.googleapis.com/google.devtools.cloudbuild.v1.BuildOperationMetadata";

/// Builds per project, oldest first.
pub type Db = Arc<RwLock<HashMap<String, Vec<Map<String, Value>>>>>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page_size: Option<usize>,
    pub page_token: Option<String>,
    pub filter: Option<String>,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/v1/projects/{project}/builds", get(list_builds).post(create_build))
        .route("/v1/projects/{project}/builds/{id}", get(get_build).post(build_action))
        .layer(middleware::from_fn(require_bearer))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    info!(addr = ?listener.local_addr().ok(), "mock cloud build listening");
    axum::serve(listener, app()).await
}

/// The service's `{"error": {...}}` envelope.
fn error(status: StatusCode, message: impl Into<String>, reason: &str) -> Response {
    let body = json!({
        "error": {
            "code": status.as_u16(),
            "message": message.into(),
            "status": reason,
        }
    });
    (status, Json(body)).into_response()
}

fn not_found(id: &str) -> Response {
    error(StatusCode::NOT_FOUND, format!("Build {id} not found"), "NOT_FOUND")
}

async fn require_bearer(req: Request, next: Next) -> Response {
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.strip_prefix("Bearer ").is_some_and(|t| !t.is_empty()));
    if !authorized {
        return error(
            StatusCode::UNAUTHORIZED,
            "Request is missing required authentication credential.",
            "UNAUTHENTICATED",
        );
    }
    next.run(req).await
}

fn field<'a>(build: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    build.get(key).and_then(Value::as_str)
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Queue `fields` as a new build and return its operation.
fn enqueue(builds: &mut Vec<Map<String, Value>>, project: &str, mut fields: Map<String, Value>) -> Value {
    let id = Uuid::new_v4().to_string();
    fields.insert("id".into(), Value::String(id.clone()));
    fields.insert("projectId".into(), Value::String(project.to_string()));
    fields.insert("status".into(), Value::String("QUEUED".into()));
    fields.insert("createTime".into(), Value::String(now()));
    fields.insert(
        "logUrl".into(),
        Value::String(format!("https://console.cloud.google.com/cloud-build/builds/{id}?project={project}")),
    );
    builds.push(fields.clone());
    debug!(project, id, "build queued");

    json!({
        "name": format!("operations/build/{project}/{id}"),
        "metadata": {"@type": METADATA_TYPE, "build": fields},
        "done": false,
    })
}

async fn create_build(
    State(db): State<Db>,
    Path(project): Path<String>,
    Json(fields): Json<Map<String, Value>>,
) -> Response {
    let steps_ok = fields.get("steps").and_then(Value::as_array).is_some_and(|s| !s.is_empty());
    if !steps_ok {
        return error(StatusCode::BAD_REQUEST, "invalid build: no build steps", "INVALID_ARGUMENT");
    }
    let mut db = db.write().await;
    let op = enqueue(db.entry(project.clone()).or_default(), &project, fields);
    Json(op).into_response()
}

async fn get_build(State(db): State<Db>, Path((project, id)): Path<(String, String)>) -> Response {
    let db = db.read().await;
    db.get(&project)
        .and_then(|builds| builds.iter().find(|b| field(b, "id") == Some(id.as_str())))
        .map(|b| Json(Value::Object(b.clone())).into_response())
        .unwrap_or_else(|| not_found(&id))
}

/// `POST .../builds/{id}:cancel` and `POST .../builds/{id}:retry`.
async fn build_action(State(db): State<Db>, Path((project, target)): Path<(String, String)>) -> Response {
    let Some((id, action)) = target.rsplit_once(':') else {
        return error(StatusCode::NOT_FOUND, format!("unknown method {target}"), "NOT_FOUND");
    };

    let mut db = db.write().await;
    let builds = db.entry(project.clone()).or_default();
    let Some(index) = builds.iter().position(|b| field(b, "id") == Some(id)) else {
        return not_found(id);
    };

    match action {
        "cancel" => {
            let build = &mut builds[index];
            if matches!(field(build, "status"), Some("QUEUED" | "PENDING" | "WORKING")) {
                build.insert("status".into(), Value::String("CANCELLED".into()));
                build.insert("finishTime".into(), Value::String(now()));
            }
            Json(Value::Object(build.clone())).into_response()
        }
        "retry" => {
            let original = &builds[index];
            let mut fields = Map::new();
            for key in ["source", "steps", "timeout", "options", "substitutions", "tags", "images", "artifacts"] {
                if let Some(v) = original.get(key) {
                    fields.insert(key.to_string(), v.clone());
                }
            }
            let op = enqueue(builds, &project, fields);
            Json(op).into_response()
        }
        other => error(StatusCode::NOT_FOUND, format!("unknown method {other}"), "NOT_FOUND"),
    }
}

/// Only `status="X"` filters are understood; anything else is rejected.
fn parse_filter(filter: &str) -> Option<String> {
    let value = filter.trim().strip_prefix("status=")?;
    let value = value.strip_prefix('"')?.strip_suffix('"')?;
    Some(value.to_string())
}

/// Offset of the following page, if any builds remain past this one.
fn next_page_token(offset: usize, page_size: usize, total: usize) -> Option<usize> {
    let next = offset.saturating_add(page_size);
    (next < total).then_some(next)
}

async fn list_builds(
    State(db): State<Db>,
    Path(project): Path<String>,
    Query(params): Query<ListParams>,
) -> Response {
    let wanted = match params.filter.as_deref().filter(|f| !f.is_empty()) {
        Some(f) => match parse_filter(f) {
            Some(status) => Some(status),
            None => return error(StatusCode::BAD_REQUEST, format!("unsupported filter {f}"), "INVALID_ARGUMENT"),
        },
        None => None,
    };
    let offset = match params.page_token.as_deref().filter(|t| !t.is_empty()) {
        Some(t) => match t.parse::<usize>() {
            Ok(n) => n,
            Err(_) => return error(StatusCode::BAD_REQUEST, "invalid page token", "INVALID_ARGUMENT"),
        },
        None => 0,
    };
    let page_size = params.page_size.filter(|n| *n > 0).unwrap_or(50);

    let db = db.read().await;
    let matching: Vec<&Map<String, Value>> = db
        .get(&project)
        .map(|builds| {
            builds
                .iter()
                .rev()
                .filter(|b| wanted.is_none() || field(b, "status") == wanted.as_deref())
                .collect()
        })
        .unwrap_or_default();

    let page: Vec<Value> = matching
        .iter()
        .skip(offset)
        .take(page_size)
        .map(|b| Value::Object((*b).clone()))
        .collect();

    let mut body = Map::new();
    if !page.is_empty() {
        body.insert("builds".into(), Value::Array(page));
    }
    if let Some(next) = next_page_token(offset, page_size, matching.len()) {
        body.insert("nextPageToken".into(), Value::String(next.to_string()));
    }
    Json(Value::Object(body)).into_response()
}
