use crate::http_api::{build_response, error_response, snapshot_error_response};
use axum::{
    extract::{Path, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use pocket_protocol::{
    Dataset, ErrorCode, HealthStatus, LatestFileResponse, HEALTH_PATH, LATEST_ANY_PATH,
};
use pocket_snapshot::SnapshotResolver;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

struct ServerState {
    resolver: SnapshotResolver,
}

/// Routes of the listings server, rooted at `data_dir`.
pub fn build_router(data_dir: impl Into<PathBuf>) -> Router {
    let state = Arc::new(ServerState {
        resolver: SnapshotResolver::new(data_dir.into()),
    });
    Router::new()
        .route(LATEST_ANY_PATH, get(latest_any))
        .route(Dataset::Routes.latest_path(), get(latest_routes))
        .route(Dataset::Solicitations.latest_path(), get(latest_solicitations))
        .route("/data/:file", get(data_file))
        .route(HEALTH_PATH, get(health))
        .fallback(unknown_route)
        .with_state(state)
}

async fn latest_any(State(state): State<Arc<ServerState>>) -> Response {
    resolve_latest(state, None).await
}

async fn latest_routes(State(state): State<Arc<ServerState>>) -> Response {
    resolve_latest(state, Some(Dataset::Routes)).await
}

async fn latest_solicitations(State(state): State<Arc<ServerState>>) -> Response {
    resolve_latest(state, Some(Dataset::Solicitations)).await
}

async fn resolve_latest(state: Arc<ServerState>, dataset: Option<Dataset>) -> Response {
    let scan = tokio::task::spawn_blocking(move || match dataset {
        Some(dataset) => state.resolver.latest(dataset),
        None => state.resolver.latest_any(),
    })
    .await;

    match scan {
        Ok(Ok(file)) => {
            log::debug!("Resolved latest snapshot: {}", file.name);
            build_response(
                StatusCode::OK,
                &LatestFileResponse {
                    latest_file: file.name,
                },
            )
        }
        Ok(Err(err)) => snapshot_error_response(&err),
        Err(err) => {
            log::error!("Snapshot scan task failed: {err}");
            error_response(ErrorCode::IoFailure, "Snapshot scan failed")
        }
    }
}

/// Content type of a servable data file, `None` for anything else.
fn data_content_type(name: &str) -> Option<&'static str> {
    let (_, extension) = name.rsplit_once('.')?;
    if extension.eq_ignore_ascii_case("csv") {
        Some("text/csv; charset=utf-8")
    } else if extension.eq_ignore_ascii_case("json") {
        Some("application/json")
    } else {
        None
    }
}

/// A bare file name: no separators, no parent references, not hidden.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && !name.contains(['/', '\\', '\0'])
}

async fn data_file(State(state): State<Arc<ServerState>>, Path(file): Path<String>) -> Response {
    if !is_plain_file_name(&file) {
        log::warn!("Rejected data request for {file:?}");
        return error_response(ErrorCode::InvalidRequest, format!("Invalid file name: {file}"));
    }
    let Some(content_type) = data_content_type(&file) else {
        return error_response(
            ErrorCode::InvalidRequest,
            format!("Only .csv and .json files are served: {file}"),
        );
    };

    let path = state.resolver.dir().join(&file);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (StatusCode::OK, [(CONTENT_TYPE, content_type)], bytes).into_response(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            error_response(ErrorCode::NotFound, format!("File not found: {file}"))
        }
        Err(err) => {
            log::error!("Failed to read {}: {err}", path.display());
            error_response(ErrorCode::IoFailure, format!("Cannot read {file}"))
        }
    }
}

async fn health() -> Response {
    build_response(StatusCode::OK, &HealthStatus::default())
}

async fn unknown_route() -> Response {
    error_response(ErrorCode::NotFound, "No such endpoint")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_with_path_parts_are_rejected() {
        assert!(is_plain_file_name("Routes_2024-06-01.csv"));
        for name in ["", "../secret.csv", "a/b.csv", "a\\b.csv", ".env", "x..csv"] {
            assert!(!is_plain_file_name(name), "{name}");
        }
    }

    #[test]
    fn only_csv_and_json_are_served() {
        assert_eq!(data_content_type("Routes_A.CSV"), Some("text/csv; charset=utf-8"));
        assert_eq!(data_content_type("config.json"), Some("application/json"));
        assert_eq!(data_content_type("notes.txt"), None);
        assert_eq!(data_content_type("README"), None);
    }
}
