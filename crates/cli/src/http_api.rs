use axum::{
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
};
use pocket_protocol::{serialize_json, ApiError, ErrorCode};
use pocket_snapshot::SnapshotError;
use serde::Serialize;

pub(crate) fn build_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serialize_json(body) {
        Ok(json) => (status, [(CONTENT_TYPE, "application/json")], json).into_response(),
        Err(err) => {
            log::error!("Failed to serialize response body: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub(crate) fn error_response(code: ErrorCode, message: impl Into<String>) -> Response {
    let status = match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::IoFailure => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
    };
    build_response(status, &ApiError::new(code, message))
}

pub(crate) fn snapshot_error_response(err: &SnapshotError) -> Response {
    match err {
        SnapshotError::NotFound { .. } => {
            log::debug!("{err}");
            error_response(ErrorCode::NotFound, err.to_string())
        }
        SnapshotError::Io { .. } => {
            log::error!("{err}");
            error_response(ErrorCode::IoFailure, err.to_string())
        }
    }
}
