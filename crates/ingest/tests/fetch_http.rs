use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use pocket_ingest::{
    fetch_and_parse, fetch_latest, DatasetLoader, IngestError, LoadOutcome, LoadState,
    ParseOptions,
};
use pocket_model::{CellValue, SolicitationRecord};
use pocket_protocol::{ApiError, Dataset, ErrorCode};
use std::time::Duration;

const SOLICITATIONS: &str = "id,title,status,description,posted_date,closing_date,min_experience,duration,budget\n\
    S-1,Rural Route 4,open,Six-day delivery,2024-05-01,2024-06-01,2,36,$90k\n";

async fn spawn_server() -> String {
    let app = Router::new()
        .route(
            "/api/latest-solicitations-csv",
            get(|| async { Json(serde_json::json!({ "latestFile": "Solicitations_2024.csv" })) }),
        )
        .route(
            "/api/latest-routes-csv",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(ApiError::new(ErrorCode::NotFound, "no routes snapshot")),
                )
            }),
        )
        .route(
            "/data/Solicitations_2024.csv",
            get(|| async { SOLICITATIONS }),
        )
        .route("/data/ragged.csv", get(|| async { "id,title\nS-1\n" }))
        .route(
            "/data/slow.csv",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(400)).await;
                "id\nOLD\n"
            }),
        )
        .route("/data/fast.csv", get(|| async { "id\nNEW\n" }))
        .route(
            "/data/broken.csv",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR.into_response() }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn fetch_latest_resolves_then_parses_snapshot() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let snapshot = fetch_latest(&client, &base, Dataset::Solicitations, &ParseOptions::default())
        .await
        .unwrap();
    assert_eq!(snapshot.source, format!("{base}/data/Solicitations_2024.csv"));
    assert_eq!(snapshot.rows.len(), 1);
    assert_eq!(
        snapshot.rows.rows[0].get("min_experience"),
        Some(&CellValue::Number(2.0))
    );
}

#[tokio::test]
async fn missing_snapshot_surfaces_not_found_with_server_message() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let err = fetch_latest(&client, &base, Dataset::Routes, &ParseOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");
    assert!(err.to_string().contains("no routes snapshot"), "{err}");
}

#[tokio::test]
async fn server_error_is_fetch_error_with_status() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let err = fetch_and_parse(&client, &format!("{base}/data/broken.csv"), &ParseOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn unreachable_host_is_fetch_error_without_status() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = fetch_and_parse(
        &reqwest::Client::new(),
        &format!("http://{addr}/data/x.csv"),
        &ParseOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, IngestError::Fetch { status: None, .. }), "{err:?}");
}

#[tokio::test]
async fn malformed_body_is_parse_error() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let err = fetch_and_parse(&client, &format!("{base}/data/ragged.csv"), &ParseOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Parse { .. }), "{err:?}");
}

#[tokio::test]
async fn loader_keeps_the_most_recent_request() {
    let base = spawn_server().await;
    let loader: DatasetLoader<SolicitationRecord> = DatasetLoader::new(reqwest::Client::new());

    let slow_url = format!("{base}/data/slow.csv");
    let fast_url = format!("{base}/data/fast.csv");
    let slow = loader.load(&slow_url);
    let fast = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        loader.load(&fast_url).await
    };
    let (slow, fast) = tokio::join!(slow, fast);

    assert_eq!(slow, LoadOutcome::Superseded);
    assert_eq!(fast, LoadOutcome::Applied);
    match loader.current() {
        LoadState::Ready {
            source, records, ..
        } => {
            assert_eq!(source, fast_url);
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].id, "NEW");
        }
        other => panic!("expected ready state, got {other:?}"),
    }
}

#[tokio::test]
async fn loader_load_latest_normalizes_records() {
    let base = spawn_server().await;
    let loader: DatasetLoader<SolicitationRecord> = DatasetLoader::new(reqwest::Client::new());

    assert_eq!(
        loader.load_latest(&base, Dataset::Solicitations).await,
        LoadOutcome::Applied
    );
    let state = loader.current();
    let records = state.records().expect("records");
    assert_eq!(records[0].title, "Rural Route 4");
    assert_eq!(records[0].duration, 36);
}
