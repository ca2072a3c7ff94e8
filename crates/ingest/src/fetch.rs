use crate::error::{IngestError, Result};
use crate::parse::{parse_csv, ParseOptions, ParsedRows};
use pocket_protocol::{data_url, ApiError, Dataset, LatestFileResponse};
use reqwest::Client;

/// Parsed rows of one resolved snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// URL the CSV was read from.
    pub source: String,
    pub rows: ParsedRows,
}

/// GETs `url` and returns the body, failing on non-success statuses.
pub async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| IngestError::Fetch {
            url: url.to_string(),
            status: None,
            message: err.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiError>(&body) {
            Ok(api) => format!("{} {}", status.as_u16(), api.error),
            Err(_) => status.to_string(),
        };
        return Err(IngestError::Fetch {
            url: url.to_string(),
            status: Some(status.as_u16()),
            message,
        });
    }

    response.text().await.map_err(|err| IngestError::Fetch {
        url: url.to_string(),
        status: Some(status.as_u16()),
        message: format!("failed to read body: {err}"),
    })
}

pub async fn fetch_and_parse(
    client: &Client,
    url: &str,
    options: &ParseOptions,
) -> Result<ParsedRows> {
    let text = fetch_text(client, url).await?;
    parse_csv(&text, options)
}

/// Asks the server which snapshot file is current for `dataset`.
pub async fn resolve_latest(client: &Client, base_url: &str, dataset: Dataset) -> Result<String> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), dataset.latest_path());
    let body = fetch_text(client, &url).await?;
    let latest: LatestFileResponse =
        serde_json::from_str(&body).map_err(|err| IngestError::Decode {
            url: url.clone(),
            message: err.to_string(),
        })?;
    if latest.latest_file.trim().is_empty() {
        return Err(IngestError::Decode {
            url,
            message: "latestFile is empty".to_string(),
        });
    }
    Ok(latest.latest_file)
}

/// Resolves the current snapshot of `dataset` and parses it.
pub async fn fetch_latest(
    client: &Client,
    base_url: &str,
    dataset: Dataset,
    options: &ParseOptions,
) -> Result<Snapshot> {
    let file = resolve_latest(client, base_url, dataset).await?;
    let source = data_url(base_url, &file);
    log::debug!("Fetching {dataset} snapshot {source}");
    let rows = fetch_and_parse(client, &source, options).await?;
    Ok(Snapshot { source, rows })
}
