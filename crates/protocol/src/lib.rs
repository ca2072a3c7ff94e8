use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ROUTES_PREFIX: &str = "Routes_";
pub const SOLICITATIONS_PREFIX: &str = "Solicitations_";

/// Logical dataset served by the site. Each one maps to a snapshot file prefix
/// and a dedicated "latest file" endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Routes,
    Solicitations,
}

impl Dataset {
    pub const ALL: [Dataset; 2] = [Dataset::Routes, Dataset::Solicitations];

    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Routes => ROUTES_PREFIX,
            Self::Solicitations => SOLICITATIONS_PREFIX,
        }
    }

    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Routes => "routes",
            Self::Solicitations => "solicitations",
        }
    }

    /// Path of the endpoint resolving this dataset's current snapshot.
    #[must_use]
    pub const fn latest_path(self) -> &'static str {
        match self {
            Self::Routes => "/api/latest-routes-csv",
            Self::Solicitations => "/api/latest-solicitations-csv",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Dataset {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "routes" | "route" => Ok(Self::Routes),
            "solicitations" | "solicitation" => Ok(Self::Solicitations),
            other => anyhow::bail!("unknown dataset '{other}' (expected routes|solicitations)"),
        }
    }
}

pub const LATEST_ANY_PATH: &str = "/api/latest-csv";
pub const HEALTH_PATH: &str = "/api/health";
pub const DATA_PATH_PREFIX: &str = "/data";

/// Body of a successful snapshot resolution.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LatestFileResponse {
    pub latest_file: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    IoFailure,
    InvalidRequest,
}

/// JSON error body returned by every endpoint. `error` carries the
/// human-readable message.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct ApiError {
    pub error: String,
    pub code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, error: impl Into<String>) -> Self {
        let hint = match code {
            ErrorCode::NotFound => Some(
                "Upload a snapshot named <Prefix>_<suffix>.csv into the data directory."
                    .to_string(),
            ),
            ErrorCode::IoFailure => {
                Some("Check that the data directory exists and is readable.".to_string())
            }
            ErrorCode::InvalidRequest => None,
        };
        Self {
            error: error.into(),
            code,
            hint,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            message: "Server is running".to_string(),
        }
    }
}

/// Static URL of a resolved snapshot file.
#[must_use]
pub fn data_url(base_url: &str, file_name: &str) -> String {
    format!(
        "{}{DATA_PATH_PREFIX}/{file_name}",
        base_url.trim_end_matches('/')
    )
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn latest_file_uses_camel_case_key() {
        let body = serialize_json(&LatestFileResponse {
            latest_file: "Routes_2024-05.csv".to_string(),
        })
        .unwrap();
        assert_eq!(body, r#"{"latestFile":"Routes_2024-05.csv"}"#);
    }

    #[test]
    fn api_error_always_carries_error_key() {
        let value = serde_json::to_value(ApiError::new(ErrorCode::NotFound, "nothing")).unwrap();
        assert_eq!(value["error"], "nothing");
        assert_eq!(value["code"], "not_found");
    }

    #[test]
    fn dataset_parses_singular_and_plural() {
        assert_eq!("Routes".parse::<Dataset>().unwrap(), Dataset::Routes);
        assert_eq!(
            " solicitation ".parse::<Dataset>().unwrap(),
            Dataset::Solicitations
        );
        assert!("executives".parse::<Dataset>().is_err());
    }

    #[test]
    fn data_url_joins_without_double_slash() {
        assert_eq!(
            data_url("http://127.0.0.1:5000/", "Routes_A.csv"),
            "http://127.0.0.1:5000/data/Routes_A.csv"
        );
    }
}
