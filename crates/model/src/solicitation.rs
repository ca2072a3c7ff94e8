use crate::normalize::{FieldReader, Normalize};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum SolicitationStatus {
    #[default]
    Open,
    Closing,
    Review,
}

impl SolicitationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Review => "review",
        }
    }

    /// Case-insensitive, `None` for anything unrecognized.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "open" => Some(Self::Open),
            "closing" => Some(Self::Closing),
            "review" => Some(Self::Review),
            _ => None,
        }
    }
}

impl fmt::Display for SolicitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contract solicitation open for bids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SolicitationRecord {
    pub id: String,
    pub title: String,
    pub status: SolicitationStatus,
    pub description: String,
    pub posted_date: String,
    pub closing_date: String,
    /// Minimum years of experience.
    pub experience: u32,
    /// Months.
    pub duration: u32,
    pub budget: String,
}

impl Normalize for SolicitationRecord {
    const ID_PREFIX: &'static str = "solicitation";

    fn read(reader: &mut FieldReader<'_>) -> Self {
        Self {
            id: reader.id(Self::ID_PREFIX),
            title: reader.text("title", &["title"]),
            status: reader.parsed(
                "status",
                &["status"],
                SolicitationStatus::parse,
                SolicitationStatus::Open,
            ),
            description: reader.text("description", &["description"]),
            posted_date: reader.text("postedDate", &["posted_date", "posteddate"]),
            closing_date: reader.text("closingDate", &["closing_date", "closingdate"]),
            experience: reader.non_negative_u32(
                "experience",
                &["min_experience", "experience", "minexperience"],
            ),
            duration: reader.non_negative_u32("duration", &["duration"]),
            budget: reader.text("budget", &["budget"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{normalize_rows, CellValue, RawRow};
    use pretty_assertions::assert_eq;

    #[test]
    fn normalizes_full_solicitation() {
        let raw = RawRow::new(
            1,
            [
                ("id", CellValue::text("S-100")),
                ("title", CellValue::text("Rural Box Route 12")),
                ("status", CellValue::text("Closing")),
                ("description", CellValue::text("Six-day rural delivery")),
                ("posted_date", CellValue::text("2024-05-01")),
                ("closing_date", CellValue::text("2024-06-01")),
                ("min_experience", CellValue::Number(3.0)),
                ("duration", CellValue::Number(48.0)),
                ("budget", CellValue::text("$120,000")),
            ],
        );
        assert_eq!(
            SolicitationRecord::from_raw(&raw),
            SolicitationRecord {
                id: "S-100".to_string(),
                title: "Rural Box Route 12".to_string(),
                status: SolicitationStatus::Closing,
                description: "Six-day rural delivery".to_string(),
                posted_date: "2024-05-01".to_string(),
                closing_date: "2024-06-01".to_string(),
                experience: 3,
                duration: 48,
                budget: "$120,000".to_string(),
            }
        );
    }

    #[test]
    fn unset_status_defaults_to_open() {
        let raw = RawRow::new(1, [("status", CellValue::Empty)]);
        let normalized = SolicitationRecord::normalize_with_report(&raw);
        assert_eq!(normalized.record.status, SolicitationStatus::Open);
        assert!(normalized.defaulted.contains(&"status"));
    }

    #[test]
    fn unknown_status_defaults_to_open() {
        let raw = RawRow::new(1, [("status", CellValue::text("awarded"))]);
        assert_eq!(
            SolicitationRecord::from_raw(&raw).status,
            SolicitationStatus::Open
        );
    }

    #[test]
    fn integer_fields_truncate_and_reject_garbage() {
        let raw = RawRow::new(
            1,
            [
                ("min_experience", CellValue::text("2.9 years")),
                ("duration", CellValue::text("n/a")),
            ],
        );
        let record = SolicitationRecord::from_raw(&raw);
        assert_eq!(record.experience, 2);
        assert_eq!(record.duration, 0);
    }

    #[test]
    fn batch_keeps_row_order_and_synthesizes_ids() {
        let rows = vec![
            RawRow::new(1, [("id", CellValue::text("S-1"))]),
            RawRow::new(2, [("title", CellValue::text("No id"))]),
        ];
        let records: Vec<SolicitationRecord> = normalize_rows(&rows);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["S-1", "solicitation-2"]);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SolicitationStatus::Review).unwrap(),
            "\"review\""
        );
    }
}
