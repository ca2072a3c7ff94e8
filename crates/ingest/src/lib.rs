//! # Pocket Ingest
//!
//! Network side of the listings pipeline.
//!
//! ```text
//! GET /api/latest-<dataset>-csv ──> { latestFile }
//!     │
//!     └──> GET /data/<latestFile>
//!            └─> parse_csv ──> RawRow* ──> normalize_rows ──> records
//! ```
//!
//! Parsing is all-or-nothing; row-level problems are left to the
//! normalizer. [`DatasetLoader`] discards results of superseded loads.

mod error;
mod fetch;
mod loader;
mod parse;

pub use error::{IngestError, Result};
pub use fetch::{fetch_and_parse, fetch_latest, fetch_text, resolve_latest, Snapshot};
pub use loader::{DatasetLoader, LoadOutcome, LoadState};
pub use parse::{parse_csv, ParseOptions, ParsedRows, DEFAULT_STRING_FIELDS};
