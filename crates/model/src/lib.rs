//! # Pocket Model
//!
//! Typed listing records and the row normalizer that builds them from
//! loosely-typed CSV rows.
//!
//! ```text
//! RawRow { "zip": Text("00501"), "length": Text(""), ... }
//!     │
//!     └──> Normalize::from_raw
//!            └─> RouteRecord { zip: "00501", length: 0.0, ... }
//! ```
//!
//! Normalization is total: missing, extra or garbled cells fall back to
//! defaults instead of failing the batch.

mod normalize;
mod raw;
mod route;
mod solicitation;

pub use normalize::{normalize_rows, FieldReader, Normalize, Normalized};
pub use raw::{normalize_header, CellValue, RawRow};
pub use route::RouteRecord;
pub use solicitation::{SolicitationRecord, SolicitationStatus};
