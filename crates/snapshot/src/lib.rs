//! # Pocket Snapshot
//!
//! Picks the current CSV snapshot of a dataset out of a data directory.
//!
//! Files follow `<Prefix>_<suffix>.csv`; the prefix selects the dataset and
//! the modification time (not the suffix) decides which one is current.

mod error;
mod resolver;

pub use error::{Result, SnapshotError};
pub use resolver::{latest_snapshot, SnapshotFile, SnapshotResolver, CSV_EXTENSION};
