use crate::raw::{CellValue, RawRow};

/// A normalized record together with the fields that had to be defaulted.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub record: T,
    pub defaulted: Vec<&'static str>,
}

impl<T> Normalized<T> {
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.defaulted.is_empty()
    }
}

/// Reads fields out of a [`RawRow`] with fallbacks, remembering which ones
/// fell back.
pub struct FieldReader<'a> {
    row: &'a RawRow,
    defaulted: Vec<&'static str>,
}

impl<'a> FieldReader<'a> {
    #[must_use]
    pub fn new(row: &'a RawRow) -> Self {
        Self {
            row,
            defaulted: Vec::new(),
        }
    }

    fn cell(&self, keys: &[&str]) -> Option<&'a CellValue> {
        self.row.get_any(keys)
    }

    /// Source id, or `<prefix>-<position>` when the row has none.
    pub fn id(&mut self, prefix: &str) -> String {
        match self.cell(&["id"]).and_then(CellValue::as_text) {
            Some(id) => id,
            None => {
                self.defaulted.push("id");
                format!("{prefix}-{}", self.row.position())
            }
        }
    }

    pub fn text(&mut self, field: &'static str, keys: &[&str]) -> String {
        match self.cell(keys).and_then(CellValue::as_text) {
            Some(value) => value,
            None => {
                self.defaulted.push(field);
                String::new()
            }
        }
    }

    /// Non-negative finite float, `0.0` otherwise.
    pub fn non_negative_f64(&mut self, field: &'static str, keys: &[&str]) -> f64 {
        match self
            .cell(keys)
            .and_then(CellValue::as_f64)
            .filter(|v| *v >= 0.0)
        {
            Some(value) => value,
            None => {
                self.defaulted.push(field);
                0.0
            }
        }
    }

    /// Non-negative integer, truncating fractions like `parseInt`.
    pub fn non_negative_u32(&mut self, field: &'static str, keys: &[&str]) -> u32 {
        match self
            .cell(keys)
            .and_then(CellValue::as_f64)
            .filter(|v| *v >= 0.0)
        {
            Some(value) => value.trunc().min(f64::from(u32::MAX)) as u32,
            None => {
                self.defaulted.push(field);
                0
            }
        }
    }

    /// Parses with `parse`, falling back to `default` when the cell is
    /// missing or unrecognized.
    pub fn parsed<T>(
        &mut self,
        field: &'static str,
        keys: &[&str],
        parse: impl FnOnce(&str) -> Option<T>,
        default: T,
    ) -> T {
        match self
            .cell(keys)
            .and_then(CellValue::as_text)
            .and_then(|raw| parse(&raw))
        {
            Some(value) => value,
            None => {
                self.defaulted.push(field);
                default
            }
        }
    }

    #[must_use]
    pub fn finish<T>(self, record: T) -> Normalized<T> {
        Normalized {
            record,
            defaulted: self.defaulted,
        }
    }
}

/// Conversion from a loosely-typed row into a typed record. Never fails.
pub trait Normalize: Sized {
    /// Prefix of synthesized ids.
    const ID_PREFIX: &'static str;

    fn read(reader: &mut FieldReader<'_>) -> Self;

    fn normalize_with_report(row: &RawRow) -> Normalized<Self> {
        let mut reader = FieldReader::new(row);
        let record = Self::read(&mut reader);
        reader.finish(record)
    }

    fn from_raw(row: &RawRow) -> Self {
        Self::normalize_with_report(row).record
    }
}

/// Normalizes a whole batch; degraded rows are reported in one warning.
pub fn normalize_rows<T: Normalize>(rows: &[RawRow]) -> Vec<T> {
    let mut degraded = 0usize;
    let records = rows
        .iter()
        .map(|row| {
            let normalized = T::normalize_with_report(row);
            if normalized.is_degraded() {
                degraded += 1;
                log::debug!(
                    "row {} defaulted fields: {}",
                    row.position(),
                    normalized.defaulted.join(", ")
                );
            }
            normalized.record
        })
        .collect::<Vec<_>>();
    if degraded > 0 {
        log::warn!(
            "{degraded} of {} {} rows had missing or invalid fields",
            rows.len(),
            T::ID_PREFIX
        );
    }
    records
}
