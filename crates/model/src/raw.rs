use std::collections::BTreeMap;

/// A single CSV cell after type inference.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Infers a typed value from raw cell text.
    ///
    /// Only plain decimal literals become numbers; `inf`, `NaN` and friends
    /// stay text.
    #[must_use]
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Self::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Self::Bool(false);
        }
        if looks_numeric(trimmed) {
            if let Ok(value) = trimmed.parse::<f64>() {
                if value.is_finite() {
                    return Self::Number(value);
                }
            }
        }
        Self::Text(raw.to_string())
    }

    /// Keeps the cell as text regardless of what it looks like.
    #[must_use]
    pub fn text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(raw.to_string())
        }
    }

    /// Trimmed textual form, `None` for empty cells.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(value) => {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Self::Number(value) => Some(format_number(*value)),
            Self::Bool(value) => Some(value.to_string()),
        }
    }

    /// Finite numeric form. Text cells are read like `parseFloat`: the
    /// leading numeric prefix counts (`"15.3 mi"` -> `15.3`).
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(value) => Some(*value),
            Self::Text(value) => parse_leading_f64(value),
            Self::Empty | Self::Bool(_) => None,
        };
        value.filter(|v| v.is_finite())
    }
}

fn looks_numeric(raw: &str) -> bool {
    raw.bytes().any(|b| b.is_ascii_digit())
        && raw
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn parse_leading_f64(raw: &str) -> Option<f64> {
    let raw = raw.trim_start();
    let bytes = raw.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    while let Some(&b) = bytes.get(end) {
        if b.is_ascii_digit() {
            seen_digit = true;
        } else if b == b'.' && !seen_dot {
            seen_dot = true;
        } else {
            break;
        }
        end += 1;
    }
    if !seen_digit {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }
    raw[..end].parse::<f64>().ok()
}

/// Canonical form of a header name: trimmed and lowercased.
#[must_use]
pub fn normalize_header(raw: &str) -> String {
    raw.trim().trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// One parsed data row keyed by normalized header name.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    position: usize,
    cells: BTreeMap<String, CellValue>,
}

impl RawRow {
    /// `position` is the 1-based index of the data row within its file.
    /// Duplicate headers keep the first cell.
    pub fn new<K, I>(position: usize, cells: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, CellValue)>,
    {
        let mut map = BTreeMap::new();
        for (key, value) in cells {
            map.entry(normalize_header(key.as_ref()))
                .or_insert(value);
        }
        Self {
            position,
            cells: map,
        }
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.get(key)
    }

    /// First non-empty cell among `keys`.
    #[must_use]
    pub fn get_any(&self, keys: &[&str]) -> Option<&CellValue> {
        keys.iter()
            .filter_map(|key| self.cells.get(*key))
            .find(|cell| !matches!(cell, CellValue::Empty))
    }
}
