use crate::error::{IngestError, Result};
use pocket_model::{normalize_header, CellValue, RawRow};

/// Columns that are never type-inferred.
pub const DEFAULT_STRING_FIELDS: [&str; 2] = ["id", "zip"];

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Normalized header names kept as text.
    pub string_fields: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            string_fields: DEFAULT_STRING_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl ParseOptions {
    fn keeps_text(&self, header: &str) -> bool {
        self.string_fields.iter().any(|field| field == header)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRows {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl ParsedRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parses a whole CSV document. The first error aborts the parse and no rows
/// are returned.
pub fn parse_csv(text: &str, options: &ParseOptions) -> Result<ParsedRows> {
    // The reader treats an unclosed quote as running to EOF.
    if let Some(line) = unterminated_quote_line(text) {
        return Err(IngestError::Parse {
            message: format!("unterminated quoted field starting on line {line}"),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(normalize_header)
        .collect();
    let keep_text: Vec<bool> = headers.iter().map(|h| options.keeps_text(h)).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        // Rows made only of separators count as blank lines.
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let cells = headers
            .iter()
            .zip(&keep_text)
            .zip(record.iter())
            .map(|((header, keep_text), raw)| {
                let value = if *keep_text {
                    CellValue::text(raw)
                } else {
                    CellValue::infer(raw)
                };
                (header.as_str(), value)
            });
        rows.push(RawRow::new(rows.len() + 1, cells));
    }

    log::debug!("Parsed {} CSV rows ({} columns)", rows.len(), headers.len());
    Ok(ParsedRows { headers, rows })
}

/// 1-based line of a quoted field that is still open at the end of `text`.
///
/// Quotes only open a field when they are its first character; inside a
/// quoted field `""` is an escaped quote.
fn unterminated_quote_line(text: &str) -> Option<usize> {
    let mut line = 1;
    let mut opened_on = None;
    let mut field_start = true;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
        }
        if opened_on.is_some() {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    opened_on = None;
                }
            }
            continue;
        }
        match c {
            '"' if field_start => {
                opened_on = Some(line);
                field_start = false;
            }
            ',' | '\n' | '\r' => field_start = true,
            _ => field_start = false,
        }
    }
    opened_on
}

fn parse_error(err: csv::Error) -> IngestError {
    IngestError::Parse {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ROUTES: &str = "id,location,state,zip,type,length,pay_rate\n\
        R1,Austin,TX,78701,City,15.3,$25/hr\n\
        \n\
        00042,Holtsville,NY,00501,Rural,,$22.50/hr\n";

    #[test]
    fn header_row_defines_fields_and_blank_lines_are_skipped() {
        let parsed = parse_csv(ROUTES, &ParseOptions::default()).unwrap();
        assert_eq!(
            parsed.headers,
            vec!["id", "location", "state", "zip", "type", "length", "pay_rate"]
        );
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.rows[1].position(), 2);
    }

    #[test]
    fn id_and_zip_stay_text_while_other_cells_are_inferred() {
        let parsed = parse_csv(ROUTES, &ParseOptions::default()).unwrap();
        let row = &parsed.rows[1];
        assert_eq!(row.get("id"), Some(&CellValue::Text("00042".to_string())));
        assert_eq!(row.get("zip"), Some(&CellValue::Text("00501".to_string())));
        assert_eq!(row.get("length"), Some(&CellValue::Empty));
        assert_eq!(
            parsed.rows[0].get("length"),
            Some(&CellValue::Number(15.3))
        );
    }

    #[test]
    fn ragged_row_fails_whole_parse() {
        let text = "id,location\nR1,Austin\nR2\n";
        let err = parse_csv(text, &ParseOptions::default()).unwrap_err();
        match err {
            IngestError::Parse { message } => {
                assert!(message.contains("field"), "unexpected message: {message}")
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_quote_fails_whole_parse() {
        let text = "id,title\nS1,\"unterminated\nS2,x\n";
        let err = parse_csv(text, &ParseOptions::default()).unwrap_err();
        match err {
            IngestError::Parse { message } => assert_eq!(
                message,
                "unterminated quoted field starting on line 2"
            ),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn escaped_and_inner_quotes_are_not_unterminated() {
        let text = "id,title,size\nS1,\"The \"\"Loop\"\" route\",5\" box\n\"S2\",\"two\nlines\",1\n";
        let parsed = parse_csv(text, &ParseOptions::default()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(
            parsed.rows[0].get("title"),
            Some(&CellValue::Text("The \"Loop\" route".to_string()))
        );
        assert_eq!(
            parsed.rows[1].get("title"),
            Some(&CellValue::Text("two\nlines".to_string()))
        );
    }

    #[test]
    fn quoted_cells_keep_commas() {
        let text = "id,title,description\nS1,\"Route 7, rural\",\"Six days\"\n";
        let parsed = parse_csv(text, &ParseOptions::default()).unwrap();
        assert_eq!(
            parsed.rows[0].get("title"),
            Some(&CellValue::Text("Route 7, rural".to_string()))
        );
    }

    #[test]
    fn headers_are_trimmed_and_lowercased() {
        let text = " ID , Pay_Rate \nR1,$20/hr\n";
        let parsed = parse_csv(text, &ParseOptions::default()).unwrap();
        assert_eq!(parsed.headers, vec!["id", "pay_rate"]);
    }

    #[test]
    fn separator_only_rows_are_skipped() {
        let text = "id,location\n,\nR1,Austin\n";
        let parsed = parse_csv(text, &ParseOptions::default()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.rows[0].position(), 1);
    }

    #[test]
    fn empty_document_has_no_rows() {
        let parsed = parse_csv("", &ParseOptions::default()).unwrap();
        assert!(parsed.is_empty());
    }
}
