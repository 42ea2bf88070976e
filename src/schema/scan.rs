//! Tokenizing line scanner for the parameter header.
//!
//! The header grammar mixes fixed line positions with marker tokens, so the
//! scanner exposes typed accessors that validate field counts before
//! extraction and fail with line-numbered errors instead of panicking on a
//! short or malformed line. Line numbers in errors are 1-based; internal
//! indices are 0-based to match the anchor arithmetic.

use std::str::FromStr;

use crate::error::AppError;

pub struct HeaderScanner {
    lines: Vec<String>,
}

impl HeaderScanner {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Raw line at a 0-based index.
    pub fn line(&self, index: usize) -> Result<&str, AppError> {
        self.lines.get(index).map(String::as_str).ok_or_else(|| {
            AppError::SchemaParse {
                line: index + 1,
                message: format!("header ends early: expected at least {} lines", index + 1),
            }
        })
    }

    /// Whitespace-tokenized fields of a line.
    pub fn fields(&self, index: usize) -> Result<Vec<&str>, AppError> {
        Ok(self.line(index)?.split_whitespace().collect())
    }

    /// A single field, validating the field count first.
    pub fn field(&self, index: usize, field: usize, what: &str) -> Result<&str, AppError> {
        let fields = self.fields(index)?;
        fields.get(field).copied().ok_or_else(|| {
            AppError::SchemaParse {
                line: index + 1,
                message: format!(
                    "expected {what} in field {field} but the line has only {} fields: '{}'",
                    fields.len(),
                    self.lines[index].trim_end()
                ),
            }
        })
    }

    /// A numeric field, with the parse failure reported against the line.
    pub fn numeric_field<T: FromStr>(
        &self,
        index: usize,
        field: usize,
        what: &str,
    ) -> Result<T, AppError> {
        let raw = self.field(index, field, what)?;
        raw.parse::<T>().map_err(|_| AppError::SchemaParse {
            line: index + 1,
            message: format!("expected numeric {what} in field {field}, found '{raw}'"),
        })
    }

    /// Find the first line at or after `from` whose third field equals
    /// `marker` (the marker grammar places the token in field 2 with the
    /// count following in field 3).
    pub fn find_marker(&self, marker: &str, from: usize) -> Option<usize> {
        (from..self.lines.len()).find(|&i| {
            let fields: Vec<&str> = self.lines[i].split_whitespace().collect();
            fields.len() > 3 && fields[2] == marker
        })
    }

    /// All raw lines (for report echoes).
    pub fn raw_lines(&self) -> &[String] {
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_access_past_end_reports_expected_length() {
        let scanner = HeaderScanner::new("a\nb\n");
        let err = scanner.line(5).unwrap_err();
        match err {
            AppError::SchemaParse { line, message } => {
                assert_eq!(line, 6);
                assert!(message.contains("ends early"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn field_count_is_validated_before_extraction() {
        let scanner = HeaderScanner::new("ATOM TYPES:\n");
        let err = scanner.field(0, 2, "atom type count").unwrap_err();
        match err {
            AppError::SchemaParse { line, message } => {
                assert_eq!(line, 1);
                assert!(message.contains("atom type count"));
                assert!(message.contains("2 fields"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn numeric_field_reports_offending_token() {
        let scanner = HeaderScanner::new("ATOM TYPES: many\n");
        let err = scanner
            .numeric_field::<usize>(0, 2, "atom type count")
            .unwrap_err();
        assert!(err.to_string().contains("many"));
    }

    #[test]
    fn marker_requires_at_least_four_fields() {
        let text = "x\nfoo bar TRIPLETS:\nATOM PAIR TRIPLETS: 4\n";
        let scanner = HeaderScanner::new(text);
        // Line 1 has the token but only three fields, so it is not a marker.
        assert_eq!(scanner.find_marker("TRIPLETS:", 0), Some(2));
        assert_eq!(scanner.find_marker("TRIPLETS:", 3), None);
    }
}
