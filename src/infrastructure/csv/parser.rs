// ============================================================
// DELIMITED TEXT PARSER
// ============================================================
// Quote-aware line splitting for heterogeneous training exports

use std::path::Path;

use crate::domain::error::{AppError, Result};
use crate::domain::record::RawRow;

/// Delimiter selection for an ingestion request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterChoice {
    /// Pick the most consistent candidate by scanning a sample of lines
    Auto,
    /// Use this byte as the delimiter
    Char(u8),
}

impl Default for DelimiterChoice {
    fn default() -> Self {
        DelimiterChoice::Auto
    }
}

/// Quote-aware delimited-text parser
pub struct DelimitedTextParser {
    /// Delimiter character (default: comma)
    delimiter: u8,
}

impl Default for DelimitedTextParser {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl DelimitedTextParser {
    /// Create a new parser with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Build a parser for the requested choice, sniffing the text when asked
    pub fn for_choice(choice: DelimiterChoice, text: &str) -> Self {
        match choice {
            DelimiterChoice::Auto => Self::new().with_delimiter(Self::detect_delimiter(text)),
            DelimiterChoice::Char(delimiter) => Self::new().with_delimiter(delimiter),
        }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Split raw text into rows, one per non-blank line, each field trimmed.
    /// Pure function of (text, delimiter); single pass, no I/O. Blank lines
    /// never produce an empty row.
    pub fn parse_text(&self, text: &str) -> Result<Vec<RawRow>> {
        let mut rows = Vec::new();

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            rows.push(self.parse_line(line));
        }

        if rows.is_empty() {
            return Err(AppError::EmptyInput);
        }

        Ok(rows)
    }

    /// Split one line on the delimiter, honoring double quotes.
    /// A quote toggles the in-quotes flag and the delimiter is ignored while
    /// it is set. One quote level only; no escaped embedded quotes.
    pub fn parse_line(&self, line: &str) -> RawRow {
        let delimiter = self.delimiter as char;
        let mut fields = Vec::new();
        let mut current_field = String::new();
        let mut in_quotes = false;

        for c in line.chars() {
            match c {
                '"' => {
                    in_quotes = !in_quotes;
                }
                c if c == delimiter && !in_quotes => {
                    fields.push(current_field.trim().to_string());
                    current_field = String::new();
                }
                _ => {
                    current_field.push(c);
                }
            }
        }

        // Don't forget the last field
        fields.push(current_field.trim().to_string());
        fields
    }

    /// Read a delimited file from disk and parse it
    pub fn parse_file(&self, path: &Path) -> Result<Vec<RawRow>> {
        let content = read_lossy(path)?;
        self.parse_text(&content)
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe)
    pub fn detect_delimiter(content: &str) -> u8 {
        let candidates = [b',', b';', b'\t', b'|'];
        let sample_lines: Vec<_> = content.lines().take(10).collect();

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        if sample_lines.is_empty() {
            return best_delimiter;
        }

        for &delimiter in &candidates {
            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.chars().filter(|&c| c as u8 == delimiter).count())
                .collect();

            // Score by consistency (low dispersion) and frequency
            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;

            let score = avg / (1.0 + variance.sqrt());

            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }
}

/// Read a file as UTF-8, replacing invalid sequences, and strip a leading BOM
pub fn read_lossy(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).map_err(|e| AppError::IoError(format!("Failed to read file: {}", e)))?;

    let content = String::from_utf8_lossy(&bytes);
    Ok(content
        .strip_prefix('\u{feff}')
        .unwrap_or(&content)
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_simple_rows() {
        let parser = DelimitedTextParser::new();
        let rows = parser.parse_text("a,b,c\nd,e,f").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["a", "b", "c"]);
        assert_eq!(rows[1], vec!["d", "e", "f"]);
    }

    #[test]
    fn test_quoted_field_keeps_delimiter() {
        let parser = DelimitedTextParser::new();
        let rows = parser
            .parse_text("spam,\"Win $500, claim now\",extra")
            .unwrap();

        assert_eq!(rows[0], vec!["spam", "Win $500, claim now", "extra"]);
    }

    #[test]
    fn test_single_quote_level_only() {
        // Doubled quotes toggle out and back in; they never produce a
        // literal quote character.
        let parser = DelimitedTextParser::new();
        let rows = parser.parse_text("\"a \"\"b\"\" c\",x").unwrap();

        assert_eq!(rows[0], vec!["a b c", "x"]);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let parser = DelimitedTextParser::new();
        let rows = parser.parse_text("a,b\n\n   \n\t\nc,d\n").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["c", "d"]);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let parser = DelimitedTextParser::new();
        assert!(matches!(
            parser.parse_text(""),
            Err(AppError::EmptyInput)
        ));
        assert!(matches!(
            parser.parse_text(" \n\t\n  \n"),
            Err(AppError::EmptyInput)
        ));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = DelimitedTextParser::new();
        let text = "v1,v2\nspam,\"WINNER, click now\"\nham,See you at 5pm";

        let first = parser.parse_text(text).unwrap();
        let second = parser.parse_text(text).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let parser = DelimitedTextParser::new();
        let rows = parser.parse_text("  spam  ,  click here  ").unwrap();

        assert_eq!(rows[0], vec!["spam", "click here"]);
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(DelimitedTextParser::detect_delimiter("a,b,c\nd,e,f"), b',');
        assert_eq!(DelimitedTextParser::detect_delimiter("a;b;c\nd;e;f"), b';');
        assert_eq!(
            DelimitedTextParser::detect_delimiter("http://x.test|bad\nhttp://y.test|ok"),
            b'|'
        );
    }

    #[test]
    fn test_for_choice_auto_uses_detected_delimiter() {
        let text = "url|status\nhttp://a.test|phishing";
        let parser = DelimitedTextParser::for_choice(DelimiterChoice::Auto, text);
        assert_eq!(parser.delimiter(), b'|');
    }

    #[test]
    fn test_parse_file_replaces_invalid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"label,text\nspam,caf\xff offer\n").unwrap();

        let parser = DelimitedTextParser::new();
        let rows = parser.parse_file(file.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows[1][1].starts_with("caf"));
    }
}
