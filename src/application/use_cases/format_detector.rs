// Header alias configuration and fixed-priority format detection.
//
// Goal: keep header matching explicit and ordered instead of scattering
// substring probes across pipelines.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::format::{ColumnMap, DatasetFormat, FormatDetection};
use crate::domain::record::RawRow;
use crate::domain::scan::ScanType;

// NOTE:
// - Aliases are matched against a normalized header (lowercase, space/dash -> underscore).
// - Matching strategy:
//   1) exact match
//   2) ends_with("_alias") or starts_with("alias_")
//   3) contains("_alias_")
// - Alias order is the ranking: earlier aliases win over later ones
//   regardless of column position.

pub const URL_CONTENT_ALIASES: &[&str] = &["url", "link", "domain", "address", "website"];

pub const SMS_CONTENT_ALIASES: &[&str] = &["sms", "text", "message", "content", "body"];

pub const EMAIL_CONTENT_ALIASES: &[&str] = &[
    "email",
    "text",
    "message",
    "content",
    "body",
    "subject",
];

pub const QR_CONTENT_ALIASES: &[&str] = &["qr", "url", "link", "payload", "content"];

pub const LABEL_ALIASES: &[&str] = &[
    "label",
    "class",
    "target",
    "category",
    "status",
    "result",
    "spam",
];

/// Trailing status token accepted by the pipe-delimited shape
static PIPE_STATUS_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,16}$").unwrap());

pub fn content_aliases_for(scan_type: ScanType) -> &'static [&'static str] {
    match scan_type {
        ScanType::Url => URL_CONTENT_ALIASES,
        ScanType::Sms => SMS_CONTENT_ALIASES,
        ScanType::Email => EMAIL_CONTENT_ALIASES,
        ScanType::Qr => QR_CONTENT_ALIASES,
    }
}

pub fn normalize_header(s: &str) -> String {
    s.trim()
        .trim_matches('"')
        .to_ascii_lowercase()
        .replace(' ', "_")
        .replace('-', "_")
}

pub fn header_matches_alias(normalized_header: &str, alias: &str) -> bool {
    if normalized_header == alias {
        return true;
    }
    if normalized_header.ends_with(&format!("_{}", alias)) {
        return true;
    }
    if normalized_header.starts_with(&format!("{}_", alias)) {
        return true;
    }
    if normalized_header.contains(&format!("_{}_", alias)) {
        return true;
    }
    false
}

/// First column whose normalized header matches an alias, scanning aliases
/// in ranked order. None is the NoMatch signal; callers never guess.
pub fn find_column(normalized_headers: &[String], aliases: &[&str]) -> Option<usize> {
    for alias in aliases {
        for (idx, header) in normalized_headers.iter().enumerate() {
            if header_matches_alias(header, alias) {
                return Some(idx);
            }
        }
    }
    None
}

/// Detects which column mapping applies to a batch of rows.
/// Pure and deterministic: the same header always yields the same format.
pub struct FormatDetector {
    scan_type: ScanType,
}

impl FormatDetector {
    pub fn new(scan_type: ScanType) -> Self {
        Self { scan_type }
    }

    /// Inspect the header row and resolve the column mapping.
    /// Checked in fixed priority order; first match wins. Unknown means the
    /// caller drops the whole input with zero records.
    pub fn detect(&self, header: &RawRow, delimiter: u8) -> FormatDetection {
        // Priority matters.
        if let Some(first) = header.first() {
            if first.eq_ignore_ascii_case("v1") || first.to_ascii_lowercase().contains("label") {
                return FormatDetection {
                    format: DatasetFormat::LabelFirst,
                    columns: Some(ColumnMap {
                        content_idx: 1,
                        label_idx: 0,
                        join_remaining: true,
                        label_from_end: false,
                    }),
                };
            }
        }

        let first_is_target = header
            .first()
            .map(|f| f.eq_ignore_ascii_case("target"))
            .unwrap_or(false);
        let second_is_text = header
            .get(1)
            .map(|f| f.eq_ignore_ascii_case("text"))
            .unwrap_or(false);
        if first_is_target || second_is_text {
            return FormatDetection {
                format: DatasetFormat::TextFirst,
                columns: Some(ColumnMap::new(1, 0)),
            };
        }

        if delimiter == b'|' && header.len() >= 2 {
            if let Some(last) = header.last() {
                if PIPE_STATUS_TOKEN.is_match(last) {
                    return FormatDetection {
                        format: DatasetFormat::UrlStatusPipe,
                        columns: Some(ColumnMap {
                            content_idx: 0,
                            label_idx: header.len() - 1,
                            join_remaining: false,
                            label_from_end: true,
                        }),
                    };
                }
            }
        }

        let normalized: Vec<String> = header.iter().map(|h| normalize_header(h)).collect();
        let content_idx = find_column(&normalized, content_aliases_for(self.scan_type));
        let label_idx = find_column(&normalized, LABEL_ALIASES);

        if let (Some(content_idx), Some(label_idx)) = (content_idx, label_idx) {
            if content_idx != label_idx {
                return FormatDetection {
                    format: DatasetFormat::HeaderMapped,
                    columns: Some(ColumnMap::new(content_idx, label_idx)),
                };
            }
        }

        FormatDetection::unknown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> RawRow {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_v1_header_is_label_first() {
        let detector = FormatDetector::new(ScanType::Sms);
        let detection = detector.detect(&row(&["v1", "v2"]), b',');

        assert_eq!(detection.format, DatasetFormat::LabelFirst);
        let columns = detection.columns.unwrap();
        assert_eq!(columns.label_idx, 0);
        assert!(columns.join_remaining);
    }

    #[test]
    fn test_label_substring_is_label_first() {
        let detector = FormatDetector::new(ScanType::Sms);
        let detection = detector.detect(&row(&["Label", "text"]), b',');
        assert_eq!(detection.format, DatasetFormat::LabelFirst);
    }

    #[test]
    fn test_target_or_text_header_is_text_first() {
        let detector = FormatDetector::new(ScanType::Sms);

        let by_target = detector.detect(&row(&["target", "value"]), b',');
        assert_eq!(by_target.format, DatasetFormat::TextFirst);

        let by_text = detector.detect(&row(&["sentiment", "text"]), b',');
        assert_eq!(by_text.format, DatasetFormat::TextFirst);

        let columns = by_text.columns.unwrap();
        assert_eq!(columns.content_idx, 1);
        assert_eq!(columns.label_idx, 0);
    }

    #[test]
    fn test_pipe_with_short_token_is_url_status() {
        let detector = FormatDetector::new(ScanType::Url);
        let detection = detector.detect(&row(&["url", "status"]), b'|');

        assert_eq!(detection.format, DatasetFormat::UrlStatusPipe);
        let columns = detection.columns.unwrap();
        assert_eq!(columns.content_idx, 0);
        assert!(columns.label_from_end);
    }

    #[test]
    fn test_pipe_rule_requires_pipe_delimiter() {
        // Same header under a comma delimiter resolves through the alias
        // lookup instead.
        let detector = FormatDetector::new(ScanType::Url);
        let detection = detector.detect(&row(&["url", "status"]), b',');

        assert_eq!(detection.format, DatasetFormat::HeaderMapped);
        let columns = detection.columns.unwrap();
        assert_eq!(columns.content_idx, 0);
        assert_eq!(columns.label_idx, 1);
    }

    #[test]
    fn test_alias_rank_beats_column_position() {
        let detector = FormatDetector::new(ScanType::Url);
        let detection = detector.detect(&row(&["link", "url", "class"]), b',');

        assert_eq!(detection.format, DatasetFormat::HeaderMapped);
        let columns = detection.columns.unwrap();
        // "url" outranks "link" even though link comes first
        assert_eq!(columns.content_idx, 1);
        assert_eq!(columns.label_idx, 2);
    }

    #[test]
    fn test_unrecognized_header_is_unknown() {
        let detector = FormatDetector::new(ScanType::Sms);
        let detection = detector.detect(&row(&["foo", "bar"]), b',');

        assert_eq!(detection.format, DatasetFormat::Unknown);
        assert!(detection.columns.is_none());
    }

    #[test]
    fn test_detection_is_deterministic() {
        let detector = FormatDetector::new(ScanType::Email);
        let header = row(&["Message Body", "Class"]);

        let first = detector.detect(&header, b',');
        let second = detector.detect(&header, b',');
        assert_eq!(first, second);
        assert_eq!(first.format, DatasetFormat::HeaderMapped);
    }

    #[test]
    fn test_header_normalization() {
        assert_eq!(normalize_header("  Message Body "), "message_body");
        assert_eq!(normalize_header("\"spam-label\""), "spam_label");
    }

    #[test]
    fn test_find_column_no_match() {
        let headers = vec!["foo".to_string(), "bar".to_string()];
        assert_eq!(find_column(&headers, LABEL_ALIASES), None);
    }
}
