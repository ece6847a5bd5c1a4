// ============================================================
// SCAN TYPE & THREAT LEVEL
// ============================================================
// Core enums shared by every ingestion pipeline

use serde::{Deserialize, Serialize};

/// Content category being classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Url,
    Sms,
    Email,
    Qr,
}

impl ScanType {
    /// Content cap used by the training pipelines for this scan type
    /// (sms 160, url 200, email 512; qr payloads are URLs)
    pub fn content_cap(&self) -> usize {
        match self {
            ScanType::Url => 200,
            ScanType::Sms => 160,
            ScanType::Email => 512,
            ScanType::Qr => 200,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Url => "url",
            ScanType::Sms => "sms",
            ScanType::Email => "email",
            ScanType::Qr => "qr",
        }
    }

    /// Parse a scan type tag, case-insensitive
    pub fn parse(value: &str) -> Option<ScanType> {
        match value.trim().to_ascii_lowercase().as_str() {
            "url" => Some(ScanType::Url),
            "sms" => Some(ScanType::Sms),
            "email" => Some(ScanType::Email),
            "qr" => Some(ScanType::Qr),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Threat severity scale used by a pipeline variant.
/// Callers pick the scale explicitly; it is configuration, not resolver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatScale {
    /// Three buckets: none / medium / high
    Graded,
    /// Two buckets: safe / dangerous
    Binary,
}

impl ThreatScale {
    /// Parse a scale tag, case-insensitive
    pub fn parse(value: &str) -> Option<ThreatScale> {
        match value.trim().to_ascii_lowercase().as_str() {
            "graded" => Some(ThreatScale::Graded),
            "binary" => Some(ThreatScale::Binary),
            _ => None,
        }
    }
}

impl Default for ThreatScale {
    fn default() -> Self {
        ThreatScale::Graded
    }
}

/// Coarse severity bucket, derived from the phishing flag and scan type.
/// Never independently settable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    None,
    Medium,
    High,
    Safe,
    Dangerous,
}

impl ThreatLevel {
    /// Whether this level marks a record as legitimate
    pub fn is_safe(&self) -> bool {
        matches!(self, ThreatLevel::None | ThreatLevel::Safe)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::None => "none",
            ThreatLevel::Medium => "medium",
            ThreatLevel::High => "high",
            ThreatLevel::Safe => "safe",
            ThreatLevel::Dangerous => "dangerous",
        }
    }

    /// Parse a stored threat level tag
    pub fn parse(value: &str) -> Option<ThreatLevel> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Some(ThreatLevel::None),
            "medium" => Some(ThreatLevel::Medium),
            "high" => Some(ThreatLevel::High),
            "safe" => Some(ThreatLevel::Safe),
            "dangerous" => Some(ThreatLevel::Dangerous),
            _ => None,
        }
    }
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_type_parse_roundtrip() {
        for tag in ["url", "sms", "email", "qr"] {
            let scan_type = ScanType::parse(tag).unwrap();
            assert_eq!(scan_type.as_str(), tag);
        }
        assert_eq!(ScanType::parse(" SMS "), Some(ScanType::Sms));
        assert_eq!(ScanType::parse("voice"), None);
    }

    #[test]
    fn test_threat_level_safe_values() {
        assert!(ThreatLevel::None.is_safe());
        assert!(ThreatLevel::Safe.is_safe());
        assert!(!ThreatLevel::Medium.is_safe());
        assert!(!ThreatLevel::High.is_safe());
        assert!(!ThreatLevel::Dangerous.is_safe());
    }
}
