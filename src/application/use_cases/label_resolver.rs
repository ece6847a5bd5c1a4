// Label synonym tables shared by every ingestion pipeline.
//
// The tables merge the encodings seen across training exports: numeric
// flags, booleans, and the spam/ham vocabulary.

use crate::domain::error::{AppError, Result};
use crate::domain::scan::{ScanType, ThreatLevel, ThreatScale};

pub const PHISHING_TOKENS: &[&str] = &[
    "1",
    "true",
    "phishing",
    "phish",
    "spam",
    "smishing",
    "malicious",
    "fraud",
    "scam",
    "bad",
];

pub const LEGITIMATE_TOKENS: &[&str] = &[
    "0",
    "false",
    "legitimate",
    "legit",
    "ham",
    "safe",
    "normal",
    "benign",
    "good",
];

/// Maps a raw label token to (is_phishing, threat_level).
/// Pure function of (token, scan type, scale); no state.
pub struct LabelResolver {
    scan_type: ScanType,
    scale: ThreatScale,
}

impl LabelResolver {
    pub fn new(scan_type: ScanType, scale: ThreatScale) -> Self {
        Self { scan_type, scale }
    }

    /// Resolve a raw token, case-insensitive on the trimmed value.
    /// Unknown tokens fail closed: the caller drops the row.
    pub fn resolve(&self, token: &str) -> Result<(bool, ThreatLevel)> {
        let normalized = token.trim().to_ascii_lowercase();

        if PHISHING_TOKENS.contains(&normalized.as_str()) {
            return Ok((true, self.phishing_level()));
        }
        if LEGITIMATE_TOKENS.contains(&normalized.as_str()) {
            return Ok((false, self.safe_level()));
        }

        Err(AppError::UnrecognizedLabel(token.to_string()))
    }

    /// Threat bucket for a known phishing flag; the synthetic generator
    /// derives levels here so they match resolved imports exactly
    pub fn level_for(&self, is_phishing: bool) -> ThreatLevel {
        if is_phishing {
            self.phishing_level()
        } else {
            self.safe_level()
        }
    }

    /// Threat bucket for a phishing record under the active scale
    fn phishing_level(&self) -> ThreatLevel {
        match self.scale {
            ThreatScale::Binary => ThreatLevel::Dangerous,
            ThreatScale::Graded => match self.scan_type {
                ScanType::Sms => ThreatLevel::Medium,
                ScanType::Url | ScanType::Email | ScanType::Qr => ThreatLevel::High,
            },
        }
    }

    fn safe_level(&self) -> ThreatLevel {
        match self.scale {
            ThreatScale::Binary => ThreatLevel::Safe,
            ThreatScale::Graded => ThreatLevel::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spam_ham_tokens() {
        let resolver = LabelResolver::new(ScanType::Sms, ThreatScale::Graded);

        assert_eq!(
            resolver.resolve("spam").unwrap(),
            (true, ThreatLevel::Medium)
        );
        assert_eq!(resolver.resolve("ham").unwrap(), (false, ThreatLevel::None));
    }

    #[test]
    fn test_url_labels_resolve_high() {
        let resolver = LabelResolver::new(ScanType::Url, ThreatScale::Graded);

        assert_eq!(
            resolver.resolve("phishing").unwrap(),
            (true, ThreatLevel::High)
        );
        assert_eq!(
            resolver.resolve("legit").unwrap(),
            (false, ThreatLevel::None)
        );
    }

    #[test]
    fn test_numeric_and_boolean_tokens() {
        let resolver = LabelResolver::new(ScanType::Email, ThreatScale::Graded);

        assert_eq!(resolver.resolve("1").unwrap(), (true, ThreatLevel::High));
        assert_eq!(resolver.resolve("0").unwrap(), (false, ThreatLevel::None));
        assert_eq!(resolver.resolve("true").unwrap().0, true);
        assert_eq!(resolver.resolve("false").unwrap().0, false);
    }

    #[test]
    fn test_binary_scale_levels() {
        let resolver = LabelResolver::new(ScanType::Qr, ThreatScale::Binary);

        assert_eq!(
            resolver.resolve("malicious").unwrap(),
            (true, ThreatLevel::Dangerous)
        );
        assert_eq!(
            resolver.resolve("safe").unwrap(),
            (false, ThreatLevel::Safe)
        );
    }

    #[test]
    fn test_matching_ignores_case_and_whitespace() {
        let resolver = LabelResolver::new(ScanType::Sms, ThreatScale::Graded);

        assert_eq!(resolver.resolve(" SPAM ").unwrap().0, true);
        assert_eq!(resolver.resolve("Ham").unwrap().0, false);
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        let resolver = LabelResolver::new(ScanType::Sms, ThreatScale::Graded);

        assert!(matches!(
            resolver.resolve("maybe"),
            Err(AppError::UnrecognizedLabel(_))
        ));
    }

    #[test]
    fn test_level_for_matches_resolve() {
        let resolver = LabelResolver::new(ScanType::Url, ThreatScale::Graded);

        assert_eq!(
            resolver.level_for(true),
            resolver.resolve("phishing").unwrap().1
        );
        assert_eq!(
            resolver.level_for(false),
            resolver.resolve("legit").unwrap().1
        );
    }
}
