// Fixed per-scan-type indicator vocabularies. Indicators are informational
// tags attached to phishing records; they never feed back into label
// derivation and legitimate records never carry them.

use super::scan::ScanType;

pub const URL_INDICATORS: &[&str] = &[
    "typosquatting",
    "suspicious_tld",
    "url_shortener",
    "ip_address_host",
    "homograph_chars",
    "excessive_subdomains",
];

pub const SMS_INDICATORS: &[&str] = &[
    "urgency_tone",
    "prize_scam",
    "shortened_link",
    "sender_spoofing",
    "money_request",
    "verification_bait",
];

pub const EMAIL_INDICATORS: &[&str] = &[
    "urgency_tone",
    "credential_request",
    "mismatched_links",
    "spoofed_sender",
    "attachment_lure",
    "brand_impersonation",
];

pub const QR_INDICATORS: &[&str] = &[
    "redirect_chain",
    "fake_landing_page",
    "payload_obfuscation",
    "quishing_lure",
];

/// Vocabulary for a scan type; indicator draws always come from here
pub fn vocabulary_for(scan_type: ScanType) -> &'static [&'static str] {
    match scan_type {
        ScanType::Url => URL_INDICATORS,
        ScanType::Sms => SMS_INDICATORS,
        ScanType::Email => EMAIL_INDICATORS,
        ScanType::Qr => QR_INDICATORS,
    }
}
