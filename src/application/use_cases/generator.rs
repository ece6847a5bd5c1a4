// ============================================================
// SYNTHETIC DATASET GENERATOR
// ============================================================
// Renders labeled records from per-scan-type template pools.
// Generated content flows through the same normalizer as imports,
// so caps, indicators and coupling rules apply identically.

use tracing::info;

use crate::application::use_cases::aggregator::BatchAggregator;
use crate::application::use_cases::label_resolver::LabelResolver;
use crate::application::use_cases::normalizer::{
    NormalizerConfig, RandomSource, RecordNormalizer, StdRandomSource,
};
use crate::domain::dataset::DatasetSummary;
use crate::domain::error::{AppError, Result};
use crate::domain::record::LabeledRecord;
use crate::domain::scan::{ScanType, ThreatScale};

/// Phishing share of a generated batch when the caller supplies none
pub const DEFAULT_PHISHING_RATIO: f64 = 0.5;

const BRANDS: &[&str] = &[
    "paypal",
    "amazon",
    "netflix",
    "apple",
    "microsoft",
    "chase",
    "dhl",
    "spotify",
];

const URL_PHISHING_TEMPLATES: &[&str] = &[
    "http://{brand}-verify.com/login?session={code}",
    "http://{brand}.account-security.net/confirm",
    "http://secure-{brand}.info/update/{code}",
    "https://bit.ly/{code}",
    "http://{brand}.com.signin-alert.top/reset",
    "http://192.168.4.{code}/{brand}/signin",
];

const URL_LEGITIMATE_TEMPLATES: &[&str] = &[
    "https://www.{brand}.com/login",
    "https://{brand}.com/account/settings",
    "https://support.{brand}.com/articles/{code}",
    "https://www.{brand}.com/help/billing",
    "https://{brand}.com/orders/{code}",
];

const SMS_PHISHING_TEMPLATES: &[&str] = &[
    "URGENT: Your {brand} account is suspended. Verify now at http://{brand}-alerts.info/{code}",
    "You have WON ${code}! Claim your prize at http://win-{brand}.top before midnight",
    "{brand} delivery failed. Reschedule at http://redeliver-{brand}.net/{code}",
    "Security alert: unusual sign-in to your {brand} account. Reply {code} to unlock",
    "Final notice: pay your {brand} bill at http://{brand}-billing.info or lose service",
];

const SMS_LEGITIMATE_TEMPLATES: &[&str] = &[
    "Your {brand} verification code is {code}",
    "Thanks for your order #{code} from {brand}. Track it in the app",
    "Reminder: your {brand} appointment is tomorrow at 10am",
    "See you at 5pm, the parking code is {code}",
    "Your {brand} package was delivered. Rate your experience in the app",
];

const EMAIL_PHISHING_TEMPLATES: &[&str] = &[
    "Dear customer, your {brand} account will be closed within 24 hours. Confirm your password at http://{brand}-support.info/{code} to keep access",
    "Invoice #{code} is overdue. Download the attached statement and submit your payment details to keep your {brand} service active",
    "We detected a sign-in from a new device. If this was not you, verify your {brand} credentials immediately at http://secure-{brand}.top/review",
    "Your {brand} mailbox is over quota. Re-validate your account at http://{brand}-webmail.info/{code} or incoming mail will be rejected",
];

const EMAIL_LEGITIMATE_TEMPLATES: &[&str] = &[
    "Hi team, the quarterly report for {brand} is attached. Let me know if you have questions before Friday's review",
    "Your {brand} order #{code} has shipped and should arrive within 3 business days",
    "Thanks for contacting {brand} support. Ticket #{code} has been resolved; reply to reopen it",
    "Your {brand} subscription renews next week. No action is needed if your payment details are current",
];

const QR_PHISHING_TEMPLATES: &[&str] = &[
    "http://qr-{brand}.top/claim/{code}",
    "http://{brand}-parking.info/pay?ticket={code}",
    "http://menu-{brand}.net/redirect/{code}",
    "http://{brand}.promo-scan.top/win",
];

const QR_LEGITIMATE_TEMPLATES: &[&str] = &[
    "https://www.{brand}.com/menu",
    "https://{brand}.com/pay/{code}",
    "https://www.{brand}.com/app/download",
    "https://{brand}.com/events/{code}",
];

fn template_pool(scan_type: ScanType, is_phishing: bool) -> &'static [&'static str] {
    match (scan_type, is_phishing) {
        (ScanType::Url, true) => URL_PHISHING_TEMPLATES,
        (ScanType::Url, false) => URL_LEGITIMATE_TEMPLATES,
        (ScanType::Sms, true) => SMS_PHISHING_TEMPLATES,
        (ScanType::Sms, false) => SMS_LEGITIMATE_TEMPLATES,
        (ScanType::Email, true) => EMAIL_PHISHING_TEMPLATES,
        (ScanType::Email, false) => EMAIL_LEGITIMATE_TEMPLATES,
        (ScanType::Qr, true) => QR_PHISHING_TEMPLATES,
        (ScanType::Qr, false) => QR_LEGITIMATE_TEMPLATES,
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub scan_type: ScanType,
    pub threat_scale: ThreatScale,
    pub count: usize,
    /// Share of records labeled phishing, 0.0 to 1.0
    pub phishing_ratio: f64,
    pub max_content_length: usize,
    /// Fixed seed makes the batch reproducible
    pub seed: Option<u64>,
}

impl GeneratorConfig {
    pub fn new(scan_type: ScanType, count: usize) -> Self {
        Self {
            scan_type,
            threat_scale: ThreatScale::default(),
            count,
            phishing_ratio: DEFAULT_PHISHING_RATIO,
            max_content_length: scan_type.content_cap(),
            seed: None,
        }
    }

    pub fn with_phishing_ratio(mut self, phishing_ratio: f64) -> Self {
        self.phishing_ratio = phishing_ratio;
        self
    }

    pub fn with_threat_scale(mut self, threat_scale: ThreatScale) -> Self {
        self.threat_scale = threat_scale;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed.into();
        self
    }

    fn normalizer_config(&self) -> NormalizerConfig {
        NormalizerConfig::new().with_max_content_length(self.max_content_length)
    }

    pub fn validate(&self) -> Result<()> {
        self.normalizer_config().validate()?;
        if self.count == 0 {
            return Err(AppError::ValidationError("count must be > 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.phishing_ratio) {
            return Err(AppError::ValidationError(
                "phishing_ratio must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Records rendered for one generated dataset
#[derive(Debug, Clone)]
pub struct GeneratedBatch {
    pub dataset_id: String,
    pub records: Vec<LabeledRecord>,
    pub summary: DatasetSummary,
}

pub struct SyntheticGenerator {
    config: GeneratorConfig,
    resolver: LabelResolver,
    normalizer: RecordNormalizer,
    random: Box<dyn RandomSource>,
}

impl SyntheticGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        let resolver = LabelResolver::new(config.scan_type, config.threat_scale);

        // Template picks and indicator draws use separate streams so the
        // record contents for a seed stay stable
        let (template_random, indicator_random): (Box<dyn RandomSource>, Box<dyn RandomSource>) =
            match config.seed {
                Some(seed) => (
                    Box::new(StdRandomSource::seeded(seed)),
                    Box::new(StdRandomSource::seeded(seed.wrapping_add(1))),
                ),
                None => (
                    Box::new(StdRandomSource::new()),
                    Box::new(StdRandomSource::new()),
                ),
            };

        let normalizer =
            RecordNormalizer::with_random_source(config.normalizer_config(), indicator_random);

        Self {
            config,
            resolver,
            normalizer,
            random: template_random,
        }
    }

    /// Render one batch. The first `count * ratio` records are phishing,
    /// the rest legitimate; insert order is not significant.
    pub fn generate(&mut self, dataset_id: &str) -> Result<GeneratedBatch> {
        self.config.validate()?;

        let phishing_target = ((self.config.count as f64) * self.config.phishing_ratio).round()
            as usize;
        let phishing_target = phishing_target.min(self.config.count);

        let mut records = Vec::with_capacity(self.config.count);
        for i in 0..self.config.count {
            let is_phishing = i < phishing_target;
            let content = self.render_content(is_phishing);
            let threat_level = self.resolver.level_for(is_phishing);

            let record = self.normalizer.normalize(
                &content,
                is_phishing,
                threat_level,
                self.config.scan_type,
                dataset_id,
            )?;
            records.push(record);
        }

        let summary = BatchAggregator::summarize(&records);
        info!(
            "Generated {} synthetic {} records ({} phishing) for dataset {}",
            records.len(),
            self.config.scan_type,
            phishing_target,
            dataset_id
        );

        Ok(GeneratedBatch {
            dataset_id: dataset_id.to_string(),
            records,
            summary,
        })
    }

    fn render_content(&mut self, is_phishing: bool) -> String {
        let pool = template_pool(self.config.scan_type, is_phishing);
        let template = pool[self.random.next_below(pool.len())];
        let brand = BRANDS[self.random.next_below(BRANDS.len())];
        let code = 1000 + self.random.next_below(9000);

        template
            .replace("{brand}", brand)
            .replace("{code}", &code.to_string())
    }
}
