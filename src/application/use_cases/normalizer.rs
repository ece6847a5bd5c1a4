// ============================================================
// RECORD NORMALIZER
// ============================================================
// Builds the canonical record: trim, length gate, truncation,
// indicator draw, identifier. Truncation happens after full field
// extraction, never before.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::{AppError, Result};
use crate::domain::indicators;
use crate::domain::record::LabeledRecord;
use crate::domain::scan::{ScanType, ThreatLevel};

/// Minimum content length after trimming, in characters
pub const MIN_CONTENT_LENGTH: usize = 3;

/// Truncation cap applied when the caller supplies none
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 500;

/// Source of randomness for indicator draws.
/// Injected so tests can supply a fixed sequence and assert exact sets.
pub trait RandomSource: Send {
    /// Uniform value in `0..bound`; bound is always >= 1
    fn next_below(&mut self, bound: usize) -> usize;
}

/// Default source backed by a seedable PRNG
pub struct StdRandomSource {
    rng: StdRng,
}

impl StdRandomSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Fixed seed; used by the synthetic generator and by tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for StdRandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for StdRandomSource {
    fn next_below(&mut self, bound: usize) -> usize {
        self.rng.gen_range(0..bound)
    }
}

/// Normalizer limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Truncation cap in characters (pipelines use 160 to 2000)
    pub max_content_length: usize,

    /// Rows shorter than this after trimming are dropped
    pub min_content_length: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            min_content_length: MIN_CONTENT_LENGTH,
        }
    }
}

impl NormalizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits matching the training cap for a scan type
    pub fn for_scan_type(scan_type: ScanType) -> Self {
        Self {
            max_content_length: scan_type.content_cap(),
            ..Default::default()
        }
    }

    pub fn with_max_content_length(mut self, max_content_length: usize) -> Self {
        self.max_content_length = max_content_length;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.max_content_length == 0 {
            return Err(AppError::ValidationError(
                "max_content_length must be > 0".to_string(),
            ));
        }
        if self.min_content_length == 0 {
            return Err(AppError::ValidationError(
                "min_content_length must be > 0".to_string(),
            ));
        }
        if self.min_content_length > self.max_content_length {
            return Err(AppError::ValidationError(
                "min_content_length must be <= max_content_length".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builds canonical records from resolved row data
pub struct RecordNormalizer {
    config: NormalizerConfig,
    random: Box<dyn RandomSource>,
}

impl RecordNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self {
            config,
            random: Box::new(StdRandomSource::new()),
        }
    }

    /// Use an injected random source instead of the entropy-seeded default
    pub fn with_random_source(config: NormalizerConfig, random: Box<dyn RandomSource>) -> Self {
        Self { config, random }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Build one canonical record.
    /// Rejects content shorter than the minimum after trimming; truncates
    /// content over the cap to an exact character prefix. Legitimate records
    /// never carry indicators.
    pub fn normalize(
        &mut self,
        content: &str,
        is_phishing: bool,
        threat_level: ThreatLevel,
        scan_type: ScanType,
        dataset_id: &str,
    ) -> Result<LabeledRecord> {
        let trimmed = content.trim();
        let char_count = trimmed.chars().count();

        if char_count < self.config.min_content_length {
            return Err(AppError::ContentTooShort(format!(
                "{} chars after trim, minimum {}",
                char_count, self.config.min_content_length
            )));
        }

        let content = if char_count > self.config.max_content_length {
            trimmed
                .chars()
                .take(self.config.max_content_length)
                .collect()
        } else {
            trimmed.to_string()
        };

        let indicators = if is_phishing {
            self.draw_indicators(scan_type)
        } else {
            Vec::new()
        };

        Ok(LabeledRecord {
            id: Uuid::new_v4().to_string(),
            dataset_id: dataset_id.to_string(),
            content,
            scan_type,
            is_phishing,
            threat_level,
            indicators,
            created_at: Utc::now().to_rfc3339(),
        })
    }

    /// 1 to 3 distinct tags drawn from the scan type's vocabulary
    fn draw_indicators(&mut self, scan_type: ScanType) -> Vec<String> {
        let vocabulary = indicators::vocabulary_for(scan_type);
        let max_draw = vocabulary.len().min(3);
        let count = 1 + self.random.next_below(max_draw);

        let mut pool: Vec<&str> = vocabulary.to_vec();
        let mut drawn = Vec::with_capacity(count);
        for _ in 0..count {
            let idx = self.random.next_below(pool.len());
            drawn.push(pool.remove(idx).to_string());
        }
        drawn
    }
}
