use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::document::DocumentType;
use crate::record::QualityPolicy;

/// Slack allowed when checking that `x + w` / `y + h` stay inside the unit square.
const RATIO_EPSILON: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// A rectangle in fractional image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectRatio {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl RectRatio {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    /// Build from horizontal `[x0, x1]` and vertical `[y0, y1]` spans.
    pub fn from_spans(x0: f64, x1: f64, y0: f64, y1: f64) -> Self {
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    pub fn is_full(&self) -> bool {
        *self == Self::full()
    }

    pub fn validate(&self) -> Result<(), String> {
        let parts = [self.x, self.y, self.w, self.h];
        if parts.iter().any(|v| !v.is_finite() || *v < 0.0 || *v > 1.0) {
            return Err(format!("rectangle components must lie in [0, 1]: {self:?}"));
        }
        if self.w <= 0.0 || self.h <= 0.0 {
            return Err(format!("rectangle must have a positive area: {self:?}"));
        }
        if self.x + self.w > 1.0 + RATIO_EPSILON || self.y + self.h > 1.0 + RATIO_EPSILON {
            return Err(format!("rectangle exceeds image bounds: {self:?}"));
        }
        Ok(())
    }
}

/// Resampling and contrast adjustments applied after cropping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Enhancement {
    /// Linear scale factor (2.0 doubles width and height).
    pub scale: f32,
    /// Contrast relative to the source, 100 = unchanged.
    pub contrast_percent: u32,
}

impl Enhancement {
    pub fn identity() -> Self {
        Self { scale: 1.0, contrast_percent: 100 }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.scale.is_finite() || self.scale <= 0.0 || self.scale > 8.0 {
            return Err(format!("scale must be in (0, 8]: {}", self.scale));
        }
        if self.contrast_percent == 0 || self.contrast_percent > 400 {
            return Err(format!("contrast_percent must be in [1, 400]: {}", self.contrast_percent));
        }
        Ok(())
    }
}

impl Default for Enhancement {
    fn default() -> Self {
        Self::identity()
    }
}

/// One image region to recognize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSpec {
    pub label: String,
    pub rect: RectRatio,
    #[serde(default)]
    pub enhancement: Enhancement,
    /// Tesseract-style language list, e.g. `eng+tam`.
    #[serde(default = "default_languages")]
    pub languages: String,
    /// Relative share of the progress bar this region occupies.
    #[serde(default = "default_region_weight")]
    pub weight: u32,
}

impl RegionSpec {
    pub fn new(label: &str, rect: RectRatio) -> Self {
        Self {
            label: label.to_string(),
            rect,
            enhancement: Enhancement::identity(),
            languages: default_languages(),
            weight: default_region_weight(),
        }
    }

    pub fn with_enhancement(mut self, scale: f32, contrast_percent: u32) -> Self {
        self.enhancement = Enhancement { scale, contrast_percent };
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    fn validate(&self) -> Result<(), String> {
        if self.label.trim().is_empty() {
            return Err("region label must not be empty".into());
        }
        if self.weight == 0 {
            return Err(format!("region '{}' must have a positive weight", self.label));
        }
        self.rect.validate().map_err(|e| format!("region '{}': {e}", self.label))?;
        self.enhancement.validate().map_err(|e| format!("region '{}': {e}", self.label))
    }
}

fn default_languages() -> String {
    "eng+tam".to_string()
}

fn default_region_weight() -> u32 {
    40
}

/// Ordered regions to recognize for one document type.
pub type RegionPlan = Vec<RegionSpec>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub aadhaar: RegionPlan,
    pub voter: RegionPlan,
    pub unknown: RegionPlan,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            aadhaar: vec![
                RegionSpec::new("details", RectRatio::from_spans(0.33, 1.0, 0.10, 0.72)),
                RegionSpec::new("number", RectRatio::from_spans(0.05, 0.95, 0.72, 0.84)),
            ],
            voter: vec![
                RegionSpec::new("plain", RectRatio::full()),
                RegionSpec::new("enhanced", RectRatio::full()).with_enhancement(2.0, 180),
            ],
            unknown: vec![RegionSpec::new("full", RectRatio::full())],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Total attempts per region, including the first.
    pub attempts: u32,
    pub retry_backoff_ms: u64,
    pub timeout_secs: u64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self { attempts: 2, retry_backoff_ms: 250, timeout_secs: 120 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub extraction_weight: u32,
    /// Delay before a finished run drops back to idle / 0 %.
    pub reset_delay_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { extraction_weight: 5, reset_delay_ms: 1500 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_hours: 24 }
    }
}

/// Every tunable of a scan. The region ratios are empirical and meant to be
/// corrected here rather than in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Cheap first pass used for classification.
    pub detection: RegionSpec,
    pub plans: PlanConfig,
    pub recognition: RecognitionConfig,
    pub progress: ProgressConfig,
    pub quality: QualityPolicy,
    pub cache: CacheConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            detection: RegionSpec::new("detect", RectRatio::from_spans(0.0, 1.0, 0.0, 0.35))
                .with_weight(20),
            plans: PlanConfig::default(),
            recognition: RecognitionConfig::default(),
            progress: ProgressConfig::default(),
            quality: QualityPolicy::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl ScanConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn plan_for(&self, doc_type: DocumentType) -> &[RegionSpec] {
        match doc_type {
            DocumentType::Aadhaar => &self.plans.aadhaar,
            DocumentType::Voter => &self.plans.voter,
            DocumentType::Unknown => &self.plans.unknown,
        }
    }

    /// Largest total region weight across all plans.
    pub fn heaviest_plan_weight(&self) -> u32 {
        [DocumentType::Aadhaar, DocumentType::Voter, DocumentType::Unknown]
            .into_iter()
            .map(|t| self.plan_for(t).iter().map(|r| r.weight).sum::<u32>())
            .max()
            .unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detection.validate().map_err(ConfigError::Invalid)?;

        for doc_type in [DocumentType::Aadhaar, DocumentType::Voter, DocumentType::Unknown] {
            let plan = self.plan_for(doc_type);
            if plan.is_empty() {
                return Err(ConfigError::Invalid(format!("{doc_type} plan has no regions")));
            }
            let mut labels = HashSet::new();
            for region in plan {
                region.validate().map_err(ConfigError::Invalid)?;
                if !labels.insert(region.label.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "{doc_type} plan repeats region label '{}'",
                        region.label
                    )));
                }
            }
        }

        if self.recognition.attempts == 0 {
            return Err(ConfigError::Invalid("recognition.attempts must be at least 1".into()));
        }
        if self.progress.extraction_weight == 0 {
            return Err(ConfigError::Invalid("progress.extraction_weight must be positive".into()));
        }
        if self.cache.ttl_hours == 0 {
            return Err(ConfigError::Invalid("cache.ttl_hours must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ScanConfig::default().validate().unwrap();
    }

    #[test]
    fn default_aadhaar_plan_matches_tuned_ratios() {
        let config = ScanConfig::default();
        let plan = config.plan_for(DocumentType::Aadhaar);
        assert_eq!(plan[0].label, "details");
        assert!((plan[0].rect.x - 0.33).abs() < 1e-9);
        assert!((plan[0].rect.w - 0.67).abs() < 1e-9);
        assert!((plan[0].rect.h - 0.62).abs() < 1e-9);
        assert!((plan[1].rect.y - 0.72).abs() < 1e-9);
        assert!((plan[1].rect.h - 0.12).abs() < 1e-9);
    }

    #[test]
    fn default_voter_plan_enhances_second_pass() {
        let config = ScanConfig::default();
        let plan = config.plan_for(DocumentType::Voter);
        assert!(plan[0].rect.is_full() && plan[0].enhancement.is_identity());
        assert_eq!(plan[1].enhancement, Enhancement { scale: 2.0, contrast_percent: 180 });
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ScanConfig::from_toml_str(
            r#"
            [recognition]
            attempts = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.recognition.attempts, 3);
        assert_eq!(config.recognition.timeout_secs, 120);
        assert_eq!(config.plans, PlanConfig::default());
    }

    #[test]
    fn region_ratios_can_be_overridden() {
        let config = ScanConfig::from_toml_str(
            r#"
            [[plans.aadhaar]]
            label = "details"
            rect = { x = 0.30, y = 0.12, w = 0.70, h = 0.60 }

            [[plans.aadhaar]]
            label = "number"
            rect = { x = 0.0, y = 0.70, w = 1.0, h = 0.15 }
            enhancement = { scale = 1.5, contrast_percent = 140 }
            "#,
        )
        .unwrap();
        let plan = config.plan_for(DocumentType::Aadhaar);
        assert!((plan[0].rect.x - 0.30).abs() < 1e-9);
        assert_eq!(plan[1].enhancement.contrast_percent, 140);
        assert_eq!(plan[1].languages, "eng+tam");
    }

    #[test]
    fn out_of_bounds_rect_rejected() {
        let err = ScanConfig::from_toml_str(
            r#"
            [[plans.voter]]
            label = "plain"
            rect = { x = 0.5, y = 0.0, w = 0.6, h = 1.0 }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    }

    #[test]
    fn duplicate_labels_rejected() {
        let mut config = ScanConfig::default();
        config.plans.voter[1].label = "plain".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_attempts_rejected() {
        let mut config = ScanConfig::default();
        config.recognition.attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn proportional_quality_policy_from_toml() {
        let config = ScanConfig::from_toml_str(
            r#"
            [quality]
            mode = "proportional"
            success_ratio = 0.8
            partial_ratio = 0.4
            "#,
        )
        .unwrap();
        assert!(matches!(config.quality, QualityPolicy::Proportional { .. }));
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let config = ScanConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(ScanConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn heaviest_plan_weight_uses_largest_plan() {
        assert_eq!(ScanConfig::default().heaviest_plan_weight(), 80);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idscan.toml");
        std::fs::write(&path, "[cache]\nttl_hours = 12\n").unwrap();
        assert_eq!(ScanConfig::load(&path).unwrap().cache.ttl_hours, 12);
    }
}
