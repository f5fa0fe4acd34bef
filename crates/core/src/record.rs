use serde::{Deserialize, Serialize};
use std::fmt;

use crate::document::{DocumentType, FieldKind};

/// Canonical placeholder for a field no rule could extract.
pub const NOT_FOUND: &str = "Not found";

/// A field value that is never empty: either real text or [`NOT_FOUND`].
///
/// Serialized as a plain string so consumers always see a value, never
/// `null` and never a missing key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FieldValue(String);

impl FieldValue {
    /// Wrap an extracted value. Blank input collapses to the sentinel.
    pub fn found(value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Self::not_found()
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn not_found() -> Self {
        Self(NOT_FOUND.to_string())
    }

    pub fn from_option(value: Option<String>) -> Self {
        value.map(Self::found).unwrap_or_default()
    }

    pub fn is_found(&self) -> bool {
        self.0 != NOT_FOUND
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::not_found()
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::found(value)
    }
}

impl From<FieldValue> for String {
    fn from(value: FieldValue) -> Self {
        value.0
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw OCR output for one planned region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub label: String,
    pub text: String,
}

impl RecognitionResult {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self { label: label.into(), text: text.into() }
    }
}

/// The structured result of one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRecord {
    pub doc_type: DocumentType,
    pub name: FieldValue,
    pub dob: FieldValue,
    pub gender: FieldValue,
    /// Aadhaar number, voter card number, or a best-effort ID for unknown documents.
    pub id_number: FieldValue,
    /// Only Voter cards carry a father's name; `None` for every other type
    /// and then left out of the serialized record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_name: Option<FieldValue>,
    pub raw_texts: Vec<RecognitionResult>,
}

impl ExtractedRecord {
    /// A record where every field of the type's field set is the sentinel.
    pub fn empty(doc_type: DocumentType) -> Self {
        Self {
            doc_type,
            name: FieldValue::not_found(),
            dob: FieldValue::not_found(),
            gender: FieldValue::not_found(),
            id_number: FieldValue::not_found(),
            father_name: (doc_type == DocumentType::Voter).then(FieldValue::not_found),
            raw_texts: vec![],
        }
    }

    /// Value of a single field. Fields outside the type's set read as the sentinel.
    pub fn get(&self, kind: FieldKind) -> FieldValue {
        match kind {
            FieldKind::DocType => FieldValue::found(self.doc_type.label()),
            FieldKind::Name => self.name.clone(),
            FieldKind::Dob => self.dob.clone(),
            FieldKind::Gender => self.gender.clone(),
            FieldKind::AadhaarNumber | FieldKind::CardNumber | FieldKind::IdNumber => {
                self.id_number.clone()
            }
            FieldKind::FatherName => self.father_name.clone().unwrap_or_default(),
        }
    }

    /// The type's field set in display order.
    pub fn fields(&self) -> Vec<(FieldKind, FieldValue)> {
        self.doc_type
            .field_set()
            .iter()
            .map(|&kind| (kind, self.get(kind)))
            .collect()
    }

    /// Number of non-sentinel values in the type's field set. An unknown
    /// document type is shown but does not count as found.
    pub fn found_count(&self) -> usize {
        self.fields()
            .iter()
            .filter(|(kind, value)| match kind {
                FieldKind::DocType => self.doc_type != DocumentType::Unknown,
                _ => value.is_found(),
            })
            .count()
    }

    pub fn quality(&self, policy: &QualityPolicy) -> QualityBucket {
        policy.bucket(self.found_count(), self.doc_type.field_set().len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityBucket {
    Success,
    Partial,
    Poor,
}

impl fmt::Display for QualityBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityBucket::Success => write!(f, "success"),
            QualityBucket::Partial => write!(f, "partial"),
            QualityBucket::Poor => write!(f, "poor"),
        }
    }
}

/// How non-sentinel field counts map onto a [`QualityBucket`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum QualityPolicy {
    /// Absolute thresholds, independent of the field-set size.
    Fixed { success: usize, partial: usize },
    /// Thresholds as a fraction of the field-set size, rounded up.
    Proportional { success_ratio: f32, partial_ratio: f32 },
}

impl Default for QualityPolicy {
    fn default() -> Self {
        QualityPolicy::Fixed { success: 4, partial: 2 }
    }
}

impl QualityPolicy {
    pub fn bucket(&self, found: usize, field_count: usize) -> QualityBucket {
        let (success, partial) = match *self {
            QualityPolicy::Fixed { success, partial } => (success, partial),
            QualityPolicy::Proportional { success_ratio, partial_ratio } => (
                (success_ratio.clamp(0.0, 1.0) * field_count as f32).ceil() as usize,
                (partial_ratio.clamp(0.0, 1.0) * field_count as f32).ceil() as usize,
            ),
        };
        if found >= success {
            QualityBucket::Success
        } else if found >= partial {
            QualityBucket::Partial
        } else {
            QualityBucket::Poor
        }
    }
}
