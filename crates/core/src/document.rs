use serde::{Deserialize, Serialize};
use std::fmt;

/// The identity-document families the scanner knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    Aadhaar,
    Voter,
    Unknown,
}

impl DocumentType {
    /// Human-facing label, also used as the `docType` value of a record.
    pub fn label(self) -> &'static str {
        match self {
            DocumentType::Aadhaar => "Aadhaar Card",
            DocumentType::Voter => "Voter ID",
            DocumentType::Unknown => "Unknown",
        }
    }

    /// Lowercase slug used in export file names.
    pub fn slug(self) -> &'static str {
        match self {
            DocumentType::Aadhaar => "aadhaar",
            DocumentType::Voter => "voter",
            DocumentType::Unknown => "unknown",
        }
    }

    /// Ordered field set reported for this document type.
    pub fn field_set(self) -> &'static [FieldKind] {
        match self {
            DocumentType::Aadhaar => &[
                FieldKind::DocType,
                FieldKind::Name,
                FieldKind::Dob,
                FieldKind::Gender,
                FieldKind::AadhaarNumber,
            ],
            DocumentType::Voter => &[
                FieldKind::DocType,
                FieldKind::CardNumber,
                FieldKind::Name,
                FieldKind::FatherName,
                FieldKind::Dob,
                FieldKind::Gender,
            ],
            DocumentType::Unknown => &[
                FieldKind::DocType,
                FieldKind::Name,
                FieldKind::Dob,
                FieldKind::Gender,
                FieldKind::IdNumber,
            ],
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aadhaar" | "aadhaar card" => Ok(DocumentType::Aadhaar),
            "voter" | "voter id" => Ok(DocumentType::Voter),
            "unknown" => Ok(DocumentType::Unknown),
            other => Err(format!("Unknown document type: '{other}'")),
        }
    }
}

/// A named slot in an extracted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    DocType,
    Name,
    Dob,
    Gender,
    AadhaarNumber,
    CardNumber,
    IdNumber,
    FatherName,
}

impl FieldKind {
    /// Key used when the record is exported or rendered.
    pub fn key(self) -> &'static str {
        match self {
            FieldKind::DocType => "docType",
            FieldKind::Name => "name",
            FieldKind::Dob => "dob",
            FieldKind::Gender => "gender",
            FieldKind::AadhaarNumber => "aadhaar",
            FieldKind::CardNumber => "cardNo",
            FieldKind::IdNumber => "idNumber",
            FieldKind::FatherName => "fatherName",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn labels_match_record_values() {
        assert_eq!(DocumentType::Aadhaar.to_string(), "Aadhaar Card");
        assert_eq!(DocumentType::Voter.to_string(), "Voter ID");
    }

    #[test]
    fn document_type_from_str_roundtrip() {
        for t in [DocumentType::Aadhaar, DocumentType::Voter, DocumentType::Unknown] {
            assert_eq!(DocumentType::from_str(t.label()).unwrap(), t);
            assert_eq!(DocumentType::from_str(t.slug()).unwrap(), t);
        }
        assert!(DocumentType::from_str("passport").is_err());
    }

    #[test]
    fn field_set_sizes() {
        assert_eq!(DocumentType::Aadhaar.field_set().len(), 5);
        assert_eq!(DocumentType::Voter.field_set().len(), 6);
        assert_eq!(DocumentType::Unknown.field_set().len(), 5);
    }
}
