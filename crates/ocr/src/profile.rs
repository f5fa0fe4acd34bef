use idscan_core::{DocumentType, ExtractedRecord, RecognitionResult, RegionPlan, RegionSpec, ScanConfig};

use crate::extract::{extract_aadhaar, extract_unknown, extract_voter};

/// Per-type scan behaviour: which regions to read and how their text is
/// turned into a record. Resolved once, right after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentProfile {
    /// Regions: details, then the number strip.
    Aadhaar { plan: RegionPlan },
    /// Regions: plain pass, then the enhanced pass.
    Voter { plan: RegionPlan },
    Unknown { plan: RegionPlan },
}

impl DocumentProfile {
    pub fn resolve(doc_type: DocumentType, config: &ScanConfig) -> Self {
        let plan = config.plan_for(doc_type).to_vec();
        match doc_type {
            DocumentType::Aadhaar => DocumentProfile::Aadhaar { plan },
            DocumentType::Voter => DocumentProfile::Voter { plan },
            DocumentType::Unknown => DocumentProfile::Unknown { plan },
        }
    }

    pub fn doc_type(&self) -> DocumentType {
        match self {
            DocumentProfile::Aadhaar { .. } => DocumentType::Aadhaar,
            DocumentProfile::Voter { .. } => DocumentType::Voter,
            DocumentProfile::Unknown { .. } => DocumentType::Unknown,
        }
    }

    pub fn plan(&self) -> &[RegionSpec] {
        match self {
            DocumentProfile::Aadhaar { plan }
            | DocumentProfile::Voter { plan }
            | DocumentProfile::Unknown { plan } => plan,
        }
    }

    /// Apply this type's rules to the recognized regions (in plan order) and
    /// attach the raw texts to the record.
    pub fn extract(&self, results: Vec<RecognitionResult>) -> ExtractedRecord {
        let text_at = |i: usize| results.get(i).map(|r| r.text.as_str()).unwrap_or("");
        let mut record = match self {
            DocumentProfile::Aadhaar { .. } => extract_aadhaar(text_at(0), text_at(1)),
            DocumentProfile::Voter { .. } => extract_voter(text_at(0), text_at(1)),
            DocumentProfile::Unknown { .. } => {
                let all: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
                extract_unknown(&all.join("\n"))
            }
        };
        record.raw_texts = results;
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_configured_plans() {
        let config = ScanConfig::default();
        let aadhaar = DocumentProfile::resolve(DocumentType::Aadhaar, &config);
        let labels: Vec<&str> = aadhaar.plan().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["details", "number"]);
        assert_eq!(aadhaar.doc_type(), DocumentType::Aadhaar);

        let voter = DocumentProfile::resolve(DocumentType::Voter, &config);
        assert_eq!(voter.plan().len(), 2);
        assert!(voter.plan()[1].enhancement.scale > 1.0);

        let unknown = DocumentProfile::resolve(DocumentType::Unknown, &config);
        assert_eq!(unknown.plan().len(), 1);
        assert!(unknown.plan()[0].rect.is_full());
    }

    #[test]
    fn extract_keeps_raw_texts_in_plan_order() {
        let profile = DocumentProfile::resolve(DocumentType::Aadhaar, &ScanConfig::default());
        let record = profile.extract(vec![
            RecognitionResult::new("details", "Arun Kumar\nDOB: 01/01/1980\nMALE"),
            RecognitionResult::new("number", "1234 5678 9012"),
        ]);
        assert_eq!(record.name.as_str(), "Arun Kumar");
        assert_eq!(record.id_number.as_str(), "1234 5678 9012");
        let labels: Vec<&str> = record.raw_texts.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["details", "number"]);
    }

    #[test]
    fn missing_regions_read_as_empty() {
        let profile = DocumentProfile::resolve(DocumentType::Voter, &ScanConfig::default());
        let record = profile.extract(vec![RecognitionResult::new("plain", "SOL3248432")]);
        assert_eq!(record.id_number.as_str(), "SOL3248432");
        assert!(!record.gender.is_found());
    }
}
