use idscan_core::DocumentType;
use tracing::debug;

use crate::extract::normalize::collapse_whitespace;
use crate::extract::{find_aadhaar_number, find_card_number};

const VOTER_KEYWORDS: &[&str] = &["election", "elector", "voter", "தேர்தல்", "வாக்காளர்"];
const AADHAAR_KEYWORDS: &[&str] = &[
    "aadhaar",
    "aadhar",
    "uidai",
    "government of india",
    "ஆதார்",
    "இந்திய அரசு",
];

/// Classify a document from the text of its header strip.
///
/// Keywords are checked before structure, voter before Aadhaar: a voter card
/// also says "India", and its card number must win over a stray 12-digit run.
pub fn classify(text: &str) -> DocumentType {
    let (doc_type, signal) = classify_with_signal(text);
    debug!(%doc_type, signal, "classified document");
    doc_type
}

/// Like [`classify`], also naming the signal that decided it.
pub fn classify_with_signal(text: &str) -> (DocumentType, &'static str) {
    let lower = collapse_whitespace(&text.to_lowercase());
    if VOTER_KEYWORDS.iter().any(|k| lower.contains(k)) {
        (DocumentType::Voter, "voter keyword")
    } else if AADHAAR_KEYWORDS.iter().any(|k| lower.contains(k)) {
        (DocumentType::Aadhaar, "aadhaar keyword")
    } else if find_card_number(text).is_some() {
        (DocumentType::Voter, "card number pattern")
    } else if find_aadhaar_number(text).is_some() {
        (DocumentType::Aadhaar, "12-digit pattern")
    } else {
        (DocumentType::Unknown, "no signal")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_decide_first() {
        assert_eq!(classify("ELECTION C"), DocumentType::Voter);
        assert_eq!(classify("GOVERNMENT OF\nINDIA"), DocumentType::Aadhaar);
        assert_eq!(classify("இந்திய அரசு"), DocumentType::Aadhaar);
        assert_eq!(classify("இந்திய தேர்தல் ஆணையம்"), DocumentType::Voter);
    }

    #[test]
    fn voter_keywords_beat_aadhaar_keywords() {
        assert_eq!(
            classify("ELECTION COMMISSION OF INDIA / GOVERNMENT OF INDIA"),
            DocumentType::Voter
        );
    }

    #[test]
    fn structure_fallback() {
        assert_eq!(classify("xx SOL3248432 yy"), DocumentType::Voter);
        assert_eq!(classify("EPICNoSOL3248432"), DocumentType::Voter);
        assert_eq!(classify("1234 5678 9012"), DocumentType::Aadhaar);
        assert_eq!(classify("ABC1234567 1234 5678 9012"), DocumentType::Voter);
        assert_eq!(classify("random receipt text"), DocumentType::Unknown);
        assert_eq!(classify(""), DocumentType::Unknown);
    }

    #[test]
    fn classification_is_deterministic() {
        let text = "Unique Identification Authority of India\nAADHAAR";
        let first = classify_with_signal(text);
        for _ in 0..10 {
            assert_eq!(classify_with_signal(text), first);
        }
        assert_eq!(first, (DocumentType::Aadhaar, "aadhaar keyword"));
    }
}
