use idscan_core::{DocumentType, ExtractedRecord};

use super::{
    AADHAAR_NAME, AADHAAR_NUMBER, CARD_NUMBER, DOB, FATHER_NAME, GENDER, UNKNOWN_ID_NUMBER,
    UNKNOWN_NAME, VOTER_NAME,
};

/// Aadhaar front: demographics from the details region, the number from its
/// own strip below.
pub fn extract_aadhaar(details: &str, number: &str) -> ExtractedRecord {
    let mut record = ExtractedRecord::empty(DocumentType::Aadhaar);
    record.name = AADHAAR_NAME.extract(details);
    record.dob = DOB.extract(details);
    record.gender = GENDER.extract(details);
    record.id_number = AADHAAR_NUMBER.extract(number);
    record
}

/// Voter card: the plain and enhanced passes are searched together; gender
/// prefers the enhanced pass.
pub fn extract_voter(plain: &str, enhanced: &str) -> ExtractedRecord {
    let combined = format!("{plain}\n{enhanced}");
    let mut record = ExtractedRecord::empty(DocumentType::Voter);
    record.id_number = CARD_NUMBER.extract(&combined);
    record.name = VOTER_NAME.extract(&combined);
    record.father_name = Some(FATHER_NAME.extract(&combined));
    record.dob = DOB.extract(&combined);
    record.gender = match GENDER.extract(enhanced) {
        value if value.is_found() => value,
        _ => GENDER.extract(plain),
    };
    record
}

pub fn extract_unknown(text: &str) -> ExtractedRecord {
    let mut record = ExtractedRecord::empty(DocumentType::Unknown);
    record.name = UNKNOWN_NAME.extract(text);
    record.dob = DOB.extract(text);
    record.gender = GENDER.extract(text);
    record.id_number = UNKNOWN_ID_NUMBER.extract(text);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use idscan_core::{FieldValue, QualityBucket, QualityPolicy};

    #[test]
    fn aadhaar_front() {
        let details = "GOVERNMENT OF INDIA\nBalavisakan 14\nDOB: 05/07/1990\nMale";
        let record = extract_aadhaar(details, "1234 5678 9012");
        assert_eq!(record.name.as_str(), "Balavisakan");
        assert_eq!(record.dob.as_str(), "05/07/1990");
        assert_eq!(record.gender.as_str(), "Male");
        assert_eq!(record.id_number.as_str(), "1234 5678 9012");
        assert_eq!(record.father_name, None);
        assert_eq!(record.quality(&QualityPolicy::default()), QualityBucket::Success);
    }

    #[test]
    fn aadhaar_number_only_read_from_number_region() {
        let record = extract_aadhaar("Arun Kumar\n1234 5678 9012", "");
        assert!(!record.id_number.is_found());
    }

    #[test]
    fn voter_card_without_name_label() {
        let text = "ELECTION COMMISSION OF INDIA\nSOL3248432\nFather's Name: Soundararajan";
        let record = extract_voter(text, text);
        assert_eq!(record.id_number.as_str(), "SOL3248432");
        assert_eq!(record.father_name.as_ref().map(FieldValue::as_str), Some("Soundararajan"));
        assert_eq!(record.name.as_str(), "Not found");
    }

    #[test]
    fn voter_gender_falls_back_to_plain_pass() {
        let record = extract_voter("Sex: Female", "Sex: F3male");
        assert_eq!(record.gender.as_str(), "Female");
        let record = extract_voter("Sex: Female", "Sex: Male");
        assert_eq!(record.gender.as_str(), "Male");
    }

    #[test]
    fn voter_fields_split_across_passes() {
        let record = extract_voter(
            "Name : MURUGAN S\nDate of Birth: 14-03-1979",
            "ABC1234567\nFather's Name: Subramanian",
        );
        assert_eq!(record.id_number.as_str(), "ABC1234567");
        assert_eq!(record.name.as_str(), "Murugan S");
        assert_eq!(record.dob.as_str(), "14/03/1979");
        assert_eq!(record.found_count(), 5);
    }

    #[test]
    fn unknown_runs_every_rule() {
        let record = extract_unknown("Name: Priya Devi\nDOB 01.01.1985\nFEMALE\n1234 5678 9012");
        assert_eq!(record.name.as_str(), "Priya Devi");
        assert_eq!(record.dob.as_str(), "01/01/1985");
        assert_eq!(record.gender.as_str(), "Female");
        assert_eq!(record.id_number.as_str(), "1234 5678 9012");
        // docType is never counted for unknown documents.
        assert_eq!(record.found_count(), 4);
    }
}
