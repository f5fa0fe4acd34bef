use idscan_core::FieldKind;

use super::normalize::{repair_card_token, repair_digit_groups};
use super::{FieldRules, Rule};

// No word boundaries: OCR often glues the number onto its label
// ("EPICNoSOL3248432"). The digit guards keep longer runs from matching.
re!(re_aadhaar, r"(?:^|\D)(\d{4})\s{0,6}(\d{4})\s{0,6}(\d{4})(?:\D|$)");
re!(re_card, r"([A-Z]{2,4}\d{6,10})(?:\D|$)");
re!(re_card_exact, r"^[A-Z]{2,4}\d{6,10}$");

/// First 12-digit number laid out as three groups of four, formatted
/// `dddd dddd dddd`.
pub fn find_aadhaar_number(text: &str) -> Option<String> {
    re_aadhaar()
        .captures(text)
        .map(|c| format!("{} {} {}", &c[1], &c[2], &c[3]))
}

/// First voter card number: 2–4 capital letters followed by 6–10 digits.
pub fn find_card_number(text: &str) -> Option<String> {
    re_card().captures(text).map(|c| c[1].to_string())
}

fn repaired_aadhaar(text: &str) -> Option<String> {
    find_aadhaar_number(&repair_digit_groups(text))
}

fn repaired_card_number(text: &str) -> Option<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter_map(repair_card_token)
        .find(|token| re_card_exact().is_match(token))
}

pub const AADHAAR_NUMBER: FieldRules = FieldRules::new(
    FieldKind::AadhaarNumber,
    &[
        Rule { name: "grouped_digits", apply: find_aadhaar_number },
        Rule { name: "repaired_grouped_digits", apply: repaired_aadhaar },
    ],
);

pub const CARD_NUMBER: FieldRules = FieldRules::new(
    FieldKind::CardNumber,
    &[
        Rule { name: "card_pattern", apply: find_card_number },
        Rule { name: "repaired_card_pattern", apply: repaired_card_number },
    ],
);

/// Unknown documents: try the Aadhaar layout first, then the voter layout.
pub const UNKNOWN_ID_NUMBER: FieldRules = FieldRules::new(
    FieldKind::IdNumber,
    &[
        Rule { name: "grouped_digits", apply: find_aadhaar_number },
        Rule { name: "card_pattern", apply: find_card_number },
        Rule { name: "repaired_grouped_digits", apply: repaired_aadhaar },
    ],
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aadhaar_groups_are_reformatted() {
        assert_eq!(find_aadhaar_number("1234 5678 9012").as_deref(), Some("1234 5678 9012"));
        assert_eq!(find_aadhaar_number("123456789012").as_deref(), Some("1234 5678 9012"));
        assert_eq!(find_aadhaar_number("1234  5678\n9012").as_deref(), Some("1234 5678 9012"));
        assert_eq!(find_aadhaar_number("12345678901"), None);
        assert_eq!(find_aadhaar_number("1234567890123"), None);
    }

    #[test]
    fn numbers_glued_to_labels_are_found() {
        assert_eq!(find_card_number("EPICNoSOL3248432").as_deref(), Some("SOL3248432"));
        assert_eq!(find_card_number("EPIC No.SOL3248432Name").as_deref(), Some("SOL3248432"));
        assert_eq!(find_aadhaar_number("AadhaarNo1234 5678 9012").as_deref(), Some("1234 5678 9012"));
        assert_eq!(find_card_number("SOL32484321234"), None);
    }

    #[test]
    fn aadhaar_digit_confusions_are_repaired() {
        let eval = AADHAAR_NUMBER.evaluate("1234 S678 9O12");
        assert_eq!(eval.value.as_str(), "1234 5678 9012");
        assert_eq!(eval.rule, Some("repaired_grouped_digits"));
    }

    #[test]
    fn card_number_first_match() {
        let text = "ELECTION COMMISSION OF INDIA\nSOL3248432\nABC1234567";
        assert_eq!(CARD_NUMBER.extract(text).as_str(), "SOL3248432");
        assert_eq!(find_card_number("Sol3248432"), None);
    }

    #[test]
    fn card_number_repair() {
        let eval = CARD_NUMBER.evaluate("EPIC No: S0L324B432");
        assert_eq!(eval.value.as_str(), "SOL3248432");
        assert_eq!(eval.rule, Some("repaired_card_pattern"));
    }

    #[test]
    fn unknown_prefers_aadhaar_layout() {
        assert_eq!(UNKNOWN_ID_NUMBER.extract("SOL3248432 1234 5678 9012").as_str(), "1234 5678 9012");
        assert_eq!(UNKNOWN_ID_NUMBER.extract("ID SOL3248432").as_str(), "SOL3248432");
    }
}
