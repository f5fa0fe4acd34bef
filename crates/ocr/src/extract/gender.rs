use idscan_core::FieldKind;

use super::{FieldRules, Rule};

re!(re_gender, r"(?i)\b(female|male)\b|(ஆண்|பெண்)(?:[\s/:,.|]|$)");

/// Canonical "Male"/"Female" for a matched gender word.
pub fn normalize_gender(word: &str) -> Option<&'static str> {
    match word.chars().next()? {
        'm' | 'M' | 'ஆ' => Some("Male"),
        'f' | 'F' | 'ப' => Some("Female"),
        _ => None,
    }
}

fn gender_word(text: &str) -> Option<String> {
    re_gender()
        .captures_iter(text)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .find_map(|m| normalize_gender(m.as_str()))
        .map(str::to_string)
}

pub const GENDER: FieldRules = FieldRules::new(
    FieldKind::Gender,
    &[Rule { name: "gender_word", apply: gender_word }],
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_words_any_case() {
        assert_eq!(GENDER.extract("Gender: MALE").as_str(), "Male");
        assert_eq!(GENDER.extract("female").as_str(), "Female");
        assert_eq!(GENDER.extract("Sex : Female").as_str(), "Female");
    }

    #[test]
    fn tamil_words() {
        assert_eq!(GENDER.extract("ஆண் / MALE").as_str(), "Male");
        assert_eq!(GENDER.extract("பாலினம்: பெண்").as_str(), "Female");
    }

    #[test]
    fn gender_inside_other_words_is_ignored() {
        assert!(!GENDER.extract("Kamalesh Kumar").is_found());
        assert!(!GENDER.extract("ஆண்டவர்").is_found());
    }
}
