//! Text clean-up shared by the field rules.

/// Administrative and label words that never occur in a holder's name.
/// Matched as substrings of the lowercased line, so labels OCR glued onto
/// neighbouring text ("DateofBirth", "MeraAadhaar") are still caught.
const BLACKLIST: &[&str] = &[
    "government", "govt", "india", "aadhaar", "aadhar", "uidai", "unique", "identification",
    "authority", "election", "commission", "elector", "voter", "identity", "card", "father",
    "mother", "husband", "name", "birth", "year", "gender", "male", "sex", "dob", "address",
    "issue", "download", "enrolment", "signature",
    // Tamil
    "இந்திய", "அரசு", "ஆதார்", "தேர்தல்", "ஆணைய", "வாக்காளர்", "அடையாள", "தந்தை", "கணவர்",
    "பெயர்", "பிறந்த", "பிறப்பு", "பாலினம்", "முகவரி", "ஆண்", "பெண்",
];

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn strip_leading_non_letters(text: &str) -> &str {
    text.trim_start_matches(|c: char| !c.is_alphabetic())
}

/// Drop a trailing 1–2 digit token, which is usually a capital letter OCR
/// read as digits ("Balavisakan 14").
pub fn strip_trailing_digit_token(text: &str) -> &str {
    let trimmed = text.trim_end();
    match trimmed.rsplit_once(char::is_whitespace) {
        Some((head, tail))
            if (1..=2).contains(&tail.len()) && tail.chars().all(|c| c.is_ascii_digit()) =>
        {
            head.trim_end()
        }
        _ => trimmed,
    }
}

pub fn is_blacklisted(text: &str) -> bool {
    let lower = text.to_lowercase();
    BLACKLIST.iter().any(|term| lower.contains(term))
}

/// Title-case a name: tokens of at most two letters (ignoring periods) are
/// initials and become upper case, longer tokens are capitalized.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|token| {
            let letters = token.chars().filter(|&c| c != '.').count();
            if letters <= 2 {
                token.to_uppercase()
            } else {
                let mut chars = token.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                    None => String::new(),
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn as_digit(c: char) -> Option<char> {
    match c {
        '0'..='9' => Some(c),
        'O' | 'o' | 'Q' | 'D' => Some('0'),
        'I' | 'l' | '|' | 'i' => Some('1'),
        'Z' | 'z' => Some('2'),
        'S' | 's' => Some('5'),
        'G' => Some('6'),
        'B' => Some('8'),
        _ => None,
    }
}

fn as_letter(c: char) -> Option<char> {
    match c {
        'A'..='Z' => Some(c),
        '0' => Some('O'),
        '1' => Some('I'),
        '2' => Some('Z'),
        '5' => Some('S'),
        '6' => Some('G'),
        '8' => Some('B'),
        _ => None,
    }
}

/// Repair letter/digit confusions inside 4-character groups that are already
/// mostly digits ("12O4" → "1204"). Other tokens are left untouched.
pub fn repair_digit_groups(text: &str) -> String {
    text.lines()
        .map(|line| {
            line.split(' ')
                .map(|token| {
                    let chars: Vec<char> = token.chars().collect();
                    let digits = chars.iter().filter(|c| c.is_ascii_digit()).count();
                    if chars.len() != 4 || digits < 3 {
                        return token.to_string();
                    }
                    chars
                        .iter()
                        .map(|&c| as_digit(c))
                        .collect::<Option<String>>()
                        .unwrap_or_else(|| token.to_string())
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Repair a voter card token: letters in the 2–4 character prefix, digits in
/// the 6–10 character tail ("S0L324B432" → "SOL3248432").
pub fn repair_card_token(token: &str) -> Option<String> {
    let chars: Vec<char> = token.chars().collect();
    if !(8..=14).contains(&chars.len()) || !chars.iter().any(|c| c.is_ascii_digit()) {
        return None;
    }
    // Three-letter prefixes are by far the most common layout.
    [3usize, 2, 4].into_iter().find_map(|split| {
        let tail = chars.len().checked_sub(split)?;
        if !(6..=10).contains(&tail) {
            return None;
        }
        let prefix: String = chars[..split].iter().map(|&c| as_letter(c)).collect::<Option<_>>()?;
        let suffix: String = chars[split..].iter().map(|&c| as_digit(c)).collect::<Option<_>>()?;
        Some(format!("{prefix}{suffix}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_digit_token() {
        assert_eq!(strip_trailing_digit_token("Balavisakan 14"), "Balavisakan");
        assert_eq!(strip_trailing_digit_token("Arun Kumar 7 "), "Arun Kumar");
        assert_eq!(strip_trailing_digit_token("Arun 123"), "Arun 123");
        assert_eq!(strip_trailing_digit_token("Arun"), "Arun");
    }

    #[test]
    fn strips_leading_noise() {
        assert_eq!(strip_leading_non_letters("|: 12 Arun"), "Arun");
        assert_eq!(strip_leading_non_letters("Arun"), "Arun");
    }

    #[test]
    fn blacklist_matches_admin_words() {
        assert!(is_blacklisted("GOVERNMENT OF INDIA"));
        assert!(is_blacklisted("Father's Name"));
        assert!(is_blacklisted("Male"));
        assert!(is_blacklisted("FEMALE"));
        assert!(is_blacklisted("இந்திய அரசு"));
        assert!(is_blacklisted("Unique Identification Authority"));
    }

    #[test]
    fn blacklist_catches_terms_glued_into_other_words() {
        assert!(is_blacklisted("DateofBirth"));
        assert!(is_blacklisted("MeraAadhaar"));
        assert!(is_blacklisted("GovernmentofIndia"));
        assert!(is_blacklisted("Kamalesh Kumar"));
        assert!(is_blacklisted("ஆண்டவர்"));
    }

    #[test]
    fn blacklist_spares_plain_names() {
        assert!(!is_blacklisted("Arun Kumar"));
        assert!(!is_blacklisted("Vidya Sagar"));
        assert!(!is_blacklisted("Soundararajan"));
        assert!(!is_blacklisted("முருகன்"));
    }

    #[test]
    fn title_case_handles_initials() {
        assert_eq!(title_case("ARUN KUMAR"), "Arun Kumar");
        assert_eq!(title_case("k. arun"), "K. Arun");
        assert_eq!(title_case("r.k. SHARMA"), "R.K. Sharma");
        assert_eq!(title_case("S BALA"), "S Bala");
    }

    #[test]
    fn repairs_mostly_numeric_groups_only() {
        assert_eq!(repair_digit_groups("1234 S678 9O12"), "1234 5678 9012");
        assert_eq!(repair_digit_groups("SOLO 1234"), "SOLO 1234");
        assert_eq!(repair_digit_groups("DOB 12/3"), "DOB 12/3");
    }

    #[test]
    fn repairs_card_tokens() {
        assert_eq!(repair_card_token("S0L3248432").as_deref(), Some("SOL3248432"));
        assert_eq!(repair_card_token("SOL324B432").as_deref(), Some("SOL3248432"));
        assert_eq!(repair_card_token("SOLANKI"), None);
        assert_eq!(repair_card_token("12"), None);
    }
}
