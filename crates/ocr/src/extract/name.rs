use idscan_core::FieldKind;

use super::normalize::{
    collapse_whitespace, is_blacklisted, strip_leading_non_letters, strip_trailing_digit_token,
    title_case,
};
use super::{FieldRules, Rule};

const MIN_NAME_CHARS: usize = 4;
const MAX_NAME_CHARS: usize = 50;
/// How many lines after a bare label are searched for its value.
const LABEL_LOOKAHEAD: usize = 2;

re!(re_name_grammar, r"^[\p{L}\p{M}][\p{L}\p{M} .]*$");
re!(
    re_name_label,
    r"(?im)^[ \t]*(?:elector['’`]?s[ \t]+)?name[ \t]*[:\-][ \t]*(\S[^\n]*?)[ \t]*$"
);
re!(re_name_label_ta, r"(?m)^[ \t]*(?:வாக்காளர்[ \t]+)?பெயர்[ \t]*[:\-][ \t]*(\S[^\n]*?)[ \t]*$");
re!(re_name_label_only, r"(?i)^(?:elector['’`]?s\s+)?name\s*[:\-]?$|^(?:வாக்காளர்\s+)?பெயர்\s*[:\-]?$");
re!(
    re_father_label,
    r"(?im)\bfather['’`]?s?(?:[ \t]+name)?[ \t]*[:\-.]?[ \t]*(\p{L}[^\n]*?)[ \t]*$"
);
re!(
    re_father_label_ta,
    r"(?m)தந்தை(?:யின்)?(?:[ \t]*பெயர்)?[ \t]*[:\-.]?[ \t]*(\p{L}[^\n]*?)[ \t]*$"
);
re!(
    re_father_label_only,
    r"(?i)^father['’`]?s?(?:\s+name)?\s*[:\-.]?$|^தந்தை(?:யின்)?(?:\s*பெயர்)?\s*[:\-.]?$"
);

/// Decide whether a single line is a person's name and, if so, return it
/// title-cased.
///
/// The line is stripped of leading noise and of a trailing 1–2 digit token,
/// then must be free of administrative words, consist only of letters,
/// combining marks, spaces and periods, and be 4–50 characters long. Multi-word
/// candidates need one token of at least three letters; a single word needs six.
pub fn detect_name_line(line: &str) -> Option<String> {
    let candidate = collapse_whitespace(strip_trailing_digit_token(strip_leading_non_letters(line.trim())));
    if candidate.is_empty() || is_blacklisted(&candidate) {
        return None;
    }
    if !re_name_grammar().is_match(&candidate) {
        return None;
    }
    let len = candidate.chars().count();
    if !(MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&len) {
        return None;
    }

    let words: Vec<&str> = candidate.split(' ').collect();
    let accepted = match words.as_slice() {
        [single] => single.chars().count() >= 6,
        many => many.iter().any(|w| w.chars().filter(|&c| c != '.').count() >= 3),
    };
    accepted.then(|| title_case(&candidate))
}

/// The first line anywhere in the text that reads as a name.
fn first_name_line(text: &str) -> Option<String> {
    text.lines().find_map(detect_name_line)
}

fn labeled(text: &str, patterns: &[&regex::Regex]) -> Option<String> {
    patterns
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .find_map(|caps| caps.get(1).and_then(|m| detect_name_line(m.as_str())))
}

/// Value on the lines following a label that stands alone on its line.
fn after_label_line(text: &str, is_label: impl Fn(&str) -> bool) -> Option<String> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    lines.iter().enumerate().filter(|(_, line)| is_label(**line)).find_map(|(i, _)| {
        lines
            .iter()
            .skip(i + 1)
            .filter(|l| !l.is_empty())
            .take(LABEL_LOOKAHEAD)
            .find_map(|l| detect_name_line(l))
    })
}

fn labeled_name(text: &str) -> Option<String> {
    labeled(text, &[re_name_label(), re_name_label_ta()])
}

fn name_after_label_line(text: &str) -> Option<String> {
    after_label_line(text, |line| re_name_label_only().is_match(line))
}

fn labeled_father_name(text: &str) -> Option<String> {
    labeled(text, &[re_father_label(), re_father_label_ta()])
}

fn father_after_label_line(text: &str) -> Option<String> {
    after_label_line(text, |line| re_father_label_only().is_match(line))
}

/// Aadhaar details region: the name line carries no label.
pub const AADHAAR_NAME: FieldRules = FieldRules::new(
    FieldKind::Name,
    &[Rule { name: "first_name_line", apply: first_name_line }],
);

/// Voter cards print several names; only an explicit label is trusted.
pub const VOTER_NAME: FieldRules = FieldRules::new(
    FieldKind::Name,
    &[
        Rule { name: "labeled_name", apply: labeled_name },
        Rule { name: "name_after_label_line", apply: name_after_label_line },
    ],
);

pub const FATHER_NAME: FieldRules = FieldRules::new(
    FieldKind::FatherName,
    &[
        Rule { name: "labeled_father_name", apply: labeled_father_name },
        Rule { name: "father_after_label_line", apply: father_after_label_line },
    ],
);

pub const UNKNOWN_NAME: FieldRules = FieldRules::new(
    FieldKind::Name,
    &[
        Rule { name: "labeled_name", apply: labeled_name },
        Rule { name: "name_after_label_line", apply: name_after_label_line },
        Rule { name: "first_name_line", apply: first_name_line },
    ],
);
