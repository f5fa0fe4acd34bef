use chrono::NaiveDate;
use idscan_core::FieldKind;

use super::{FieldRules, Rule};

const MIN_BIRTH_YEAR: i32 = 1900;
const MAX_BIRTH_YEAR: i32 = 2020;

re!(re_date_token, r"\b(\d{1,2} ?[/\-.] ?\d{1,2} ?[/\-.] ?\d{2,4})\b");
re!(
    re_dob_label,
    r"(?i)(?:\bd\.?\s?[o0]\.?\s?b\b\.?|date\s+of\s+birth|\bbirth\b|\bage\b)[^\d\n]{0,24}(\d{1,2} ?[/\-.] ?\d{1,2} ?[/\-.] ?\d{2,4})"
);
re!(
    re_dob_label_ta,
    r"(?:பிறந்த\s*(?:தேதி|நாள்)|பிறப்பு)[^\d\n]{0,24}(\d{1,2} ?[/\-.] ?\d{1,2} ?[/\-.] ?\d{2,4})"
);

/// Normalize a date-shaped token to `DD/MM/YYYY`.
///
/// Accepts `/`, `-` or `.` separators. The token must have exactly three
/// numeric parts, a four digit year between 1900 and 2020, and name a real
/// calendar day. Sanitizing an already sanitized date returns it unchanged.
pub fn sanitize_dob(raw: &str) -> Option<String> {
    let parts: Vec<&str> = raw.split(['/', '-', '.']).map(str::trim).collect();
    let &[day, month, year] = parts.as_slice() else {
        return None;
    };
    let numeric = |s: &str, max_len: usize| {
        !s.is_empty() && s.len() <= max_len && s.chars().all(|c| c.is_ascii_digit())
    };
    if !numeric(day, 2) || !numeric(month, 2) || !numeric(year, 4) || year.len() != 4 {
        return None;
    }

    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    if !(MIN_BIRTH_YEAR..=MAX_BIRTH_YEAR).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)?;
    Some(format!("{day:02}/{month:02}/{year}"))
}

fn first_valid<'h>(captures: impl Iterator<Item = regex::Captures<'h>>) -> Option<String> {
    captures.filter_map(|c| c.get(1)).find_map(|m| sanitize_dob(m.as_str()))
}

fn labeled_dob(text: &str) -> Option<String> {
    first_valid(re_dob_label().captures_iter(text))
}

fn labeled_dob_tamil(text: &str) -> Option<String> {
    first_valid(re_dob_label_ta().captures_iter(text))
}

/// Any date on a line that is not an issue date.
fn unlabeled_dob(text: &str) -> Option<String> {
    text.lines()
        .filter(|line| !line.to_lowercase().contains("issue"))
        .find_map(|line| first_valid(re_date_token().captures_iter(line)))
}

pub const DOB: FieldRules = FieldRules::new(
    FieldKind::Dob,
    &[
        Rule { name: "labeled_dob", apply: labeled_dob },
        Rule { name: "labeled_dob_tamil", apply: labeled_dob_tamil },
        Rule { name: "unlabeled_dob", apply: unlabeled_dob },
    ],
);
