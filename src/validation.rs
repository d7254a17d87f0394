//! Field rules shared by the resource handlers.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::ValidationErrors;

pub const MAX_NAME_CHARS: usize = 255;
pub const MAX_TEXT_CHARS: usize = 1000;
pub const MAX_SLUG_BYTES: usize = 255;

/// Letters, digits, whitespace and `- _ . , &`; at least one character.
pub fn is_display_name(value: &str) -> bool {
    !value.is_empty()
        && value.chars().all(|c| {
            c.is_alphabetic()
                || c.is_numeric()
                || c.is_whitespace()
                || matches!(c, '-' | '_' | '.' | ',' | '&')
        })
}

/// Control characters other than tab, newline and carriage return.
pub fn has_control_chars(value: &str) -> bool {
    value
        .chars()
        .any(|c| matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}'))
}

/// `^[a-z0-9]+(?:-[a-z0-9]+)*$`
pub fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value.split('-').all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        })
}

/// URL slug of a title: ASCII-folded, lowercased, separators collapsed to `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c == '@' {
            // "@" reads as a word of its own.
            pending_dash = true;
            push_word("at", &mut slug, &mut pending_dash);
            pending_dash = true;
            continue;
        }

        let lower: String = c.to_lowercase().collect();
        for lc in lower.chars() {
            if lc.is_ascii_alphanumeric() {
                let mut buf = [0u8; 4];
                push_word(lc.encode_utf8(&mut buf), &mut slug, &mut pending_dash);
            } else if let Some(folded) = fold_latin(lc) {
                push_word(folded, &mut slug, &mut pending_dash);
            } else if lc.is_whitespace() || matches!(lc, '-' | '_' | '.' | ',' | '&' | '/') {
                pending_dash = true;
            }
            // Anything else is dropped.
        }
    }

    slug
}

fn push_word(word: &str, slug: &mut String, pending_dash: &mut bool) {
    if *pending_dash && !slug.is_empty() {
        slug.push('-');
    }
    *pending_dash = false;
    slug.push_str(word);
}

/// ASCII spelling of common accented Latin letters.
fn fold_latin(c: char) -> Option<&'static str> {
    Some(match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'ł' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ś' | 'š' | 'ş' => "s",
        'ß' => "ss",
        'ť' | 'ţ' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        'þ' => "th",
        'ð' => "d",
        _ => return None,
    })
}

/// `local@domain.tld` with no whitespace and a dotted domain.
pub fn is_email(value: &str) -> bool {
    if value.len() > 254 || value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || local.contains('@') {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

/// Strict `YYYY-MM-DDTHH:MM:SSZ`, as required when creating a page.
pub fn parse_strict_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%SZ")
        .ok()
        .filter(|parsed| parsed.format("%Y-%m-%dT%H:%M:%SZ").to_string() == value)
        .map(|parsed| parsed.and_utc())
}

/// Any RFC 3339 timestamp, or `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DD` taken as UTC.
pub fn parse_flexible_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc());
        }
    }
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|parsed| parsed.and_utc())
}

/// Required display name of at most 255 characters.
///
/// `label` is the wording used in the pattern message, e.g. "role name".
pub fn check_display_name(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    value: Option<&str>,
) {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        errors.add(field, format!("The {field} field is required."));
        return;
    };
    if value.chars().count() > MAX_NAME_CHARS {
        errors.add(
            field,
            format!("The {field} field must not be greater than {MAX_NAME_CHARS} characters."),
        );
    }
    if !is_display_name(value) {
        errors.add(field, format!("The {label} contains invalid characters."));
    }
}

/// Check a display-name value sent in a partial update.
///
/// Unlike creation, a blank value is an explicit error rather than "required".
pub fn check_updated_name(errors: &mut ValidationErrors, field: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, format!("The {field} field is required"));
    } else if value.chars().count() > MAX_NAME_CHARS {
        errors.add(
            field,
            format!("The {field} must not exceed {MAX_NAME_CHARS} characters"),
        );
    } else if !is_display_name(value) {
        errors.add(field, format!("The {field} contains invalid characters"));
    }
}
