use std::cmp::Ordering;

/// One run of a filename: either a numeric run compared by magnitude or a
/// text run compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum NaturalPart {
    Num(u128),
    Str(String),
}

/// Generate a natural sort key (handles numbers correctly).
/// `"img2.png"` < `"img10.png"`
pub fn natural_sort_key(s: &str) -> Vec<NaturalPart> {
    let mut parts = Vec::new();
    let mut current_num = String::new();
    let mut current_str = String::new();

    for c in s.chars() {
        if c.is_ascii_digit() {
            if !current_str.is_empty() {
                parts.push(NaturalPart::Str(current_str.to_lowercase()));
                current_str.clear();
            }
            current_num.push(c);
        } else {
            if !current_num.is_empty() {
                parts.push(num_part(&current_num));
                current_num.clear();
            }
            current_str.push(c);
        }
    }

    if !current_num.is_empty() {
        parts.push(num_part(&current_num));
    }
    if !current_str.is_empty() {
        parts.push(NaturalPart::Str(current_str.to_lowercase()));
    }

    parts
}

/// Compare two filenames in natural order. A strict run-prefix sorts first.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_sort_key(a).cmp(&natural_sort_key(b))
}

fn num_part(digits: &str) -> NaturalPart {
    let stripped = digits.trim_start_matches('0');
    if stripped.is_empty() {
        return NaturalPart::Num(0);
    }
    match stripped.parse::<u128>() {
        Ok(n) => NaturalPart::Num(n),
        // Digit runs longer than u128 fall back to a zero-stripped lexical
        // run; still deterministic.
        Err(_) => NaturalPart::Str(stripped.to_string()),
    }
}
