use encoding_rs::WINDOWS_1252;

// Byte sequences that show up when UTF-8 text was decoded as Windows-1252.
const MOJIBAKE_MARKERS: [&str; 3] = ["Ã", "Â", "â€"];

/// Repairs, strips and collapses a text field. Replacement characters are
/// left in place so the caller can reject the field.
pub fn normalize_text(raw: &str) -> String {
    let repaired = repair_mojibake(raw).unwrap_or_else(|| raw.to_string());

    let stripped: String = repaired
        .chars()
        .filter(|c| !c.is_control() && !is_zero_width(*c))
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Re-encodes text as Windows-1252 and decodes it as UTF-8. Returns `None`
/// unless the text looks double-decoded and the round trip is lossless.
pub fn repair_mojibake(s: &str) -> Option<String> {
    if !MOJIBAKE_MARKERS.iter().any(|m| s.contains(m)) {
        return None;
    }

    let (bytes, _, unmappable) = WINDOWS_1252.encode(s);
    if unmappable {
        return None;
    }
    String::from_utf8(bytes.into_owned()).ok()
}

pub fn has_replacement_char(s: &str) -> bool {
    s.contains(char::REPLACEMENT_CHARACTER)
}

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}')
}

/// Capitalises each word. Words are only lower-cased past their first letter
/// when the whole field is single-case, so acronyms in mixed-case names such
/// as "USB Cable" survive.
pub fn title_case(s: &str) -> String {
    let has_lower = s.chars().any(char::is_lowercase);
    let has_upper = s.chars().any(char::is_uppercase);
    let single_case = !(has_lower && has_upper);

    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let rest: String = chars.collect();
                    let rest = if single_case { rest.to_lowercase() } else { rest };
                    format!("{}{}", first.to_uppercase(), rest)
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairs_utf8_read_as_windows_1252() {
        assert_eq!(repair_mojibake("CafÃ©").as_deref(), Some("Café"));
        assert_eq!(normalize_text("Donâ€™t Stop"), "Don\u{2019}t Stop");
    }

    #[test]
    fn leaves_clean_text_alone() {
        assert_eq!(repair_mojibake("Café"), None);
        assert_eq!(normalize_text("Laptop"), "Laptop");
    }

    #[test]
    fn strips_controls_and_zero_width_and_collapses_spaces() {
        assert_eq!(normalize_text("\u{FEFF}  Mouse\u{200B}\t Wireless \r"), "Mouse Wireless");
    }

    #[test]
    fn replacement_chars_survive_normalization() {
        let s = normalize_text("Lap\u{FFFD}top");
        assert!(has_replacement_char(&s));
    }

    #[test]
    fn title_cases_single_case_fields_only() {
        assert_eq!(title_case("north"), "North");
        assert_eq!(title_case("SOUTH EAST"), "South East");
        assert_eq!(title_case("USB Cable"), "USB Cable");
        assert_eq!(title_case("wireless mouse"), "Wireless Mouse");
    }
}
