pub const RULE_WIDTH: usize = 70;

/// `$1,234,567.89`, always two decimals.
pub fn currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let negative = value < 0.0 && fixed != "0.00";
    format!(
        "{}${}.{}",
        if negative { "-" } else { "" },
        group_thousands(int_part),
        frac_part
    )
}

pub fn percent(value: f64) -> String {
    format!("{value:.2}%")
}

pub fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Cuts `s` to at most `width` characters, marking the cut with `~`.
pub fn fit(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('~');
    out
}

pub fn heavy_rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub fn light_rule() -> String {
    "-".repeat(RULE_WIDTH)
}
