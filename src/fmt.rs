/// Dollar amount with thousands separators: `$1,234.56`, `-$42.00`.
pub fn money(val: f64) -> String {
    let formatted = format!("{:.2}", val.abs());
    let (whole, cents) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let is_zero = formatted.bytes().all(|b| b == b'0' || b == b'.');
    let sign = if val < 0.0 && !is_zero { "-" } else { "" };
    format!("{sign}${}.{cents}", group_thousands(whole))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Share of `total` as `12.3%`; `0.0%` when the total is zero.
pub fn percent(part: f64, total: f64) -> String {
    if total == 0.0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", part / total * 100.0)
}

/// Shorten to `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}
