// Text helpers for lead cards

/// Format a phone number for display.
///
/// Numbers with at least 12 digits are grouped as `+998 90 123 45 67`;
/// anything shorter is shown as given.
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() >= 12 {
        format!(
            "+{} {} {} {} {}",
            &digits[0..3],
            &digits[3..5],
            &digits[5..8],
            &digits[8..10],
            &digits[10..12]
        )
    } else {
        phone.to_string()
    }
}

/// Two-letter initials for a client name, `?` when empty
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .collect();
    if letters.is_empty() {
        "?".to_string()
    } else {
        letters.to_uppercase()
    }
}

/// Truncate to `width` characters, marking the cut with `..`
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(2)).collect();
    format!("{}..", kept)
}
