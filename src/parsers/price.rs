/// Number of trailing characters holding the currency glyph and its separator
const CURRENCY_SUFFIX_CHARS: usize = 2;

/// Parses a storefront price such as `"19,99 €"` into `19.99`
///
/// The last two characters are treated as the currency suffix and dropped,
/// the decimal comma becomes a period, and the remainder must parse as a
/// finite, non-negative number.
///
/// # Returns
///
/// * `Some(f64)` - The price value
/// * `None` - The text is not a price in the expected format
pub fn parse_price(text: &str) -> Option<f64> {
    let text = text.trim();
    let char_count = text.chars().count();
    if char_count <= CURRENCY_SUFFIX_CHARS {
        return None;
    }

    let amount: String = text
        .chars()
        .take(char_count - CURRENCY_SUFFIX_CHARS)
        .collect();
    let normalized = amount.trim().replace(',', ".");

    let value: f64 = normalized.parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}
