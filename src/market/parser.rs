//! Price text parsing.
//!
//! The market reports PHP prices as display strings like `₱1,234.50` (or
//! `P1,234.50` on some endpoints). Anything that does not reduce to a finite
//! number parses as 0.0; the quote status, not this value, tells a free item
//! apart from missing data.

/// Parses a display price into a number, 0.0 when unparseable.
pub fn parse_price(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '₱' | 'P' | ',') && !c.is_whitespace())
        .collect();

    // Display prices are plain decimals; exponents and words like "inf" are not prices
    if !cleaned.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | '-')) {
        return 0.0;
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}
