//! Numeric types and sanitization for trade amounts
//!
//! Notional and rate inputs may arrive as formatted strings (thousands
//! separators, stray whitespace) and must be cleaned before they are sent
//! anywhere numeric.

use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Notional amount with high precision
pub type Notional = Decimal;

/// Interest rate with high precision
pub type Rate = Decimal;

/// Generated payment value with high precision
pub type PaymentValue = Decimal;

/// Parse a user-entered amount, stripping thousands separators and
/// whitespace first. Returns `None` for empty or non-numeric input.
pub fn sanitize_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && *c != '_')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<Decimal>().ok()
}

/// Parse a field that should hold a numeric user identifier. Returns `None`
/// when the text is empty or not a number, which the DTO formatter treats as
/// "this is a display name, not an id".
pub fn parse_numeric_id(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_formatted_amounts() {
        assert_eq!(sanitize_decimal("1,000,000"), Some(dec!(1000000)));
        assert_eq!(sanitize_decimal(" 1 000 000.50 "), Some(dec!(1000000.50)));
        assert_eq!(sanitize_decimal("0.035"), Some(dec!(0.035)));
    }

    #[test]
    fn rejects_non_numeric_amounts() {
        assert_eq!(sanitize_decimal(""), None);
        assert_eq!(sanitize_decimal("abc"), None);
        assert_eq!(sanitize_decimal("1.2.3"), None);
    }

    #[test]
    fn numeric_ids_only() {
        assert_eq!(parse_numeric_id("1001"), Some(1001));
        assert_eq!(parse_numeric_id(" 7 "), Some(7));
        assert_eq!(parse_numeric_id("jsmith"), None);
        assert_eq!(parse_numeric_id(""), None);
    }
}
