//! Tolerant matching for generator labels
//!
//! The generator is not consistent about pay/receive and payment-type
//! spellings ("Rec" vs "Receive", "Float" vs "Floating", mixed casing), so
//! every place that compares against those labels goes through the
//! normalized prefix matcher below.

/// Lowercase and trim a label for comparison
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// True when either normalized label is a prefix of the other. Empty labels
/// never match.
pub fn prefix_match(left: &str, right: &str) -> bool {
    let left = normalize(left);
    let right = normalize(right);
    if left.is_empty() || right.is_empty() {
        return false;
    }
    left.starts_with(&right) || right.starts_with(&left)
}
