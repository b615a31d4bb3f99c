//! Settlement-instruction text validation
//!
//! Two floors exist on purpose: the editor enforces 10 characters so users
//! write something meaningful, while the save path only enforces 5 so
//! legacy short instructions already on persisted trades keep saving.

use common::error::{Error, Result};

/// Maximum trimmed length of instruction text
pub const MAX_LEN: usize = 500;

/// Minimum trimmed length enforced in the editor
pub const EDITOR_MIN_LEN: usize = 10;

/// Minimum trimmed length enforced on the save path
pub const SAVE_MIN_LEN: usize = 5;

/// Characters never allowed in instruction text
pub const FORBIDDEN_CHARS: &[char] = &[';', '\'', '"', '<', '>'];

/// Validate with the editor's strict 10-character floor
pub fn validate_for_editor(text: &str) -> Result<()> {
    validate_text(text, EDITOR_MIN_LEN)
}

/// Validate with the save path's relaxed 5-character floor
pub fn validate_for_save(text: &str) -> Result<()> {
    validate_text(text, SAVE_MIN_LEN)
}

/// Instructions are optional, so blank text is always valid. Non-blank text
/// must be within `min_len..=MAX_LEN` trimmed characters and free of the
/// forbidden characters.
fn validate_text(text: &str, min_len: usize) -> Result<()> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    let count = trimmed.chars().count();
    if count < min_len {
        return Err(Error::InvalidSettlement(format!(
            "Settlement instructions must be at least {} characters.",
            min_len
        )));
    }
    if count > MAX_LEN {
        return Err(Error::InvalidSettlement(format!(
            "Settlement instructions must not exceed {} characters.",
            MAX_LEN
        )));
    }
    if let Some(bad) = trimmed.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(Error::InvalidSettlement(format!(
            "Settlement instructions must not contain the character '{}'.",
            bad
        )));
    }
    Ok(())
}
