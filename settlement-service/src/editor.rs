//! Settlement-instruction editor model
//!
//! Pure state for the instruction text field: buffer, caret, optional
//! selection, and the touched flag that gates error display. Template
//! insertion lands at the caret (or replaces the selection) with a single
//! space of padding wherever the insertion abuts non-whitespace.

use common::error::Result;

use crate::validation::{self, validate_for_editor};

/// Keywords that flag instructions as non-standard when present anywhere in
/// the text, case-insensitively.
pub const DEFAULT_NON_STANDARD_KEYWORDS: &[&str] = &["manual", "non-dvp"];

/// Boilerplate snippets offered for insertion
pub const DEFAULT_TEMPLATES: &[&str] = &[
    "Settle via DVP through custodian.",
    "Pay to nostro account on value date.",
    "Manual settlement: confirm SSI with counterparty before value date.",
];

/// Editor state for a settlement-instruction text field
#[derive(Debug, Clone)]
pub struct SettlementEditor {
    text: String,
    /// Caret position as a char offset into `text`
    caret: usize,
    /// Selected range as char offsets, start <= end
    selection: Option<(usize, usize)>,
    /// Set on first edit; error display is suppressed until then
    touched: bool,
    non_standard_keywords: Vec<String>,
}

impl Default for SettlementEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl SettlementEditor {
    /// Empty editor with the default keyword list
    pub fn new() -> Self {
        Self {
            text: String::new(),
            caret: 0,
            selection: None,
            touched: false,
            non_standard_keywords: DEFAULT_NON_STANDARD_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Editor pre-loaded with existing instruction text. Loading existing
    /// text does not count as touching the editor.
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let caret = text.chars().count();
        Self {
            text,
            caret,
            ..Self::new()
        }
    }

    /// Replace the non-standard keyword list
    pub fn set_non_standard_keywords(&mut self, keywords: Vec<String>) {
        self.non_standard_keywords = keywords;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn touched(&self) -> bool {
        self.touched
    }

    /// Replace the full text, as a keystroke-driven edit would
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        let len = self.text.chars().count();
        self.caret = self.caret.min(len);
        self.selection = None;
        self.touched = true;
    }

    /// Move the caret, clamped to the text length
    pub fn set_caret(&mut self, caret: usize) {
        self.caret = caret.min(self.text.chars().count());
        self.selection = None;
    }

    /// Select a char range; offsets are normalized and clamped
    pub fn select(&mut self, start: usize, end: usize) {
        let len = self.text.chars().count();
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        self.selection = Some((start.min(len), end.min(len)));
    }

    /// Insert a template at the caret, or over the selection if one exists.
    /// A single space is added on each side that abuts non-whitespace, the
    /// caret moves past the inserted text, and the editor becomes touched.
    pub fn insert_template(&mut self, template: &str) {
        let (start, end) = self.selection.take().unwrap_or((self.caret, self.caret));
        let chars: Vec<char> = self.text.chars().collect();

        let needs_leading_space = start > 0
            && chars
                .get(start - 1)
                .is_some_and(|c| !c.is_whitespace());
        let needs_trailing_space = chars.get(end).is_some_and(|c| !c.is_whitespace());

        let mut insertion = String::new();
        if needs_leading_space {
            insertion.push(' ');
        }
        insertion.push_str(template);
        if needs_trailing_space {
            insertion.push(' ');
        }

        let mut text: String = chars[..start].iter().collect();
        text.push_str(&insertion);
        text.extend(&chars[end..]);

        self.text = text;
        self.caret = start + insertion.chars().count();
        self.touched = true;
    }

    /// Trimmed char count, the number shown next to the field
    pub fn char_count(&self) -> usize {
        self.text.trim().chars().count()
    }

    /// True once the trimmed text exceeds the maximum length
    pub fn over_limit(&self) -> bool {
        self.char_count() > validation::MAX_LEN
    }

    /// Keywords from the configured list found in the text, for the
    /// non-standard warning banner
    pub fn non_standard_matches(&self) -> Vec<String> {
        let lowered = self.text.to_lowercase();
        self.non_standard_keywords
            .iter()
            .filter(|kw| !kw.is_empty() && lowered.contains(&kw.to_lowercase()))
            .cloned()
            .collect()
    }

    /// Validation error to display, or `None`. Untouched editors never show
    /// errors regardless of content.
    pub fn show_error(&self) -> Option<String> {
        if !self.touched {
            return None;
        }
        self.validate().err().map(|e| e.to_string())
    }

    /// Validate the current text with the editor's strict rules
    pub fn validate(&self) -> Result<()> {
        validate_for_editor(&self.text)
    }

    /// Reset text, caret, selection and the touched flag
    pub fn clear(&mut self) {
        self.text.clear();
        self.caret = 0;
        self.selection = None;
        self.touched = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_inserted_at_caret_with_padding() {
        let mut editor = SettlementEditor::with_text("before after");
        editor.set_caret(6);
        editor.insert_template("TEMPLATE");
        // Caret sat right after "before": a leading pad is added, and the
        // existing space covers the trailing side.
        assert_eq!(editor.text(), "before TEMPLATE after");
        assert!(editor.touched());
    }

    #[test]
    fn template_pads_both_sides_between_words() {
        let mut editor = SettlementEditor::with_text("beforeafter");
        editor.set_caret(6);
        editor.insert_template("X");
        assert_eq!(editor.text(), "before X after");
        assert_eq!(editor.caret(), 9);
    }

    #[test]
    fn template_replaces_selection() {
        let mut editor = SettlementEditor::with_text("keep REMOVE keep");
        editor.select(5, 11);
        editor.insert_template("NEW");
        assert_eq!(editor.text(), "keep NEW keep");
    }

    #[test]
    fn insertion_into_empty_text_adds_no_padding() {
        let mut editor = SettlementEditor::new();
        editor.insert_template("Hello");
        assert_eq!(editor.text(), "Hello");
        assert_eq!(editor.caret(), 5);
    }

    #[test]
    fn non_standard_keywords_matched_case_insensitively() {
        let mut editor = SettlementEditor::new();
        editor.set_text("MANUAL settlement required, Non-DVP");
        let matches = editor.non_standard_matches();
        assert_eq!(matches, vec!["manual".to_string(), "non-dvp".to_string()]);
    }

    #[test]
    fn errors_gated_on_touched() {
        let editor = SettlementEditor::with_text("short");
        assert!(editor.show_error().is_none());

        let mut touched = editor.clone();
        touched.set_text("short");
        assert!(touched.show_error().is_some());
    }

    #[test]
    fn clear_resets_everything() {
        let mut editor = SettlementEditor::new();
        editor.set_text("some instructions here");
        editor.clear();
        assert_eq!(editor.text(), "");
        assert_eq!(editor.caret(), 0);
        assert!(!editor.touched());
        assert!(editor.show_error().is_none());
    }

    #[test]
    fn char_count_and_limit_track_trimmed_text() {
        let mut editor = SettlementEditor::new();
        editor.set_text(format!("  {}  ", "x".repeat(500)));
        assert_eq!(editor.char_count(), 500);
        assert!(!editor.over_limit());
        editor.set_text("x".repeat(501));
        assert!(editor.over_limit());
    }
}
