//! Settlement-instruction editing, validation and export
//!
//! The editor is a pure text-buffer model; validation enforces the length
//! and character rules for instruction text; export handles the CSV
//! download headers.

pub mod editor;
pub mod export;
pub mod validation;

pub use editor::SettlementEditor;
pub use export::{filename_from_disposition, prepare_download};
pub use validation::{validate_for_editor, validate_for_save};
