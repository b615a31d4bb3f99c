//! Settlement CSV export handling
//!
//! The export endpoint sits behind the same session auth as everything
//! else, so an expired session comes back as an HTML login page with a 200.
//! That payload must never be saved as a CSV.

use regex::Regex;
use tracing::debug;

use common::dates;
use common::error::{Error, Result};
use common::model::settlement::SettlementExport;

/// A downloaded export ready to write to disk
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementDownload {
    pub file_name: String,
    pub body: Vec<u8>,
}

/// Extract the file name from a `Content-Disposition` header value. Accepts
/// quoted and unquoted forms and ignores trailing attributes.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    // Compiled per call; export is a user-triggered action, not a hot path.
    let pattern = Regex::new(r#"(?i)filename="?([^";]+)"?"#).ok()?;
    pattern
        .captures(header)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

/// File name used when the response carries no usable disposition
pub fn default_file_name() -> String {
    format!("settlements-{}.csv", dates::format_date(dates::today()))
}

/// Turn a raw export response into a named download, rejecting HTML
/// payloads (an auth redirect page, not data).
pub fn prepare_download(export: SettlementExport) -> Result<SettlementDownload> {
    let is_html_type = export
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.to_lowercase().contains("text/html"));
    let body_start = String::from_utf8_lossy(&export.body[..export.body.len().min(256)]);
    let looks_like_html = body_start.trim_start().to_lowercase().starts_with("<!doctype html")
        || body_start.trim_start().to_lowercase().starts_with("<html");
    if is_html_type || looks_like_html {
        return Err(Error::Api {
            status: 200,
            message: "export returned an HTML page; the session has likely expired".to_string(),
        });
    }

    let file_name = export
        .content_disposition
        .as_deref()
        .and_then(filename_from_disposition)
        .unwrap_or_else(default_file_name);
    debug!(file_name = %file_name, bytes = export.body.len(), "prepared settlement export");
    Ok(SettlementDownload {
        file_name,
        body: export.body,
    })
}
