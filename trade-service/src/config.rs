//! Configuration for the trade service

use std::env;

/// Configuration for the trade service
#[derive(Debug, Clone)]
pub struct TradeServiceConfig {
    /// Base URL of the trade backend REST API
    pub base_url: String,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
    /// Delay before settlement persistence runs for a newly created trade,
    /// so the creation confirmation is observed first
    pub settlement_save_delay_ms: u64,
}

impl Default for TradeServiceConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("DESK_API_URL")
                .unwrap_or_else(|_| "http://localhost:8080/api".to_string()),
            request_timeout_secs: env::var("DESK_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            settlement_save_delay_ms: env::var("DESK_SETTLEMENT_SAVE_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
        }
    }
}

impl TradeServiceConfig {
    /// Create a new configuration using environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create a new configuration with custom values
    pub fn new(base_url: String, request_timeout_secs: u64, settlement_save_delay_ms: u64) -> Self {
        Self {
            base_url,
            request_timeout_secs,
            settlement_save_delay_ms,
        }
    }
}
