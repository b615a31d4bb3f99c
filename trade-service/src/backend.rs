//! Trade backend interface and implementations
//!
//! `TradeBackend` is the REST surface the workflow consumes. The HTTP
//! implementation talks JSON over HTTPS with cookie-based session auth; the
//! in-memory implementation backs tests and demo mode with the same
//! semantics, including the status-code special cases (404 on settlement
//! fetch means "none yet", 403 on settlement save means insufficient
//! privilege).

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Months;
use dashmap::DashMap;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info, warn};

use common::dates;
use common::error::{Error, Result};
use common::model::cashflow::{Cashflow, CashflowRequest};
use common::model::settlement::{SettlementExport, SettlementInstruction};
use common::model::trade::{Trade, TERMINATED_STATUS};
use common::numbers::dec;
use settlement_service::editor::DEFAULT_NON_STANDARD_KEYWORDS;

use crate::config::TradeServiceConfig;

/// The remote trade-booking REST surface
#[async_trait]
pub trait TradeBackend: Send + Sync {
    /// Fetch a trade by identifier
    async fn get_trade(&self, trade_id: &str) -> Result<Trade>;

    /// Create a trade; returns the backend's representation, which carries
    /// the newly assigned identifier
    async fn create_trade(&self, dto: &Value) -> Result<Value>;

    /// Update an existing trade
    async fn update_trade(&self, trade_id: &str, dto: &Value) -> Result<Value>;

    /// Terminate an existing trade
    async fn terminate_trade(&self, trade_id: &str) -> Result<()>;

    /// Generate cashflow rows for the given legs and dates
    async fn generate_cashflows(&self, request: &CashflowRequest) -> Result<Vec<Cashflow>>;

    /// Fetch settlement instructions; `None` when none have been saved yet
    async fn get_settlement(&self, trade_id: &str) -> Result<Option<SettlementInstruction>>;

    /// Persist settlement instructions for a trade
    async fn put_settlement(&self, trade_id: &str, record: &SettlementInstruction) -> Result<()>;

    /// Download the settlements CSV export
    async fn export_settlements(
        &self,
        non_standard_only: bool,
        mine_only: bool,
    ) -> Result<SettlementExport>;
}

/// HTTP implementation of the trade backend
pub struct HttpTradeBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTradeBackend {
    /// Create a client for the configured backend. The cookie store carries
    /// the browser-style session auth.
    pub fn new(config: &TradeServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success response to the error taxonomy, preserving the
    /// server's status and message.
    async fn error_from(response: reqwest::Response) -> Error {
        let status = response.status();
        let message = match response.text().await {
            Ok(body) if !body.is_empty() => serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("message")
                        .or_else(|| v.pointer("/error/message"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or(body),
            _ => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        match status {
            StatusCode::NOT_FOUND => Error::TradeNotFound(message),
            StatusCode::FORBIDDEN => Error::InsufficientPrivilege(message),
            _ => Error::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::error_from(response).await)
        }
    }
}

#[async_trait]
impl TradeBackend for HttpTradeBackend {
    async fn get_trade(&self, trade_id: &str) -> Result<Trade> {
        debug!(trade_id, "fetching trade");
        let response = self
            .client
            .get(self.url(&format!("/trades/{}", trade_id)))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json::<Trade>().await?)
    }

    async fn create_trade(&self, dto: &Value) -> Result<Value> {
        let response = self.client.post(self.url("/trades")).json(dto).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json::<Value>().await?)
    }

    async fn update_trade(&self, trade_id: &str, dto: &Value) -> Result<Value> {
        let response = self
            .client
            .put(self.url(&format!("/trades/{}", trade_id)))
            .json(dto)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json::<Value>().await?)
    }

    async fn terminate_trade(&self, trade_id: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url(&format!("/trades/{}/terminate", trade_id)))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn generate_cashflows(&self, request: &CashflowRequest) -> Result<Vec<Cashflow>> {
        let response = self
            .client
            .post(self.url("/cashflows/generate"))
            .json(request)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json::<Vec<Cashflow>>().await?)
    }

    async fn get_settlement(&self, trade_id: &str) -> Result<Option<SettlementInstruction>> {
        let response = self
            .client
            .get(self.url(&format!("/trades/{}/settlement-instructions", trade_id)))
            .send()
            .await?;
        // 404 means no instruction has been saved yet, not an error.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response).await?;
        Ok(Some(response.json::<SettlementInstruction>().await?))
    }

    async fn put_settlement(&self, trade_id: &str, record: &SettlementInstruction) -> Result<()> {
        let response = self
            .client
            .put(self.url(&format!("/trades/{}/settlement-instructions", trade_id)))
            .json(record)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn export_settlements(
        &self,
        non_standard_only: bool,
        mine_only: bool,
    ) -> Result<SettlementExport> {
        let response = self
            .client
            .get(self.url("/trades/exports/settlements"))
            .query(&[
                ("nonStandardOnly", non_standard_only),
                ("mineOnly", mine_only),
            ])
            .header(reqwest::header::ACCEPT, "text/csv, text/plain, */*")
            .send()
            .await?;
        let response = Self::check(response).await?;
        let header = |name: reqwest::header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(reqwest::header::CONTENT_TYPE);
        let content_disposition = header(reqwest::header::CONTENT_DISPOSITION);
        let body = response.bytes().await?.to_vec();
        Ok(SettlementExport {
            content_type,
            content_disposition,
            body,
        })
    }
}

/// In-memory trade backend for tests and demo mode
///
/// Identifiers are sequential integers rendered as strings, matching the
/// backend's numeric ids. Cashflow generation is a deterministic quarterly
/// schedule; the pay/receive label comes back abbreviated ("Rec") the way
/// the real generator sometimes abbreviates, so the tolerant matcher stays
/// exercised.
pub struct InMemoryTradeBackend {
    /// Stored trade DTOs by identifier
    pub trades: DashMap<String, Value>,
    /// Settlement instructions by trade identifier
    pub settlements: DashMap<String, SettlementInstruction>,
    next_id: AtomicI64,
    /// When set, settlement saves fail with a server error
    pub fail_settlement_saves: AtomicBool,
    /// When set, settlement saves fail with a privilege error
    pub deny_settlement_saves: AtomicBool,
}

impl InMemoryTradeBackend {
    /// Create an empty in-memory backend
    pub fn new() -> Self {
        Self {
            trades: DashMap::new(),
            settlements: DashMap::new(),
            next_id: AtomicI64::new(1000),
            fail_settlement_saves: AtomicBool::new(false),
            deny_settlement_saves: AtomicBool::new(false),
        }
    }

    fn stored(&self, trade_id: &str) -> Result<Value> {
        self.trades
            .get(trade_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| Error::TradeNotFound(trade_id.to_string()))
    }
}

impl Default for InMemoryTradeBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TradeBackend for InMemoryTradeBackend {
    async fn get_trade(&self, trade_id: &str) -> Result<Trade> {
        let stored = self.stored(trade_id)?;
        Ok(serde_json::from_value(stored)?)
    }

    async fn create_trade(&self, dto: &Value) -> Result<Value> {
        if dto.get("tradeId").is_some_and(|id| !id.is_null()) {
            return Err(Error::Api {
                status: 400,
                message: "tradeId must not be sent on create".to_string(),
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut stored = dto.clone();
        if let Some(obj) = stored.as_object_mut() {
            obj.insert("tradeId".to_string(), Value::from(id.to_string()));
            obj.insert("version".to_string(), Value::from(1));
            obj.insert(
                "lastTouchTimestamp".to_string(),
                Value::from(dates::format_date_time(dates::date_time_from_date(
                    dates::today(),
                ))),
            );
            if obj.get("tradeStatus").map_or(true, Value::is_null) {
                obj.insert("tradeStatus".to_string(), Value::from("LIVE"));
            }
        }
        info!(trade_id = id, "created trade");
        self.trades.insert(id.to_string(), stored.clone());
        Ok(stored)
    }

    async fn update_trade(&self, trade_id: &str, dto: &Value) -> Result<Value> {
        let previous = self.stored(trade_id)?;
        let version = previous.get("version").and_then(Value::as_i64).unwrap_or(0);
        let mut stored = dto.clone();
        if let Some(obj) = stored.as_object_mut() {
            obj.insert("tradeId".to_string(), Value::from(trade_id.to_string()));
            obj.insert("version".to_string(), Value::from(version + 1));
        }
        self.trades.insert(trade_id.to_string(), stored.clone());
        Ok(stored)
    }

    async fn terminate_trade(&self, trade_id: &str) -> Result<()> {
        let mut entry = self
            .trades
            .get_mut(trade_id)
            .ok_or_else(|| Error::TradeNotFound(trade_id.to_string()))?;
        if entry.get("tradeStatus").and_then(Value::as_str) == Some(TERMINATED_STATUS) {
            return Err(Error::Api {
                status: 409,
                message: "trade is already terminated".to_string(),
            });
        }
        if let Some(obj) = entry.as_object_mut() {
            obj.insert("tradeStatus".to_string(), Value::from(TERMINATED_STATUS));
        }
        Ok(())
    }

    async fn generate_cashflows(&self, request: &CashflowRequest) -> Result<Vec<Cashflow>> {
        let start = request
            .trade_start_date
            .ok_or_else(|| Error::Validation("tradeStartDate is required".to_string()))?;
        let maturity = request
            .trade_maturity_date
            .ok_or_else(|| Error::Validation("tradeMaturityDate is required".to_string()))?;

        let mut rows = Vec::new();
        for leg in &request.legs {
            let rate = leg.rate.ok_or_else(|| {
                Error::Validation("leg rate is required for generation".to_string())
            })?;
            let notional = leg.notional.ok_or_else(|| {
                Error::Validation("leg notional is required for generation".to_string())
            })?;
            // Quarterly accrual, flat rate; enough structure for tests and demo.
            let payment: Decimal = notional * rate / dec!(4);
            let pay_rec = leg.pay_receive_flag.map(|f| match f {
                common::model::leg::PayReceive::Pay => "Pay".to_string(),
                common::model::leg::PayReceive::Receive => "Rec".to_string(),
            });
            let payment_type = leg.leg_type.map(|t| t.label().to_string());
            let mut value_date = start + Months::new(3);
            while value_date <= maturity {
                rows.push(Cashflow {
                    value_date: Some(value_date),
                    payment_value: Some(payment),
                    pay_rec: pay_rec.clone(),
                    payment_type: payment_type.clone(),
                    payment_business_day_convention: leg.payment_business_day_convention.clone(),
                    rate: Some(rate),
                });
                value_date = value_date + Months::new(3);
            }
        }
        Ok(rows)
    }

    async fn get_settlement(&self, trade_id: &str) -> Result<Option<SettlementInstruction>> {
        Ok(self.settlements.get(trade_id).map(|entry| entry.clone()))
    }

    async fn put_settlement(&self, trade_id: &str, record: &SettlementInstruction) -> Result<()> {
        if self.deny_settlement_saves.load(Ordering::SeqCst) {
            return Err(Error::InsufficientPrivilege(
                "not permitted to amend settlement instructions".to_string(),
            ));
        }
        if self.fail_settlement_saves.load(Ordering::SeqCst) {
            warn!(trade_id, "simulated settlement save failure");
            return Err(Error::Api {
                status: 500,
                message: "settlement store unavailable".to_string(),
            });
        }
        if !self.trades.contains_key(trade_id) {
            return Err(Error::TradeNotFound(trade_id.to_string()));
        }
        self.settlements.insert(trade_id.to_string(), record.clone());
        Ok(())
    }

    async fn export_settlements(
        &self,
        non_standard_only: bool,
        _mine_only: bool,
    ) -> Result<SettlementExport> {
        let mut csv = String::from("tradeId,settlementInstructions,nonStandard\n");
        for entry in self.settlements.iter() {
            let text = &entry.value().field_value;
            let lowered = text.to_lowercase();
            let non_standard = DEFAULT_NON_STANDARD_KEYWORDS
                .iter()
                .any(|kw| lowered.contains(kw));
            if non_standard_only && !non_standard {
                continue;
            }
            let mut safe_text = text.replace('"', "\"\"");
            if text.contains(|c| c == '"' || c == ',' || c == '\n') {
                safe_text = format!("\"{}\"", safe_text);
            }
            csv.push_str(&format!("{},{},{}\n", entry.key(), safe_text, non_standard));
        }
        Ok(SettlementExport {
            content_type: Some("text/csv".to_string()),
            content_disposition: Some(format!(
                "attachment; filename=\"settlements-{}.csv\"",
                dates::format_date(dates::today())
            )),
            body: csv.into_bytes(),
        })
    }
}
