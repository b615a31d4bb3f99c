//! Save/terminate orchestration
//!
//! `TradeService` drives the booking workflow end to end: UTI generation,
//! validation, DTO formatting, the create/update call, and best-effort
//! settlement persistence. Settlement failures never fail the trade save;
//! they land in a pending ledger and can be retried.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use common::error::{Error, ErrorExt, Result};
use common::model::cashflow::Cashflow;
use common::model::leg::LegType;
use common::model::settlement::SettlementInstruction;
use common::model::trade::{Trade, TERMINATED_STATUS};
use common::model::user::SessionContext;
use common::numbers::parse_numeric_id;
use settlement_service::validation::validate_for_save;

use crate::backend::TradeBackend;
use crate::cashflow;
use crate::config::TradeServiceConfig;
use crate::dto::{self, DtoMode};
use crate::validator;

/// What happened to the settlement text during a save
#[derive(Debug)]
pub enum SettlementDispatch {
    /// No settlement text was supplied
    NotRequested,
    /// The text failed validation; the trade saved without it
    Rejected(String),
    /// Persisted alongside the trade save
    Saved,
    /// Persistence failed; the text is in the pending ledger
    PendingRetry(String),
    /// Persistence is running as a deferred task (create path)
    Deferred,
}

/// Result of a successful save
#[derive(Debug)]
pub struct SaveOutcome {
    /// The trade's identifier, newly assigned on the create path
    pub trade_id: String,
    /// True when the save created the trade
    pub created: bool,
    pub settlement: SettlementDispatch,
    /// Handle for the deferred settlement task, when one was spawned.
    /// Awaiting it is optional; completion is not guaranteed before the
    /// caller moves on.
    pub settlement_task: Option<JoinHandle<()>>,
}

/// Booking workflow service over a trade backend
pub struct TradeService {
    backend: Arc<dyn TradeBackend>,
    session: SessionContext,
    config: TradeServiceConfig,
    /// Settlement text awaiting retry, keyed by trade identifier
    pending: Arc<DashMap<String, String>>,
}

impl TradeService {
    pub fn new(
        backend: Arc<dyn TradeBackend>,
        session: SessionContext,
        config: TradeServiceConfig,
    ) -> Self {
        Self {
            backend,
            session,
            config,
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Save the trade, creating or updating depending on whether it already
    /// has an identifier. On success the trade reflects the persisted state
    /// (update path re-fetches; create path gains the new identifier).
    pub async fn save(
        &self,
        trade: &mut Trade,
        settlement_text: Option<&str>,
    ) -> Result<SaveOutcome> {
        if trade.is_terminated() {
            return Err(Error::Validation(
                "Terminated trades cannot be amended.".to_string(),
            ));
        }
        debug!(
            request_id = %uuid::Uuid::new_v4(),
            persisted = trade.is_persisted(),
            "saving trade"
        );

        trade.ensure_uti();
        fill_default_fixed_rates(trade);
        validator::validate(trade)?;

        // Settlement text is judged before any network call so the outcome
        // can say why it was skipped, but a bad instruction never blocks the
        // trade itself.
        let settlement = settlement_text
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let settlement_verdict = settlement
            .as_deref()
            .map(|text| validate_for_save(text).map_err(|e| e.to_string()));

        let dto_text = settlement.as_deref();
        if trade.is_persisted() {
            self.save_update(trade, dto_text, settlement_verdict).await
        } else {
            self.save_create(trade, settlement, settlement_verdict).await
        }
    }

    async fn save_update(
        &self,
        trade: &mut Trade,
        settlement_text: Option<&str>,
        settlement_verdict: Option<std::result::Result<(), String>>,
    ) -> Result<SaveOutcome> {
        let trade_id = trade
            .trade_id
            .clone()
            .unwrap_or_default();
        let dto = dto::format_for_backend(trade, &self.session, settlement_text, DtoMode::Update)?;
        self.backend.update_trade(&trade_id, &dto).await?;
        info!(trade_id = %trade_id, "updated trade");

        // The backend recalculates version, timestamps and ids; replace
        // local state with its view.
        *trade = self.backend.get_trade(&trade_id).await?;

        let settlement = match settlement_verdict {
            None => SettlementDispatch::NotRequested,
            Some(Err(reason)) => {
                warn!(trade_id = %trade_id, %reason, "settlement text rejected");
                SettlementDispatch::Rejected(reason)
            }
            Some(Ok(())) => {
                let text = settlement_text.unwrap_or_default();
                match persist_settlement(self.backend.as_ref(), &self.pending, &trade_id, text)
                    .await
                {
                    Ok(()) => SettlementDispatch::Saved,
                    Err(e) => SettlementDispatch::PendingRetry(e.to_string()),
                }
            }
        };

        Ok(SaveOutcome {
            trade_id,
            created: false,
            settlement,
            settlement_task: None,
        })
    }

    async fn save_create(
        &self,
        trade: &mut Trade,
        settlement_text: Option<String>,
        settlement_verdict: Option<std::result::Result<(), String>>,
    ) -> Result<SaveOutcome> {
        let dto = dto::format_for_backend(
            trade,
            &self.session,
            settlement_text.as_deref(),
            DtoMode::Create,
        )?;
        let response = self.backend.create_trade(&dto).await?;
        let trade_id = extract_trade_id(&response).ok_or_else(|| {
            Error::Internal("create response carried no trade identifier".to_string())
        })?;
        trade.trade_id = Some(trade_id.clone());
        trade.version = response.get("version").and_then(serde_json::Value::as_i64);
        info!(trade_id = %trade_id, "created trade");

        let (settlement, settlement_task) = match settlement_verdict {
            None => (SettlementDispatch::NotRequested, None),
            Some(Err(reason)) => {
                warn!(trade_id = %trade_id, %reason, "settlement text rejected");
                (SettlementDispatch::Rejected(reason), None)
            }
            Some(Ok(())) => {
                let text = settlement_text.unwrap_or_default();
                let task = self.spawn_deferred_settlement(trade_id.clone(), text);
                (SettlementDispatch::Deferred, Some(task))
            }
        };

        Ok(SaveOutcome {
            trade_id,
            created: true,
            settlement,
            settlement_task,
        })
    }

    /// Persist settlement text for a just-created trade after a short delay,
    /// so the creation confirmation is observed before the settlement one.
    fn spawn_deferred_settlement(&self, trade_id: String, text: String) -> JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        let pending = Arc::clone(&self.pending);
        let delay = std::time::Duration::from_millis(self.config.settlement_save_delay_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = persist_settlement(backend.as_ref(), &pending, &trade_id, &text).await
            {
                warn!(trade_id = %trade_id, error = %e, "deferred settlement save failed");
            }
        })
    }

    /// Re-attempt a failed settlement save. Returns `false` when nothing is
    /// pending for the trade; the marker clears on success.
    pub async fn retry_settlement(&self, trade_id: &str) -> Result<bool> {
        let Some(text) = self.pending.get(trade_id).map(|e| e.clone()) else {
            return Ok(false);
        };
        persist_settlement(self.backend.as_ref(), &self.pending, trade_id, &text).await?;
        Ok(true)
    }

    /// Settlement text still awaiting a successful save, if any
    pub fn pending_settlement(&self, trade_id: &str) -> Option<String> {
        self.pending.get(trade_id).map(|e| e.clone())
    }

    /// Terminate a persisted trade. The local status flips only after the
    /// backend confirms.
    pub async fn terminate(&self, trade: &mut Trade) -> Result<()> {
        let Some(trade_id) = trade.trade_id.clone().filter(|id| !id.is_empty()) else {
            return Err(Error::Validation(
                "Cannot terminate: trade identifier is missing.".to_string(),
            ));
        };
        if trade.is_terminated() {
            return Err(Error::Validation(
                "Trade is already terminated.".to_string(),
            ));
        }
        self.backend.terminate_trade(&trade_id).await?;
        trade.trade_status = Some(TERMINATED_STATUS.to_string());
        info!(trade_id = %trade_id, "terminated trade");
        Ok(())
    }

    /// Fetch a trade for display or editing. Date-time shaped dates in the
    /// response normalize to date-only fields during deserialization.
    pub async fn load(&self, trade_id: &str) -> Result<Trade> {
        self.backend
            .get_trade(trade_id)
            .await
            .with_context(|| format!("loading trade {}", trade_id))
    }

    /// Fetch settlement text; a trade with no saved instructions yields an
    /// empty string.
    pub async fn load_settlement(&self, trade_id: &str) -> Result<String> {
        Ok(self
            .backend
            .get_settlement(trade_id)
            .await?
            .map(|record| record.field_value)
            .unwrap_or_default())
    }

    /// Generate cashflows and attach them to the trade's legs
    pub async fn generate_cashflows(&self, trade: &mut Trade) -> Result<Vec<Cashflow>> {
        cashflow::generate(self.backend.as_ref(), trade).await
    }
}

/// Fill an indicative rate into Fixed legs that have none, so a booking
/// drafted without one still validates and generates.
fn fill_default_fixed_rates(trade: &mut Trade) {
    for leg in trade.legs.iter_mut() {
        if leg.leg_type == Some(LegType::Fixed) && !leg.has_rate() {
            let rate = cashflow::default_fallback_rate(LegType::Fixed);
            debug!(rate = %rate, "filled default fixed rate");
            leg.rate = Some(rate.to_string());
        }
    }
}

/// One settlement persistence attempt with pending-ledger bookkeeping:
/// failure records the text for retry, success clears any marker.
async fn persist_settlement(
    backend: &dyn TradeBackend,
    pending: &DashMap<String, String>,
    trade_id: &str,
    text: &str,
) -> Result<()> {
    let entity_id = parse_numeric_id(trade_id).ok_or_else(|| {
        Error::Internal(format!("trade identifier '{}' is not numeric", trade_id))
    })?;
    let record = SettlementInstruction::for_trade(entity_id, text);
    match backend.put_settlement(trade_id, &record).await {
        Ok(()) => {
            pending.remove(trade_id);
            info!(trade_id = %trade_id, "saved settlement instructions");
            Ok(())
        }
        Err(e) => {
            pending.insert(trade_id.to_string(), text.to_string());
            Err(e)
        }
    }
}

/// Pull the new identifier out of a create response, whichever key and
/// representation the backend used.
fn extract_trade_id(response: &serde_json::Value) -> Option<String> {
    let raw = response.get("tradeId").or_else(|| response.get("id"))?;
    match raw {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
