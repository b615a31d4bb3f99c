//! Settlement instruction wire record and export payload

use serde::{Deserialize, Serialize};

/// Entity type under which settlement text is stored on the backend
pub const ENTITY_TYPE_TRADE: &str = "TRADE";

/// Keyed field name for settlement instructions
pub const FIELD_SETTLEMENT_INSTRUCTIONS: &str = "SETTLEMENT_INSTRUCTIONS";

/// The keyed auxiliary record holding free-text settlement instructions for
/// exactly one persisted trade. Body of
/// `PUT /trades/{id}/settlement-instructions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementInstruction {
    pub entity_type: String,
    pub entity_id: i64,
    pub field_name: String,
    pub field_value: String,
}

impl SettlementInstruction {
    /// Build the record for a trade's settlement text
    pub fn for_trade(trade_id: i64, text: impl Into<String>) -> Self {
        Self {
            entity_type: ENTITY_TYPE_TRADE.to_string(),
            entity_id: trade_id,
            field_name: FIELD_SETTLEMENT_INSTRUCTIONS.to_string(),
            field_value: text.into(),
        }
    }
}

/// Raw settlement CSV export response: body plus the headers needed to name
/// the file and to reject auth-redirect HTML pages.
#[derive(Debug, Clone)]
pub struct SettlementExport {
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}
