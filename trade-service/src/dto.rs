//! Wire-DTO formatting for trade create/update calls
//!
//! The backend distinguishes "not provided" from "empty value": for a fixed
//! allow-list of keys an empty string becomes an explicit null so the
//! backend can apply auto-generation where it supports it (UTI, ids).
//! Backend-owned fields are stripped before every call, and the trade
//! identifier is only ever sent on updates.

use serde_json::{json, Map, Value};
use tracing::debug;

use common::error::Result;
use common::model::trade::Trade;
use common::model::user::SessionContext;
use common::numbers::parse_numeric_id;

/// Whether the DTO targets `POST /trades` or `PUT /trades/{id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtoMode {
    Create,
    Update,
}

/// Keys whose empty-string values become explicit nulls. Keys not listed
/// here keep empty strings unchanged.
pub const NULL_IF_EMPTY_KEYS: &[&str] = &[
    "tradeId",
    "version",
    "legId",
    "rate",
    "notional",
    "id",
    "tradeDate",
    "startDate",
    "maturityDate",
    "executionDate",
    "lastTouchTimestamp",
    "validityStartDate",
    "validityEndDate",
    "paymentValue",
    "valueDate",
    "tradeStatus",
    "index",
    "tradeType",
    "tradeSubType",
    "utiCode",
    "settlementInstructions",
    "traderUserId",
    "tradeInputterUserId",
    "traderUserName",
    "inputterUserName",
];

/// Fields owned by the backend; sending them causes validation rejections.
const BACKEND_OWNED_KEYS: &[&str] = &[
    "version",
    "createdDate",
    "lastTouchTimestamp",
    "deactivatedDate",
    "additionalFieldsId",
];

/// Map the in-memory trade to the wire shape for a create or update call.
pub fn format_for_backend(
    trade: &Trade,
    session: &SessionContext,
    settlement_text: Option<&str>,
    mode: DtoMode,
) -> Result<Value> {
    // Date fields render through the model's serde adapters: date-only as
    // YYYY-MM-DD, timestamps as YYYY-MM-DDTHH:MM:SS.
    let mut dto = serde_json::to_value(trade)?;

    resolve_user_identity(
        &mut dto,
        session,
        "traderUserId",
        "traderUserName",
        trade.trader_user_id.as_deref(),
        trade.trader_user_name.as_deref(),
    );
    resolve_user_identity(
        &mut dto,
        session,
        "tradeInputterUserId",
        "inputterUserName",
        trade.trade_inputter_user_id.as_deref(),
        trade.inputter_user_name.as_deref(),
    );

    if let Some(obj) = dto.as_object_mut() {
        obj.insert(
            "settlementInstructions".to_string(),
            json!(settlement_text.unwrap_or_default()),
        );
    }

    convert_empty_strings_to_null(&mut dto);

    if let Some(obj) = dto.as_object_mut() {
        for key in BACKEND_OWNED_KEYS {
            obj.remove(*key);
        }
        match mode {
            // The backend assigns identifiers; never send one on create.
            DtoMode::Create => {
                obj.remove("tradeId");
            }
            DtoMode::Update => {
                obj.insert("tradeId".to_string(), json!(trade.trade_id));
            }
        }
    }

    debug!(mode = ?mode, "formatted trade DTO for backend");
    Ok(dto)
}

/// Recursively convert empty-string values to null for the allow-listed
/// keys: arrays element-wise, objects key-wise. Idempotent.
pub fn convert_empty_strings_to_null(value: &mut Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                convert_empty_strings_to_null(item);
            }
        }
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if NULL_IF_EMPTY_KEYS.contains(&key.as_str())
                    && entry.as_str() == Some("")
                {
                    *entry = Value::Null;
                } else {
                    convert_empty_strings_to_null(entry);
                }
            }
        }
        _ => {}
    }
}

/// Resolve one trader/inputter identity pair in place.
///
/// Non-numeric id text is treated as a display name: it moves into the name
/// field and the id is nulled. A numeric id passes through; otherwise the
/// display name resolves against the known users list. Ids still unresolved
/// fall back to the authenticated user.
fn resolve_user_identity(
    dto: &mut Value,
    session: &SessionContext,
    id_key: &str,
    name_key: &str,
    id_field: Option<&str>,
    name_field: Option<&str>,
) {
    let Some(obj) = dto.as_object_mut() else {
        return;
    };

    let typed_name = id_field.filter(|raw| !raw.trim().is_empty() && parse_numeric_id(raw).is_none());
    if let Some(raw) = typed_name {
        if blank_at(obj, name_key) {
            obj.insert(name_key.to_string(), json!(raw));
        }
        obj.insert(id_key.to_string(), Value::Null);
    }

    let resolved = id_field
        .and_then(parse_numeric_id)
        .or_else(|| name_field.and_then(|name| session.lookup_user_id(name)))
        .or_else(|| {
            typed_name.and_then(|name| session.lookup_user_id(name))
        });

    match resolved {
        Some(id) => {
            obj.insert(id_key.to_string(), json!(id));
        }
        None => {
            // Fall back to the authenticated user for both roles.
            if let Some(current) = &session.current_user {
                if blank_at(obj, id_key) {
                    obj.insert(id_key.to_string(), json!(current.id));
                    if blank_at(obj, name_key) {
                        obj.insert(name_key.to_string(), json!(current.login_id));
                    }
                }
            }
        }
    }
}

fn blank_at(obj: &Map<String, Value>, key: &str) -> bool {
    match obj.get(key) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}
