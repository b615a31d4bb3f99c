//! Trade model and lifecycle helpers

use chrono::{NaiveDate, NaiveDateTime};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dates::{self, serde_date_opt, serde_date_time_opt};
use crate::model::leg::{LegType, PayReceive, TradeLeg};

/// Status value of a terminated trade; no further field mutation is allowed
/// once a trade carries it.
pub const TERMINATED_STATUS: &str = "TERMINATED";

/// A swap-like trade
///
/// A trade is in one of three lifecycle states: unsaved draft (no
/// identifier), persisted (identifier and version assigned by the backend),
/// or terminated. It always carries exactly two legs, one paying and one
/// receiving.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Trade {
    /// Backend-assigned identifier; `None` until the first successful create
    pub trade_id: Option<String>,
    /// Optimistic-concurrency token, owned by the backend
    pub version: Option<i64>,
    pub book_name: Option<String>,
    pub counterparty_name: Option<String>,
    /// May transiently hold non-numeric text typed by the user; the DTO
    /// formatter moves such text into the display-name field.
    pub trader_user_id: Option<String>,
    pub trader_user_name: Option<String>,
    pub trade_inputter_user_id: Option<String>,
    pub inputter_user_name: Option<String>,
    pub trade_type: Option<String>,
    pub trade_sub_type: Option<String>,
    pub trade_status: Option<String>,
    #[serde(with = "serde_date_opt")]
    pub trade_date: Option<NaiveDate>,
    #[serde(with = "serde_date_opt")]
    pub start_date: Option<NaiveDate>,
    #[serde(with = "serde_date_opt")]
    pub maturity_date: Option<NaiveDate>,
    #[serde(with = "serde_date_opt")]
    pub execution_date: Option<NaiveDate>,
    /// Unique transaction identifier; generated client-side when absent
    pub uti_code: Option<String>,
    #[serde(with = "serde_date_time_opt")]
    pub last_touch_timestamp: Option<NaiveDateTime>,
    #[serde(with = "serde_date_opt")]
    pub validity_start_date: Option<NaiveDate>,
    #[serde(with = "serde_date_opt")]
    pub validity_end_date: Option<NaiveDate>,
    /// Exactly two legs, pay and receive
    #[serde(rename = "tradeLegs")]
    pub legs: [TradeLeg; 2],
}

impl Default for Trade {
    fn default() -> Self {
        Self {
            trade_id: None,
            version: None,
            book_name: None,
            counterparty_name: None,
            trader_user_id: None,
            trader_user_name: None,
            trade_inputter_user_id: None,
            inputter_user_name: None,
            trade_type: None,
            trade_sub_type: None,
            trade_status: None,
            trade_date: None,
            start_date: None,
            maturity_date: None,
            execution_date: None,
            uti_code: None,
            last_touch_timestamp: None,
            validity_start_date: None,
            validity_end_date: None,
            legs: [TradeLeg::default(), TradeLeg::default()],
        }
    }
}

impl Trade {
    /// Default booking template: a one-year fixed-for-floating swap, fixed
    /// payer against floating receiver, 1,000,000 USD a side, quarterly,
    /// Modified Following.
    pub fn draft() -> Self {
        let today = dates::today();
        Self {
            trade_type: Some("Swap".to_string()),
            trade_date: Some(today),
            start_date: Some(today),
            maturity_date: Some(dates::one_year_from_today()),
            execution_date: Some(today),
            validity_start_date: Some(today),
            legs: [
                TradeLeg {
                    leg_type: Some(LegType::Fixed),
                    notional: Some("1000000".to_string()),
                    currency: Some("USD".to_string()),
                    rate: Some("1.0".to_string()),
                    calculation_period_schedule: Some("Quarterly".to_string()),
                    payment_business_day_convention: Some("Modified Following".to_string()),
                    pay_receive_flag: Some(PayReceive::Pay),
                    ..TradeLeg::default()
                },
                TradeLeg {
                    leg_type: Some(LegType::Floating),
                    notional: Some("1000000".to_string()),
                    currency: Some("USD".to_string()),
                    index: Some("LIBOR".to_string()),
                    calculation_period_schedule: Some("Quarterly".to_string()),
                    payment_business_day_convention: Some("Modified Following".to_string()),
                    pay_receive_flag: Some(PayReceive::Receive),
                    ..TradeLeg::default()
                },
            ],
            ..Self::default()
        }
    }

    /// True once the backend has assigned an identifier
    pub fn is_persisted(&self) -> bool {
        self.trade_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// True when the trade has been terminated
    pub fn is_terminated(&self) -> bool {
        self.trade_status.as_deref() == Some(TERMINATED_STATUS)
    }

    /// Generate and assign a unique transaction identifier if none is
    /// present: `UTI-<yyyymmdd>-<4 random digits>`.
    pub fn ensure_uti(&mut self) -> &str {
        let missing = self
            .uti_code
            .as_deref()
            .map_or(true, |uti| uti.trim().is_empty());
        if missing {
            let date_part = dates::today().format("%Y%m%d");
            let random_part: u16 = rand::thread_rng().gen_range(0..10_000);
            let uti = format!("UTI-{}-{:04}", date_part, random_part);
            tracing::debug!(uti = %uti, "generated transaction identifier");
            self.uti_code = Some(uti);
        }
        self.uti_code.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_has_opposite_leg_directions() {
        let trade = Trade::draft();
        assert_eq!(trade.legs[0].pay_receive_flag, Some(PayReceive::Pay));
        assert_eq!(
            trade.legs[1].pay_receive_flag,
            Some(trade.legs[0].pay_receive_flag.unwrap().opposite())
        );
        assert!(!trade.is_persisted());
        assert!(!trade.is_terminated());
    }

    #[test]
    fn uti_generated_once_with_expected_shape() {
        let mut trade = Trade::draft();
        let uti = trade.ensure_uti().to_string();
        assert!(uti.starts_with("UTI-"));
        // UTI-yyyymmdd-nnnn
        assert_eq!(uti.len(), 4 + 8 + 1 + 4);
        let again = trade.ensure_uti().to_string();
        assert_eq!(uti, again);
    }

    #[test]
    fn serializes_to_wire_names() {
        let trade = Trade::draft();
        let value = serde_json::to_value(&trade).unwrap();
        assert!(value.get("tradeLegs").is_some());
        assert!(value.get("bookName").is_some());
        assert!(value.get("counterpartyName").is_some());
        assert_eq!(value["tradeLegs"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn deserializes_date_time_shaped_dates() {
        let raw = serde_json::json!({
            "tradeId": "1042",
            "tradeDate": "2025-06-01T00:00:00",
            "maturityDate": "2026-06-01",
            "tradeLegs": [{}, {}]
        });
        let trade: Trade = serde_json::from_value(raw).unwrap();
        assert_eq!(
            trade.trade_date,
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );
        assert_eq!(
            trade.maturity_date,
            NaiveDate::from_ymd_opt(2026, 6, 1)
        );
    }
}
