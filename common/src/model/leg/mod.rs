//! Trade leg model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::serde_date_opt;
use crate::model::cashflow::Cashflow;

/// Leg type (fixed or floating rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegType {
    Fixed,
    Floating,
}

impl LegType {
    /// Wire/display label for this leg type
    pub fn label(&self) -> &'static str {
        match self {
            LegType::Fixed => "Fixed",
            LegType::Floating => "Floating",
        }
    }
}

impl std::fmt::Display for LegType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Direction of a leg's payments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayReceive {
    Pay,
    Receive,
}

impl PayReceive {
    /// Wire/display label for this direction
    pub fn label(&self) -> &'static str {
        match self {
            PayReceive::Pay => "Pay",
            PayReceive::Receive => "Receive",
        }
    }

    /// The opposite direction
    pub fn opposite(&self) -> PayReceive {
        match self {
            PayReceive::Pay => PayReceive::Receive,
            PayReceive::Receive => PayReceive::Pay,
        }
    }
}

impl std::fmt::Display for PayReceive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One side of a swap-like trade
///
/// Notional and rate stay as the raw text the user entered (possibly with
/// thousands separators); they are sanitized at the point of use. Cashflows
/// are lazily populated by the generation adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TradeLeg {
    pub leg_id: Option<String>,
    pub leg_type: Option<LegType>,
    pub notional: Option<String>,
    pub currency: Option<String>,
    /// Required for Fixed legs; derived or defaulted for Floating legs
    pub rate: Option<String>,
    /// Reference index, required for Floating legs
    pub index: Option<String>,
    pub calculation_period_schedule: Option<String>,
    pub payment_business_day_convention: Option<String>,
    pub pay_receive_flag: Option<PayReceive>,
    /// Per-leg maturity; filled from the trade-level maturity when absent
    #[serde(with = "serde_date_opt")]
    pub maturity_date: Option<NaiveDate>,
    pub cashflows: Vec<Cashflow>,
}

impl TradeLeg {
    /// True when a non-empty rate is present
    pub fn has_rate(&self) -> bool {
        self.rate.as_deref().is_some_and(|r| !r.trim().is_empty())
    }

    /// True when a non-empty reference index is present
    pub fn has_index(&self) -> bool {
        self.index.as_deref().is_some_and(|i| !i.trim().is_empty())
    }
}
