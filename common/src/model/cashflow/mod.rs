//! Generated cashflow rows and the generation request wire shapes

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dates::serde_date_opt;
use crate::model::leg::{LegType, PayReceive};

/// One scheduled payment row, produced entirely by the backend generator.
/// Read-only on this side; the client only partitions and displays these.
///
/// The `pay_rec` and `payment_type` labels are free text and not always
/// spelled out in full ("Rec" vs "Receive"), so matching against them must
/// go through the tolerant label matcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cashflow {
    #[serde(with = "serde_date_opt")]
    pub value_date: Option<NaiveDate>,
    pub payment_value: Option<Decimal>,
    pub pay_rec: Option<String>,
    pub payment_type: Option<String>,
    pub payment_business_day_convention: Option<String>,
    pub rate: Option<Decimal>,
}

/// Sanitized leg data sent to the remote cashflow generator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowLeg {
    pub leg_type: Option<LegType>,
    pub notional: Option<Decimal>,
    pub rate: Option<Decimal>,
    pub index: Option<String>,
    pub calculation_period_schedule: Option<String>,
    pub payment_business_day_convention: Option<String>,
    pub pay_receive_flag: Option<PayReceive>,
}

/// Body of `POST /cashflows/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowRequest {
    pub legs: Vec<CashflowLeg>,
    #[serde(with = "serde_date_opt")]
    pub trade_start_date: Option<NaiveDate>,
    #[serde(with = "serde_date_opt")]
    pub trade_maturity_date: Option<NaiveDate>,
}
