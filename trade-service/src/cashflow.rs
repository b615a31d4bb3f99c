//! Cashflow generation adapter
//!
//! Sanitizes leg inputs, calls the backend generator, and partitions the
//! returned rows back onto the trade's legs. Labels in generator output are
//! free text, so partitioning uses the tolerant prefix matcher.

use rust_decimal::Decimal;
use tracing::{debug, info};

use common::error::{Error, Result};
use common::model::cashflow::{Cashflow, CashflowLeg, CashflowRequest};
use common::model::leg::{LegType, TradeLeg};
use common::model::trade::Trade;
use common::numbers::{dec, sanitize_decimal};

use crate::backend::TradeBackend;
use crate::labels::prefix_match;

/// Rate used for generation when a leg has none entered. The generator
/// rejects rateless legs outright, so booking a preview with incomplete
/// inputs falls back to an indicative level per leg type.
pub fn default_fallback_rate(leg_type: LegType) -> Decimal {
    match leg_type {
        LegType::Fixed => dec!(0.035),
        LegType::Floating => dec!(0.05),
    }
}

/// Generate cashflows for the trade and attach them to its legs. The trade's
/// leg cashflow vectors are replaced wholesale; rows that match neither leg
/// are dropped with a debug log.
pub async fn generate(backend: &dyn TradeBackend, trade: &mut Trade) -> Result<Vec<Cashflow>> {
    let request = build_request(trade)?;
    let rows = backend.generate_cashflows(&request).await?;
    info!(rows = rows.len(), "generated cashflows");
    partition_onto_legs(&rows, &mut trade.legs);
    Ok(rows)
}

/// Build the generation request from the trade, sanitizing numeric text and
/// substituting fallback rates where the user has not entered one.
pub fn build_request(trade: &Trade) -> Result<CashflowRequest> {
    let start = trade
        .start_date
        .or(trade.trade_date)
        .ok_or_else(|| Error::Validation("Trade date is required to generate cashflows.".to_string()))?;
    let maturity = trade
        .maturity_date
        .or_else(|| trade.legs.iter().find_map(|l| l.maturity_date))
        .ok_or_else(|| {
            Error::Validation("Maturity date is required to generate cashflows.".to_string())
        })?;

    Ok(CashflowRequest {
        legs: trade.legs.iter().map(sanitize_leg).collect(),
        trade_start_date: Some(start),
        trade_maturity_date: Some(maturity),
    })
}

fn sanitize_leg(leg: &TradeLeg) -> CashflowLeg {
    let notional = leg.notional.as_deref().and_then(sanitize_decimal);
    let entered_rate = leg.rate.as_deref().and_then(sanitize_decimal);
    let rate = entered_rate.or_else(|| leg.leg_type.map(default_fallback_rate));
    CashflowLeg {
        leg_type: leg.leg_type,
        notional,
        rate,
        index: leg.index.clone(),
        calculation_period_schedule: leg.calculation_period_schedule.clone(),
        payment_business_day_convention: leg.payment_business_day_convention.clone(),
        pay_receive_flag: leg.pay_receive_flag,
    }
}

/// Assign each generated row to the leg whose direction and type labels it
/// both matches. A row missing either label, or matching only one of the
/// two, attaches to no leg.
pub fn partition_onto_legs(rows: &[Cashflow], legs: &mut [TradeLeg; 2]) {
    for leg in legs.iter_mut() {
        leg.cashflows.clear();
    }
    for row in rows {
        let target = legs.iter_mut().find(|leg| row_matches_leg(row, leg));
        match target {
            Some(leg) => leg.cashflows.push(row.clone()),
            None => debug!(
                pay_rec = ?row.pay_rec,
                payment_type = ?row.payment_type,
                "cashflow row matched no leg"
            ),
        }
    }
}

fn row_matches_leg(row: &Cashflow, leg: &TradeLeg) -> bool {
    let direction = match (row.pay_rec.as_deref(), leg.pay_receive_flag) {
        (Some(pay_rec), Some(flag)) => prefix_match(pay_rec, flag.label()),
        _ => false,
    };
    let payment_type = match (row.payment_type.as_deref(), leg.leg_type) {
        (Some(payment_type), Some(leg_type)) => prefix_match(payment_type, leg_type.label()),
        _ => false,
    };
    direction && payment_type
}

/// Split rows into (pay, receive) buckets for display. Rows with no
/// direction label land in neither bucket.
pub fn group_by_direction(rows: &[Cashflow]) -> (Vec<Cashflow>, Vec<Cashflow>) {
    let mut pay = Vec::new();
    let mut receive = Vec::new();
    for row in rows {
        let Some(label) = row.pay_rec.as_deref() else {
            continue;
        };
        if prefix_match(label, "Pay") {
            pay.push(row.clone());
        } else if prefix_match(label, "Receive") {
            receive.push(row.clone());
        }
    }
    (pay, receive)
}
