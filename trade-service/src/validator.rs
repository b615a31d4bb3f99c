//! Structural trade and leg validation
//!
//! Runs before every save. Maturity propagation runs first and mutates the
//! trade in place, so propagated values count toward the presence checks
//! that follow. Messages are user-facing; legs are 1-indexed in them.

use common::dates::format_date;
use common::error::{Error, Result};
use common::model::leg::LegType;
use common::model::trade::Trade;

/// Validate a trade for completeness, propagating the trade-level maturity
/// date down to legs that lack one. Returns the first violated rule as a
/// human-readable error.
pub fn validate(trade: &mut Trade) -> Result<()> {
    propagate_maturity(trade)?;

    if trade.trade_date.is_none() {
        return Err(Error::Validation("Trade date is required.".to_string()));
    }
    if is_blank(&trade.book_name) {
        return Err(Error::Validation("Book is required.".to_string()));
    }
    if is_blank(&trade.counterparty_name) {
        return Err(Error::Validation("Counterparty is required.".to_string()));
    }

    for (idx, leg) in trade.legs.iter().enumerate() {
        let leg_no = idx + 1;
        let Some(leg_type) = leg.leg_type else {
            return Err(leg_error(leg_no, "Leg Type is required."));
        };
        // Presence check, not truthiness: a notional of exactly 0 is legal.
        if is_blank(&leg.notional) {
            return Err(leg_error(leg_no, "Notional is required."));
        }
        if is_blank(&leg.currency) {
            return Err(leg_error(leg_no, "Currency is required."));
        }
        if is_blank(&leg.calculation_period_schedule) {
            return Err(leg_error(leg_no, "Payment Frequency is required."));
        }
        if is_blank(&leg.payment_business_day_convention) {
            return Err(leg_error(leg_no, "Payment BDC is required."));
        }
        if leg.pay_receive_flag.is_none() {
            return Err(leg_error(leg_no, "Pay/Rec is required."));
        }
        match leg_type {
            LegType::Fixed if !leg.has_rate() => {
                return Err(leg_error(leg_no, "Fixed Rate is required for Fixed leg."));
            }
            LegType::Floating if !leg.has_index() => {
                return Err(leg_error(
                    leg_no,
                    "Floating Rate Index is required for Floating leg.",
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Copy the trade-level maturity into legs that lack one. Legs with an
/// existing value are never overwritten; if the existing leg values disagree
/// with each other and with the trade-level date, nothing is mutated and a
/// conflict is reported.
fn propagate_maturity(trade: &mut Trade) -> Result<()> {
    let Some(top) = trade.maturity_date else {
        return Ok(());
    };

    let existing: Vec<_> = trade.legs.iter().filter_map(|l| l.maturity_date).collect();
    let legs_disagree = existing.windows(2).any(|pair| pair[0] != pair[1]);
    let top_matches_all = existing.iter().all(|d| *d == top);
    if legs_disagree && !top_matches_all {
        let leg_values: Vec<String> = existing.iter().map(|d| format_date(*d)).collect();
        return Err(Error::MaturityConflict(format!(
            "trade maturity {} disagrees with leg maturities [{}]",
            format_date(top),
            leg_values.join(", ")
        )));
    }

    for leg in trade.legs.iter_mut() {
        if leg.maturity_date.is_none() {
            leg.maturity_date = Some(top);
        }
    }
    Ok(())
}

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().map_or(true, |s| s.trim().is_empty())
}

fn leg_error(leg_no: usize, message: &str) -> Error {
    Error::Validation(format!("Leg {}: {}", leg_no, message))
}
