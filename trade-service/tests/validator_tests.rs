use chrono::NaiveDate;

use common::error::Error;
use common::model::trade::Trade;
use trade_service::validator::validate;

fn bookable_trade() -> Trade {
    let mut trade = Trade::draft();
    trade.book_name = Some("RATES-NY".to_string());
    trade.counterparty_name = Some("ACME Bank".to_string());
    trade
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_complete_trade_validates() {
    let mut trade = bookable_trade();
    assert!(validate(&mut trade).is_ok());
}

#[test]
fn test_maturity_propagates_to_legs_missing_one() {
    let mut trade = bookable_trade();
    let top = date(2027, 3, 15);
    trade.maturity_date = Some(top);
    trade.legs[0].maturity_date = None;
    trade.legs[1].maturity_date = None;

    validate(&mut trade).unwrap();
    assert_eq!(trade.legs[0].maturity_date, Some(top));
    assert_eq!(trade.legs[1].maturity_date, Some(top));
}

#[test]
fn test_existing_leg_maturity_never_overwritten() {
    let mut trade = bookable_trade();
    let leg_date = date(2027, 6, 1);
    trade.maturity_date = Some(date(2027, 3, 15));
    trade.legs[0].maturity_date = Some(leg_date);
    trade.legs[1].maturity_date = Some(leg_date);

    validate(&mut trade).unwrap();
    assert_eq!(trade.legs[0].maturity_date, Some(leg_date));
    assert_eq!(trade.legs[1].maturity_date, Some(leg_date));
}

#[test]
fn test_conflicting_maturities_reported_without_mutation() {
    let mut trade = bookable_trade();
    let first = date(2027, 1, 1);
    let second = date(2028, 1, 1);
    trade.maturity_date = Some(date(2027, 6, 1));
    trade.legs[0].maturity_date = Some(first);
    trade.legs[1].maturity_date = Some(second);

    let err = validate(&mut trade).unwrap_err();
    assert!(matches!(err, Error::MaturityConflict(_)));
    // Nothing was touched.
    assert_eq!(trade.legs[0].maturity_date, Some(first));
    assert_eq!(trade.legs[1].maturity_date, Some(second));
}

#[test]
fn test_missing_trade_level_fields() {
    let mut trade = bookable_trade();
    trade.trade_date = None;
    assert_eq!(
        validate(&mut trade).unwrap_err().to_string(),
        "Trade date is required."
    );

    let mut trade = bookable_trade();
    trade.book_name = Some("   ".to_string());
    assert_eq!(validate(&mut trade).unwrap_err().to_string(), "Book is required.");

    let mut trade = bookable_trade();
    trade.counterparty_name = None;
    assert_eq!(
        validate(&mut trade).unwrap_err().to_string(),
        "Counterparty is required."
    );
}

#[test]
fn test_leg_errors_are_one_indexed() {
    let mut trade = bookable_trade();
    trade.legs[1].currency = None;
    assert_eq!(
        validate(&mut trade).unwrap_err().to_string(),
        "Leg 2: Currency is required."
    );
}

#[test]
fn test_each_missing_leg_field_message() {
    let cases: Vec<(Box<dyn Fn(&mut Trade)>, &str)> = vec![
        (
            Box::new(|t| t.legs[0].leg_type = None),
            "Leg 1: Leg Type is required.",
        ),
        (
            Box::new(|t| t.legs[0].notional = None),
            "Leg 1: Notional is required.",
        ),
        (
            Box::new(|t| t.legs[0].currency = Some(String::new())),
            "Leg 1: Currency is required.",
        ),
        (
            Box::new(|t| t.legs[0].calculation_period_schedule = None),
            "Leg 1: Payment Frequency is required.",
        ),
        (
            Box::new(|t| t.legs[0].payment_business_day_convention = None),
            "Leg 1: Payment BDC is required.",
        ),
        (
            Box::new(|t| t.legs[0].pay_receive_flag = None),
            "Leg 1: Pay/Rec is required.",
        ),
        (
            Box::new(|t| t.legs[0].rate = Some("  ".to_string())),
            "Leg 1: Fixed Rate is required for Fixed leg.",
        ),
        (
            Box::new(|t| t.legs[1].index = None),
            "Leg 2: Floating Rate Index is required for Floating leg.",
        ),
    ];

    for (mutate, expected) in cases {
        let mut trade = bookable_trade();
        mutate(&mut trade);
        let err = validate(&mut trade).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn test_zero_notional_is_accepted() {
    let mut trade = bookable_trade();
    trade.legs[0].notional = Some("0".to_string());
    assert!(validate(&mut trade).is_ok());
}
