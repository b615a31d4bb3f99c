//! Domain models for the booking workflow

pub mod cashflow;
pub mod leg;
pub mod settlement;
pub mod trade;
pub mod user;
