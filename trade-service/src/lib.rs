//! Trade booking workflow service
//!
//! Validation, wire-DTO formatting and save/terminate orchestration for
//! swap-style trades, plus the cashflow-generation adapter and the backend
//! interface (HTTP and in-memory implementations).

pub mod backend;
pub mod cashflow;
pub mod config;
pub mod dto;
pub mod labels;
pub mod service;
pub mod validator;

pub use backend::{HttpTradeBackend, InMemoryTradeBackend, TradeBackend};
pub use config::TradeServiceConfig;
pub use service::{SaveOutcome, SettlementDispatch, TradeService};
