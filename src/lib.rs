//! Workspace test metapackage
//!
//! This crate exists so workspace-level integration tests under `tests/`
//! can pull in every member crate at once. It exports nothing of its own;
//! use the member crates (`common`, `trade-service`, `settlement-service`)
//! directly.

pub use common;
pub use settlement_service;
pub use trade_service;
