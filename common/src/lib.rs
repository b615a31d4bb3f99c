//! Common types and utilities for the swapdesk booking workflow
//!
//! This library contains the shared domain models, the unified error type and
//! the date/number normalization helpers used by the trade and settlement
//! services. Everything here is backend-shape aware: models serialize to the
//! camelCase wire names the trade backend expects.

pub mod dates;
pub mod error;
pub mod model;
pub mod numbers;

/// Re-export important types
pub use error::{Error, ErrorExt, Result};
pub use numbers::*;
