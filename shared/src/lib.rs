//! Shared types for the Stationery Stock Ledger
//!
//! This crate contains the cross-cutting types used by the backend:
//! pagination parameters and the validation helpers wired into the
//! request DTOs.

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::*;
