//! # Admission & Mining
//!
//! Accepts a transaction, mines a new block, and broadcasts it (§4.7).

pub mod admission;
pub mod error;

pub use admission::{add_transaction, add_transaction_with_consensus, AdmissionOutcome};
pub use error::AdmissionError;
