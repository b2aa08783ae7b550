//! # Safety Analyzer
//!
//! Static, total rejection of untrusted contract source (§4.1 of the node
//! specification) before the [`qc_executor`](../qc_executor/index.html)
//! façade ever hands it to a sandboxed child process. The analyzer never
//! parses a real syntax tree and never executes a byte of the source it
//! examines — it only ever says "reject, and here is why" or "proceed".

pub mod analyzer;
pub mod error;
pub mod rules;

pub use analyzer::analyze;
pub use error::SafetyRejection;
