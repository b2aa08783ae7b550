//! The single outcome the analyzer can refuse with.

use thiserror::Error;

/// Contract source was rejected before it was ever compiled or run.
///
/// The analyzer never executes the code it examines (§4.1: "Analysis must
/// be total"), so this is the only error this crate produces — a finding,
/// not an I/O or parse failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct SafetyRejection(pub String);

impl SafetyRejection {
    pub(crate) fn namespace(target: &str) -> Self {
        Self(format!(
            "import of namespace {target:?} is not covered by the allowlist"
        ))
    }

    pub(crate) fn unsafe_block() -> Self {
        Self("source contains an unsafe raw-pointer construct".to_string())
    }

    pub(crate) fn forbidden_class(type_name: &str, matched: &str) -> Self {
        Self(format!(
            "construction of {type_name:?} is forbidden (matches class rule {matched:?})"
        ))
    }

    pub(crate) fn forbidden_method(call: &str, matched: &str) -> Self {
        Self(format!(
            "call to {call:?} is forbidden (matches method rule {matched:?})"
        ))
    }

    pub(crate) fn forbidden_keyword(keyword: &str) -> Self {
        Self(format!("use of reserved keyword {keyword:?} is forbidden"))
    }
}
