//! External address format.
//!
//! Addresses identifying a sender, recipient, or miner match
//! `^smartX[a-fA-F0-9]{40}$` (§6 of the node specification): a fixed
//! `smartX` prefix followed by 40 hex digits.

use thiserror::Error;

const PREFIX: &str = "smartX";
const HEX_LEN: usize = 40;

/// An address failed the `smartX<40 hex>` format check.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("address {0:?} does not match ^smartX[a-fA-F0-9]{{40}}$")]
pub struct AddressError(pub String);

/// Returns `true` iff `addr` matches `^smartX[a-fA-F0-9]{40}$`.
#[must_use]
pub fn is_valid_address(addr: &str) -> bool {
    validate_address(addr).is_ok()
}

/// Validates `addr` against the `smartX` address format, returning the
/// offending value on failure.
pub fn validate_address(addr: &str) -> Result<(), AddressError> {
    let Some(hex) = addr.strip_prefix(PREFIX) else {
        return Err(AddressError(addr.to_string()));
    };
    if hex.len() == HEX_LEN && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(AddressError(addr.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_address() {
        let addr = format!("smartX{}", "a".repeat(40));
        assert!(is_valid_address(&addr));
    }

    #[test]
    fn rejects_wrong_prefix() {
        assert!(!is_valid_address(&format!("smartY{}", "a".repeat(40))));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(!is_valid_address(&format!("smartX{}", "a".repeat(39))));
        assert!(!is_valid_address(&format!("smartX{}", "a".repeat(41))));
    }

    #[test]
    fn rejects_non_hex() {
        assert!(!is_valid_address(&format!("smartX{}z", "a".repeat(39))));
    }
}
