//! The transaction wire/storage shape (§3).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::address::validate_address;
use crate::errors::TransactionError;

/// Fixed per-transaction gas charge before the data/info surcharge.
const BASE_GAS: u64 = 10;

/// A transaction moving value (and optionally opaque `data`) between two
/// `smartX` addresses.
///
/// `gas` is derived — `10 + 2*(len(data)+len(info))` — and is recomputed
/// whenever `data` or `info` changes via [`Transaction::set_data`] /
/// [`Transaction::set_info`]; constructing the struct directly and hand
/// editing those fields without going through the setters will leave `gas`
/// stale, which admission rejects (§8: `t.gas == 10 + 2*(len(t.data)+len(t.info))`
/// must hold after any mutation of `t.data` or `t.info`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: rust_decimal::Decimal,
    pub data: Vec<u8>,
    pub info: String,
    pub timestamp: i64,
    /// `base64(sig) "|" fingerprint`, set once the sender has signed.
    pub signature: Option<String>,
    pub gas: u64,
}

impl Transaction {
    /// Builds a transaction with `gas` computed from the initial `data`/`info`.
    #[must_use]
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: rust_decimal::Decimal,
        data: Vec<u8>,
        info: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        let info = info.into();
        let gas = gas_for(&data, &info);
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            data,
            info,
            timestamp,
            signature: None,
            gas,
        }
    }

    /// Replaces `data`, recomputing `gas`.
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
        self.recompute_gas();
    }

    /// Replaces `info`, recomputing `gas`.
    pub fn set_info(&mut self, info: impl Into<String>) {
        self.info = info.into();
        self.recompute_gas();
    }

    /// Recomputes `gas` from the current `data`/`info`. Exposed so callers
    /// that deserialize a transaction from the wire can bring a stale value
    /// back in line before re-checking it.
    pub fn recompute_gas(&mut self) {
        self.gas = gas_for(&self.data, &self.info);
    }

    /// Attaches a signature in the `base64(sig)|fingerprint` shape.
    pub fn sign(&mut self, sig_bytes: &[u8], fingerprint: &str) {
        self.signature = Some(format!("{}|{}", STANDARD.encode(sig_bytes), fingerprint));
    }

    /// Splits a set `signature` into its `(sig_bytes, fingerprint)` halves.
    /// Returns `None` if unsigned or malformed.
    #[must_use]
    pub fn signature_parts(&self) -> Option<(Vec<u8>, &str)> {
        let raw = self.signature.as_deref()?;
        let (sig_b64, fingerprint) = raw.split_once('|')?;
        let sig_bytes = STANDARD.decode(sig_b64).ok()?;
        Some((sig_bytes, fingerprint))
    }

    /// Validates the structural invariants admission requires: well-formed
    /// addresses and a `gas` value consistent with the current `data`/`info`.
    /// Does not itself re-verify the cryptographic signature — callers that
    /// have a verifier (e.g. `shared-crypto::ecdsa::verify`) should also
    /// check `signature_parts` against the expected assembly fingerprint.
    pub fn validate_shape(&self) -> Result<(), TransactionError> {
        validate_address(&self.sender)?;
        validate_address(&self.recipient)?;
        let expected = gas_for(&self.data, &self.info);
        if self.gas != expected {
            return Err(TransactionError::GasMismatch {
                expected,
                found: self.gas,
            });
        }
        Ok(())
    }
}

fn gas_for(data: &[u8], info: &str) -> u64 {
    BASE_GAS + 2 * (data.len() + info.len()) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn addr(tag: u8) -> String {
        format!("smartX{}", format!("{tag:02x}").repeat(20))
    }

    #[test]
    fn gas_recomputed_on_data_change() {
        let mut tx = Transaction::new(addr(1), addr(2), Decimal::ONE, vec![], "", 0);
        assert_eq!(tx.gas, 10);
        tx.set_data(vec![0u8; 5]);
        assert_eq!(tx.gas, 10 + 2 * 5);
    }

    #[test]
    fn gas_recomputed_on_info_change() {
        let mut tx = Transaction::new(addr(1), addr(2), Decimal::ONE, vec![], "", 0);
        tx.set_info("hello");
        assert_eq!(tx.gas, 10 + 2 * 5);
    }

    #[test]
    fn sign_and_split_round_trips() {
        let mut tx = Transaction::new(addr(1), addr(2), Decimal::ONE, vec![], "", 0);
        tx.sign(b"sigbytes", "QC-FP-1");
        let (sig, fp) = tx.signature_parts().unwrap();
        assert_eq!(sig, b"sigbytes");
        assert_eq!(fp, "QC-FP-1");
    }

    #[test]
    fn validate_shape_rejects_bad_address() {
        let tx = Transaction::new("not-an-address", addr(2), Decimal::ONE, vec![], "", 0);
        assert!(tx.validate_shape().is_err());
    }

    #[test]
    fn validate_shape_rejects_stale_gas() {
        let mut tx = Transaction::new(addr(1), addr(2), Decimal::ONE, vec![], "", 0);
        tx.data = vec![0u8; 3]; // bypass the setter, leaving gas stale
        assert!(matches!(
            tx.validate_shape(),
            Err(TransactionError::GasMismatch { .. })
        ));
    }
}
