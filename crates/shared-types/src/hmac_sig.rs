//! HMAC-SHA256 signing, used to gate peer registration.
//!
//! `sig = base64(HMAC_SHA256(key = chain_secret_utf8, msg = nodeAddress_utf8))`
//! (§6). The chain secret doubles as the chain id (`smartxchain` in
//! configuration).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes `base64(HMAC-SHA256(key, msg))`.
#[must_use]
pub fn sign_hmac(key: &[u8], msg: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(msg.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Returns `true` iff `signature` is the base64 HMAC-SHA256 of `msg` under
/// `key`, using constant-time comparison against the freshly computed MAC.
#[must_use]
pub fn verify_hmac(key: &[u8], msg: &str, signature: &str) -> bool {
    let Ok(provided) = STANDARD.decode(signature) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(msg.as_bytes());
    mac.verify_slice(&provided).is_ok()
}
