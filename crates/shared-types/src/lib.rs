//! # Shared Types Crate
//!
//! Domain entities shared across the node's subsystems: the transaction
//! shape, the address format, and the HMAC helper used to gate peer
//! registration.
//!
//! ## Design Principles
//!
//! - **Single source of truth**: the wire shape of a [`Transaction`] and the
//!   address format are defined once, here, and every other crate depends on
//!   this one rather than redefining them.
//! - **No primitive bit-layout decisions**: block hashing and transaction
//!   signature schemes live in `shared-crypto`; this crate only carries data
//!   shapes and the HMAC registration-signature helper.

pub mod address;
pub mod errors;
pub mod hmac_sig;
pub mod transaction;

pub use address::{is_valid_address, AddressError};
pub use errors::*;
pub use hmac_sig::{sign_hmac, verify_hmac};
pub use transaction::Transaction;
