//! Directory registration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("registration signature does not match the expected HMAC")]
    InvalidSignature,
}
