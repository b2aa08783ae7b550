//! # Snowman Voter
//!
//! Single-round quorum voting used to accept a freshly mined block before
//! it is persisted (§4.8).

pub mod error;
pub mod voter;

pub use error::ConsensusError;
pub use voter::{ConsensusRound, SnowmanVoter};
