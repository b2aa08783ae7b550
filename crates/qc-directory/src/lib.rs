//! # Node Directory
//!
//! The set of peers a node currently considers live: a concurrent
//! `address -> last_seen` map, gated on entry by an HMAC signature shared
//! out of band by the chain's operators, refreshed by heartbeats, and
//! periodically merged with snapshots gossiped by other peers.

mod error;

pub use error::DirectoryError;

use std::collections::HashMap;

use dashmap::DashMap;
use shared_types::hmac_sig::verify_hmac;
use tracing::{debug, info, warn};

/// A peer is dropped from the *active* view after this many seconds without
/// a heartbeat or re-registration, though its last-known timestamp is kept
/// around until a newer one replaces it.
pub const HEARTBEAT_TIMEOUT_SECS: i64 = 30;

/// Interval on which a node merges its directory with a peer's snapshot.
pub const GOSSIP_INTERVAL_SECS: u64 = 5;

/// Concurrent registry of peer addresses and their last-seen timestamps.
pub struct Directory {
    peers: DashMap<String, i64>,
    registration_key: Vec<u8>,
}

impl Directory {
    #[must_use]
    pub fn new(registration_key: impl Into<Vec<u8>>) -> Self {
        Self {
            peers: DashMap::new(),
            registration_key: registration_key.into(),
        }
    }

    /// Validates `signature` as the HMAC of `addr` under the directory's
    /// registration key, then records or refreshes `addr` with `now`.
    ///
    /// Returns `Ok(true)` iff `addr` was not already known — callers use
    /// this to decide whether to fan the registration back out to the rest
    /// of the directory.
    pub fn register(
        &self,
        addr: &str,
        signature: &str,
        now: i64,
    ) -> Result<bool, DirectoryError> {
        if !verify_hmac(&self.registration_key, addr, signature) {
            warn!(%addr, "rejected registration: bad signature");
            return Err(DirectoryError::InvalidSignature);
        }
        let is_new = !self.peers.contains_key(addr);
        self.peers.insert(addr.to_string(), now);
        if is_new {
            info!(%addr, "peer registered");
        } else {
            debug!(%addr, "peer re-registered");
        }
        Ok(is_new)
    }

    /// Validates `addr` as a well-formed absolute URI and inserts or
    /// refreshes its last-seen timestamp — no signature is re-checked
    /// (§4.5). Unlike [`Self::register`], a heartbeat from a peer the
    /// directory has never seen still creates an entry: the §3 invariant
    /// is "a peer entry exists iff a valid registration *or heartbeat* was
    /// received within the last 30 s", not registration alone.
    pub fn heartbeat(&self, addr: &str, now: i64) -> bool {
        if !is_well_formed_absolute_uri(addr) {
            warn!(%addr, "rejected heartbeat: not a well-formed absolute URI");
            return false;
        }
        self.peers.insert(addr.to_string(), now);
        true
    }

    /// Addresses whose last-seen timestamp is within [`HEARTBEAT_TIMEOUT_SECS`]
    /// of `now`.
    #[must_use]
    pub fn active_peers(&self, now: i64) -> Vec<String> {
        self.peers
            .iter()
            .filter(|entry| now - *entry.value() <= HEARTBEAT_TIMEOUT_SECS)
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// A full copy of the directory for gossiping to another peer.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, i64> {
        self.peers
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Merges a snapshot received from another peer. An incoming timestamp
    /// only replaces ours if it is strictly newer — the directory never
    /// regresses a peer's last-seen time because a stale gossip round
    /// arrived late.
    pub fn merge(&self, incoming: &HashMap<String, i64>) {
        for (addr, seen) in incoming {
            match self.peers.get(addr) {
                Some(existing) if *existing >= *seen => continue,
                _ => {
                    self.peers.insert(addr.clone(), *seen);
                }
            }
        }
    }

    /// Number of peers the directory currently knows about, active or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

/// A minimal absolute-URI check: a non-empty scheme of letters, digits,
/// `+`, `-`, or `.`, followed by `://` and a non-empty rest. Peer addresses
/// in this node are always `tcp://host:port`, but §4.5 only asks that the
/// address be a well-formed absolute URI, not that it use a specific
/// scheme.
fn is_well_formed_absolute_uri(addr: &str) -> bool {
    let Some((scheme, rest)) = addr.split_once("://") else {
        return false;
    };
    !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !rest.is_empty()
}
