//! Deterministic Candidate Ordering
//!
//! Every list the engine emits is part of consensus, so ordering can never
//! fall out of hash-map iteration. Two orderings are used:
//!
//! - a seeded shuffle that rotates the active committee across epochs, and
//! - a voting-power ranking whose ties rotate deterministically with the
//!   epoch start height.

use alloy_primitives::{b256, keccak256, Address, B256, U256};
use std::collections::BTreeMap;

/// Fixed shuffle seed distributed with the protocol. Changing it is a hard
/// fork.
pub const CRYPTO_SEED: B256 =
    b256!("829c43e1d4ff8e6b46e1f23b9a73e2a55f7ac6bbd0c8ed7f3a5f1e14a79c0d52");

fn shuffle_weight(seed: &[u8], epoch_start_height: u64, address: &Address) -> B256 {
    let mut buf = Vec::with_capacity(seed.len() + 8 + Address::len_bytes());
    buf.extend_from_slice(seed);
    buf.extend_from_slice(&epoch_start_height.to_be_bytes());
    buf.extend_from_slice(address.as_slice());
    keccak256(&buf)
}

fn tie_break(epoch_start_height: u64, address: &Address) -> B256 {
    let mut buf = Vec::with_capacity(8 + Address::len_bytes());
    buf.extend_from_slice(&epoch_start_height.to_be_bytes());
    buf.extend_from_slice(address.as_slice());
    keccak256(&buf)
}

/// Deterministically shuffle addresses in place, keyed by the epoch start
/// height and the protocol seed.
pub fn shuffle_candidates(addresses: &mut [Address], epoch_start_height: u64, seed: &[u8]) {
    addresses.sort_by_cached_key(|address| shuffle_weight(seed, epoch_start_height, address));
}

/// Rank addresses by voting power, descending. Equal voting powers are
/// ordered by a hash keyed with the epoch start height, so the same tie
/// resolves differently from one epoch to the next.
pub fn rank_by_votes(votes: &BTreeMap<Address, U256>, epoch_start_height: u64) -> Vec<Address> {
    let mut ranked: Vec<Address> = votes.keys().copied().collect();
    ranked.sort_by(|a, b| {
        votes[b]
            .cmp(&votes[a])
            .then_with(|| tie_break(epoch_start_height, a).cmp(&tie_break(epoch_start_height, b)))
    });
    ranked
}
