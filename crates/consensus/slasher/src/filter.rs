//! Voting-Power Attenuation and Re-ranking
//!
//! Blacklisted candidates keep their place in the election but their voting
//! power is cut by the blacklist's intensity rate before ranking. The
//! attenuated list is a pure function of its inputs: same candidates, same
//! blacklist, same epoch start height, byte-identical output.

use crate::{
    blacklist::Blacklist,
    candidate::{Candidate, CandidateList},
    sort,
};
use alloy_primitives::{Address, U256, U512};
use std::collections::BTreeMap;

/// Cut voting power by `intensity_rate` percent.
///
/// The reference Go node multiplies an arbitrary-precision float copy of the
/// votes by `(100 - rate) / 100` and truncates toward zero. That rounds the
/// product to nearest-even at `max(bit_len(votes), 64)` significant bits
/// before truncating, which diverges from plain integer scaling on rounding
/// boundaries; this reproduces it exactly for cross-client compatibility.
pub fn attenuate_votes(votes: &U256, intensity_rate: u32) -> U256 {
    if intensity_rate == 0 {
        return *votes;
    }
    if intensity_rate >= 100 || votes.is_zero() {
        return U256::ZERO;
    }

    // (100 - rate) / 100 as an f64 is a normal double in (0, 1): decompose
    // into mantissa * 2^exp.
    let multiplier = f64::from(100 - intensity_rate) / 100.0;
    let bits = multiplier.to_bits();
    let mantissa = (bits & ((1u64 << 52) - 1)) | (1u64 << 52);
    let mut exp = (((bits >> 52) & 0x7ff) as i64) - 1075;

    let mut product = U512::from_be_slice(&votes.to_be_bytes::<32>()) * U512::from(mantissa);

    let precision = votes.bit_len().max(64);
    let width = product.bit_len();
    if width > precision {
        let drop = width - precision;
        let mask = (U512::from(1u8) << drop) - U512::from(1u8);
        let half = U512::from(1u8) << (drop - 1);
        let rem = product & mask;
        product >>= drop;
        if rem > half || (rem == half && product.bit(0)) {
            product += U512::from(1u8);
        }
        exp += drop as i64;
    }

    let scaled = if exp >= 0 {
        product << exp as usize
    } else {
        product >> (-exp) as usize
    };
    U256::from_be_slice(&scaled.to_be_bytes::<64>()[32..])
}

/// Re-rank a raw candidate list after applying the blacklist.
///
/// Each blacklisted candidate is attenuated exactly once; the strike count
/// only controls how long the address stays listed, not how hard it is cut.
pub fn filter_candidates(
    candidates: &CandidateList,
    blacklist: &Blacklist,
    epoch_start_height: u64,
) -> CandidateList {
    let mut by_address: BTreeMap<Address, Candidate> = BTreeMap::new();
    let mut voting_power: BTreeMap<Address, U256> = BTreeMap::new();
    for candidate in candidates {
        let mut candidate = candidate.clone();
        if blacklist.contains(&candidate.address) {
            candidate.votes = attenuate_votes(&candidate.votes, blacklist.intensity_rate);
        }
        voting_power.insert(candidate.address, candidate.votes);
        by_address.insert(candidate.address, candidate);
    }
    sort::rank_by_votes(&voting_power, epoch_start_height)
        .into_iter()
        .filter_map(|address| by_address.remove(&address))
        .collect()
}
