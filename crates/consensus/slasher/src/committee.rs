//! Committee Selection
//!
//! Block producers are the top-ranked candidates after filtering; the active
//! committee is a deterministic, epoch-rotating shuffle of the producer set.

use crate::{
    candidate::{Candidate, CandidateList},
    sort::{self, CRYPTO_SEED},
};
use alloy_primitives::Address;
use std::collections::BTreeMap;

/// Select block producers from a filtered, ranked candidate list.
///
/// Candidates with zero voting power are hard kick-outs: they are skipped
/// without consuming one of the `max_producers` slots.
pub fn block_producers(candidates: &CandidateList, max_producers: u64) -> CandidateList {
    let mut producers = Vec::new();
    for candidate in candidates {
        if producers.len() as u64 >= max_producers {
            break;
        }
        if candidate.votes.is_zero() {
            continue;
        }
        producers.push(candidate.clone());
    }
    CandidateList(producers)
}

/// Select the active committee for the epoch starting at
/// `epoch_start_height` by deterministically shuffling the producer set and
/// taking the first `num_delegates` entries.
pub fn active_block_producers(
    block_producers: &CandidateList,
    num_delegates: u64,
    epoch_start_height: u64,
) -> CandidateList {
    let mut addresses: Vec<Address> = block_producers.iter().map(|c| c.address).collect();
    let by_address: BTreeMap<Address, &Candidate> = block_producers
        .iter()
        .map(|candidate| (candidate.address, candidate))
        .collect();

    sort::shuffle_candidates(&mut addresses, epoch_start_height, CRYPTO_SEED.as_slice());

    let take = (num_delegates as usize).min(addresses.len());
    if addresses.len() < num_delegates as usize {
        tracing::warn!(
            actual = addresses.len(),
            expected = num_delegates,
            "fewer block producers than the active committee size"
        );
    }

    addresses[..take]
        .iter()
        .filter_map(|address| by_address.get(address).map(|candidate| (*candidate).clone()))
        .collect()
}
