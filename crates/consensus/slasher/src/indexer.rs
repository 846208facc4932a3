//! Candidate Indexer
//!
//! Optional read-side store of historical per-epoch election results, keyed
//! by epoch start height. The read path consults it first and falls back to
//! live consensus state when an epoch is missing; it never participates in
//! the state transition itself.

use crate::{
    blacklist::Blacklist,
    candidate::CandidateList,
    errors::{SlasherError, SlasherResult},
};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Historical per-epoch candidate lists and kick-out blacklists
#[derive(Debug, Default)]
pub struct CandidateIndexer {
    candidates: RwLock<BTreeMap<u64, CandidateList>>,
    kickout_lists: RwLock<BTreeMap<u64, Blacklist>>,
}

impl CandidateIndexer {
    /// Create an empty indexer
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the candidate list for the epoch starting at the given height
    pub fn put_candidates(&self, epoch_start_height: u64, candidates: CandidateList) {
        self.candidates
            .write()
            .insert(epoch_start_height, candidates);
    }

    /// Candidate list for the epoch starting at the given height
    pub fn candidate_list(&self, epoch_start_height: u64) -> SlasherResult<CandidateList> {
        self.candidates
            .read()
            .get(&epoch_start_height)
            .cloned()
            .ok_or(SlasherError::IndexerNotFound)
    }

    /// Record the kick-out blacklist for the epoch starting at the given
    /// height
    pub fn put_kickout_list(&self, epoch_start_height: u64, blacklist: Blacklist) {
        self.kickout_lists
            .write()
            .insert(epoch_start_height, blacklist);
    }

    /// Kick-out blacklist for the epoch starting at the given height
    pub fn kickout_list(&self, epoch_start_height: u64) -> SlasherResult<Blacklist> {
        self.kickout_lists
            .read()
            .get(&epoch_start_height)
            .cloned()
            .ok_or(SlasherError::IndexerNotFound)
    }
}
