//! Test helper utilities for the slashing engine
//!
//! Provides an in-memory consensus state store, a per-height block-producer
//! log backing the productivity telemetry, candidate fixtures and a small
//! chain driver that feeds the engine the way the block pipeline would.

use crate::{
    candidate::{Candidate, CandidateList},
    epoch::{BlockCtx, EpochSchedule, Productivity},
    errors::{SlasherError, SlasherResult},
    indexer::CandidateIndexer,
    slasher::{CandidatesByHeight, Slasher},
    state::{self, Slot, StateMutator, StateReader},
    SlasherConfig,
};
use alloy_primitives::{Address, U256};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// In-memory consensus state store stamping writes with its tip height
#[derive(Debug, Default)]
pub struct MemoryState {
    height: u64,
    slots: HashMap<Slot, (Vec<u8>, u64)>,
}

impl MemoryState {
    /// Create an empty store at height 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the store's tip to the given height
    pub fn set_height(&mut self, height: u64) {
        self.height = height;
    }
}

impl StateReader for MemoryState {
    fn height(&self) -> SlasherResult<u64> {
        Ok(self.height)
    }

    fn get(&self, slot: Slot) -> SlasherResult<(Vec<u8>, u64)> {
        self.slots
            .get(&slot)
            .cloned()
            .ok_or(SlasherError::StateNotFound(slot))
    }
}

impl StateMutator for MemoryState {
    fn put(&mut self, slot: Slot, value: Vec<u8>) -> SlasherResult<()> {
        self.slots.insert(slot, (value, self.height));
        Ok(())
    }
}

/// Per-height block-producer log backing the productivity telemetry
#[derive(Debug, Default)]
pub struct ProducerLog {
    blocks: Mutex<BTreeMap<u64, Address>>,
}

impl ProducerLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the producer of a block
    pub fn record(&self, height: u64, producer: Address) {
        self.blocks.lock().insert(height, producer);
    }
}

impl Productivity for ProducerLog {
    fn produced(
        &self,
        start_height: u64,
        end_height: u64,
    ) -> SlasherResult<BTreeMap<Address, u64>> {
        let blocks = self.blocks.lock();
        let mut out = BTreeMap::new();
        for (_, producer) in blocks.range(start_height..=end_height) {
            *out.entry(*producer).or_insert(0) += 1;
        }
        Ok(out)
    }
}

/// A candidate with the given address byte and vote count
pub fn candidate(last_byte: u8, votes: u64) -> Candidate {
    Candidate::new(Address::with_last_byte(last_byte), U256::from(votes))
}

/// A candidate list from `(address byte, votes)` pairs, in the given order
pub fn candidate_list(specs: &[(u8, u64)]) -> CandidateList {
    specs
        .iter()
        .map(|(byte, votes)| candidate(*byte, *votes))
        .collect()
}

/// A legacy candidates-by-height lookup serving a fixed list
pub fn legacy_candidates(list: CandidateList) -> CandidatesByHeight {
    Box::new(move |_, _| Ok(list.clone()))
}

/// Drives a slasher through block heights the way the block pipeline would.
///
/// `raw_candidates` stands in for the external vote tally: it is staged into
/// the next-epoch candidate slot at the last block of every epoch, and also
/// serves the legacy pre-activation view.
pub struct TestChain {
    pub slasher: Slasher,
    pub state: MemoryState,
    pub telemetry: ProducerLog,
    pub schedule: EpochSchedule,
    pub raw_candidates: CandidateList,
}

impl TestChain {
    /// Create a chain with the given config, schedule and raw candidates
    pub fn new(config: SlasherConfig, schedule: EpochSchedule, raw_candidates: CandidateList) -> Self {
        Self::with_indexer(config, schedule, raw_candidates, None)
    }

    /// Same as [`TestChain::new`] with an indexer attached to the engine
    pub fn with_indexer(
        config: SlasherConfig,
        schedule: EpochSchedule,
        raw_candidates: CandidateList,
        indexer: Option<Arc<CandidateIndexer>>,
    ) -> Self {
        let slasher = Slasher::new(
            schedule,
            config,
            legacy_candidates(raw_candidates.clone()),
            indexer,
        );
        Self {
            slasher,
            state: MemoryState::new(),
            telemetry: ProducerLog::new(),
            schedule,
            raw_candidates,
        }
    }

    /// Process a single block: advance the store, stage candidates at epoch
    /// ends, run the epoch-boundary transition, then commit the block to
    /// telemetry.
    pub fn process_block(&mut self, height: u64, producer: Address) -> SlasherResult<()> {
        self.state.set_height(height);
        let epoch = self.schedule.epoch_of(height);
        if height == self.schedule.last_of(epoch) {
            let staged = self.raw_candidates.clone();
            state::set_candidates(&mut self.state, true, &staged)?;
        }
        let ctx = BlockCtx {
            height,
            producer,
            tip_height: height - 1,
        };
        self.slasher
            .create_pre_states(&ctx, &mut self.state, &self.telemetry)?;
        self.telemetry.record(height, producer);
        Ok(())
    }

    /// Process every block of an epoch, rotating over `producers`
    pub fn run_epoch(&mut self, epoch: u64, producers: &[Address]) -> SlasherResult<()> {
        let start = self.schedule.start_of(epoch);
        let last = self.schedule.last_of(epoch);
        for height in start..=last {
            let producer = producers[((height - start) as usize) % producers.len()];
            self.process_block(height, producer)?;
        }
        Ok(())
    }
}
