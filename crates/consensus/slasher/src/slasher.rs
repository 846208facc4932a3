//! Slashing Engine
//!
//! The slasher is invoked by the block pipeline at every height. At the last
//! block of an epoch it derives the next epoch's kick-out blacklist from
//! block-production telemetry; at the first block of an epoch it shifts the
//! staged candidate and blacklist slots into place. Read methods serve
//! per-epoch election results, preferring the indexer when one is attached.
//!
//! Everything here is consensus-critical: every node must produce
//! byte-identical lists, so all map iteration that reaches an output goes
//! through the deterministic orderings in [`crate::sort`].

use crate::{
    blacklist::Blacklist,
    candidate::CandidateList,
    committee,
    config::SlasherConfig,
    epoch::{BlockCtx, EpochSchedule, Productivity},
    errors::{SlasherError, SlasherResult},
    filter,
    indexer::CandidateIndexer,
    state::{self, StateMutator, StateReader},
    upd::UnproductiveDelegateHistory,
};
use alloy_primitives::Address;
use std::{collections::BTreeMap, sync::Arc};

/// Candidate lookup serving the legacy, pre-activation view. The engine
/// falls back to it for any epoch that starts below the activation height.
pub type CandidatesByHeight =
    Box<dyn Fn(&dyn StateReader, u64) -> SlasherResult<CandidateList> + Send + Sync>;

/// Read-state method names (wire-stable)
pub mod methods {
    /// Filtered candidate list for an epoch
    pub const CANDIDATES_BY_EPOCH: &[u8] = b"CandidatesByEpoch";
    /// Block producers for an epoch
    pub const BLOCK_PRODUCERS_BY_EPOCH: &[u8] = b"BlockProducersByEpoch";
    /// Active committee for an epoch
    pub const ACTIVE_BLOCK_PRODUCERS_BY_EPOCH: &[u8] = b"ActiveBlockProducersByEpoch";
    /// Kick-out blacklist for an epoch
    pub const KICKOUT_LIST_BY_EPOCH: &[u8] = b"KickoutListByEpoch";
}

/// Productivity-based delegate slashing engine
pub struct Slasher {
    schedule: EpochSchedule,
    config: SlasherConfig,
    candidates_by_height: CandidatesByHeight,
    indexer: Option<Arc<CandidateIndexer>>,
}

impl Slasher {
    /// Create a new slasher
    pub fn new(
        schedule: EpochSchedule,
        config: SlasherConfig,
        candidates_by_height: CandidatesByHeight,
        indexer: Option<Arc<CandidateIndexer>>,
    ) -> Self {
        Self {
            schedule,
            config,
            candidates_by_height,
            indexer,
        }
    }

    /// The slasher configuration
    pub fn config(&self) -> &SlasherConfig {
        &self.config
    }

    /// The epoch schedule
    pub fn schedule(&self) -> EpochSchedule {
        self.schedule
    }

    /// An empty blacklist carrying the configured intensity rate
    pub fn empty_blacklist(&self) -> Blacklist {
        Blacklist::new(self.config.kickout_intensity)
    }

    /// Epoch-boundary state transition, invoked at every block height.
    ///
    /// At the last block of epoch `e`, when the next epoch starts at or
    /// above the activation height, the blacklist for `e + 1` is computed
    /// and staged. At the first block of an active epoch the staged
    /// candidate and blacklist slots are shifted into place; the two shifts
    /// must agree on the staged height tag.
    pub fn create_pre_states(
        &self,
        ctx: &BlockCtx,
        sm: &mut dyn StateMutator,
        productivity: &dyn Productivity,
    ) -> SlasherResult<()> {
        if ctx.height == 0 {
            // The genesis block belongs to no epoch.
            return Ok(());
        }
        let epoch = self.schedule.epoch_of(ctx.height);
        let epoch_start = self.schedule.start_of(epoch);
        let epoch_last = self.schedule.last_of(epoch);
        let next_start = self.schedule.start_of(epoch + 1);

        if ctx.height == epoch_last && self.config.is_active(next_start) {
            let blacklist = self.calculate_kickout_list(ctx, sm, productivity, epoch + 1)?;
            return state::set_next_epoch_blacklist(
                sm,
                self.indexer.as_deref(),
                next_start,
                &blacklist,
            );
        }
        if ctx.height == epoch_start && self.config.is_active(epoch_start) {
            let shifted_candidates = state::shift_candidates(sm)?;
            let shifted_blacklist = state::shift_kickout_list(sm)?;
            if shifted_candidates != shifted_blacklist {
                return Err(SlasherError::InconsistentHeight);
            }
        }
        Ok(())
    }

    /// Compute the kick-out blacklist for `epoch_num` and persist the
    /// updated unproductive-delegate history.
    ///
    /// While the strike window is still filling after activation the
    /// blacklist is re-aggregated from the full history; afterwards it
    /// slides incrementally: the oldest epoch's strikes expire, the freshly
    /// evaluated epoch's strikes are added, and emptied entries are dropped.
    pub fn calculate_kickout_list(
        &self,
        ctx: &BlockCtx,
        sm: &mut dyn StateMutator,
        productivity: &dyn Productivity,
        epoch_num: u64,
    ) -> SlasherResult<Blacklist> {
        let activation_epoch = self.config.activation_epoch(self.schedule);
        let mut upd = match state::get_unproductive_delegates(&*sm) {
            Ok(upd) => upd,
            Err(SlasherError::StateNotFound(_)) => UnproductiveDelegateHistory::new(
                self.config.kickout_epoch_period,
                self.config.max_kickout_period,
            )?,
            Err(err) => return Err(err),
        };

        if epoch_num <= activation_epoch + self.config.kickout_epoch_period {
            tracing::debug!(
                epoch = epoch_num,
                activation_epoch,
                window = self.config.kickout_epoch_period,
                "aggregating kick-out blacklist from the full history"
            );
            let mut entries: BTreeMap<Address, u32> = BTreeMap::new();
            for epoch_set in upd.iter() {
                for address in epoch_set {
                    *entries.entry(*address).or_insert(0) += 1;
                }
            }
            let unproductive = {
                let sr: &dyn StateReader = &*sm;
                self.unproductive_delegates_by_epoch(ctx, sr, productivity, epoch_num - 1)?
            };
            for address in &unproductive {
                *entries.entry(*address).or_insert(0) += 1;
            }
            upd.push_newest(unproductive);
            state::set_unproductive_delegates(sm, &upd)?;
            return Ok(Blacklist {
                intensity_rate: self.config.kickout_intensity,
                entries,
            });
        }

        // blacklist[n] = blacklist[n-1] - unproductive[n-K-1] + unproductive[n-1]
        tracing::debug!(
            epoch = epoch_num,
            activation_epoch,
            window = self.config.kickout_epoch_period,
            "sliding kick-out blacklist window"
        );
        let previous = match state::get_kickout_list(&*sm, false) {
            Ok((blacklist, _)) => blacklist,
            Err(SlasherError::StateNotFound(_)) => self.empty_blacklist(),
            Err(err) => return Err(err),
        };
        let mut entries = previous.entries;

        let expiring: Vec<Address> = upd.oldest().to_vec();
        for address in &expiring {
            match entries.get_mut(address) {
                Some(strikes) => *strikes -= 1,
                None => {
                    // The persisted blacklist no longer matches the history
                    // window; continuing would fork the chain.
                    tracing::error!(
                        address = %address,
                        "expiring unproductive delegate missing from the blacklist"
                    );
                    panic!("kick-out blacklist diverged from the unproductive-delegate history");
                }
            }
        }

        let unproductive = {
            let sr: &dyn StateReader = &*sm;
            self.unproductive_delegates_by_epoch(ctx, sr, productivity, epoch_num - 1)?
        };
        upd.push_newest(unproductive.clone());
        for address in &unproductive {
            *entries.entry(*address).or_insert(0) += 1;
        }
        entries.retain(|_, strikes| *strikes != 0);

        state::set_unproductive_delegates(sm, &upd)?;
        Ok(Blacklist {
            intensity_rate: self.config.kickout_intensity,
            entries,
        })
    }

    /// Delegates of the active committee that failed the productivity floor
    /// in `epoch_num`. The emitted list is address-ascending.
    fn unproductive_delegates_by_epoch(
        &self,
        ctx: &BlockCtx,
        sr: &dyn StateReader,
        productivity: &dyn Productivity,
        epoch_num: u64,
    ) -> SlasherResult<Vec<Address>> {
        let committee = self.get_active_block_producers(sr, false)?;
        let (mut num_blocks, mut produced) =
            self.schedule
                .productivity_by_epoch(epoch_num, ctx.tip_height, productivity)?;

        // The block being processed is not part of telemetry yet.
        num_blocks += 1;
        *produced.entry(ctx.producer).or_insert(0) += 1;

        // A committee member absent from telemetry was silent, not perfect.
        for delegate in &committee {
            produced.entry(delegate.address).or_insert(0);
        }

        let expected = num_blocks / produced.len() as u64;
        if expected == 0 {
            tracing::debug!(epoch = epoch_num, num_blocks, "epoch too short to judge productivity");
            return Ok(Vec::new());
        }

        let mut unproductive = Vec::new();
        for (address, sealed) in &produced {
            if sealed * 100 / expected < self.config.prod_threshold {
                unproductive.push(*address);
            }
        }
        Ok(unproductive)
    }

    /// Filtered candidate list for the current (or next) epoch.
    ///
    /// Below the activation height the legacy lookup serves the raw list;
    /// afterwards the staged slots are read and the blacklist attenuation
    /// and re-ranking are applied.
    pub fn get_candidates(
        &self,
        sr: &dyn StateReader,
        read_from_next: bool,
    ) -> SlasherResult<CandidateList> {
        let mut target_epoch = self.schedule.epoch_of(sr.height()?);
        if read_from_next {
            target_epoch += 1;
        }
        let target_start = self.schedule.start_of(target_epoch);
        if !self.config.is_active(target_start) {
            return (self.candidates_by_height)(sr, target_start);
        }
        let (candidates, state_height) = state::get_candidates(sr, read_from_next)?;
        // A shift committed mid-query moves the slot to a newer epoch.
        if target_epoch < self.schedule.epoch_of(state_height) {
            return Err(SlasherError::InconsistentHeight);
        }
        let blacklist = self.get_kickout_list(sr, read_from_next)?;
        Ok(filter::filter_candidates(
            &candidates,
            &blacklist,
            target_start,
        ))
    }

    /// Block producers for the current (or next) epoch
    pub fn get_block_producers(
        &self,
        sr: &dyn StateReader,
        read_from_next: bool,
    ) -> SlasherResult<CandidateList> {
        let candidates = self.get_candidates(sr, read_from_next)?;
        Ok(committee::block_producers(
            &candidates,
            self.config.num_candidate_delegates,
        ))
    }

    /// Active committee for the current (or next) epoch
    pub fn get_active_block_producers(
        &self,
        sr: &dyn StateReader,
        read_from_next: bool,
    ) -> SlasherResult<CandidateList> {
        let mut target_epoch = self.schedule.epoch_of(sr.height()?);
        if read_from_next {
            target_epoch += 1;
        }
        let target_start = self.schedule.start_of(target_epoch);
        let producers = self.get_block_producers(sr, read_from_next)?;
        Ok(committee::active_block_producers(
            &producers,
            self.config.num_delegates,
            target_start,
        ))
    }

    /// Kick-out blacklist for the current (or next) epoch
    pub fn get_kickout_list(
        &self,
        sr: &dyn StateReader,
        read_from_next: bool,
    ) -> SlasherResult<Blacklist> {
        let mut target_epoch = self.schedule.epoch_of(sr.height()?);
        if read_from_next {
            target_epoch += 1;
        }
        let target_start = self.schedule.start_of(target_epoch);
        if !self.config.is_active(target_start) {
            return Err(SlasherError::BlacklistNotActivated);
        }
        let (blacklist, state_height) = state::get_kickout_list(sr, read_from_next)?;
        if target_epoch < self.schedule.epoch_of(state_height) {
            return Err(SlasherError::InconsistentHeight);
        }
        Ok(blacklist)
    }

    /// Filtered candidate list for the epoch starting at the given height,
    /// served from the indexer
    pub fn candidates_from_indexer(&self, epoch_start_height: u64) -> SlasherResult<CandidateList> {
        let indexer = self.indexer.as_ref().ok_or(SlasherError::IndexerNotFound)?;
        let candidates = indexer.candidate_list(epoch_start_height)?;
        if !self.config.is_active(epoch_start_height) {
            return Ok(candidates);
        }
        let blacklist = indexer.kickout_list(epoch_start_height)?;
        Ok(filter::filter_candidates(
            &candidates,
            &blacklist,
            epoch_start_height,
        ))
    }

    /// Block producers for the epoch starting at the given height, served
    /// from the indexer
    pub fn block_producers_from_indexer(
        &self,
        epoch_start_height: u64,
    ) -> SlasherResult<CandidateList> {
        let candidates = self.candidates_from_indexer(epoch_start_height)?;
        Ok(committee::block_producers(
            &candidates,
            self.config.num_candidate_delegates,
        ))
    }

    /// Active committee for the epoch starting at the given height, served
    /// from the indexer
    pub fn active_block_producers_from_indexer(
        &self,
        epoch_start_height: u64,
    ) -> SlasherResult<CandidateList> {
        let producers = self.block_producers_from_indexer(epoch_start_height)?;
        Ok(committee::active_block_producers(
            &producers,
            self.config.num_delegates,
            epoch_start_height,
        ))
    }

    /// Serve a read-state method.
    ///
    /// The optional first argument is a big-endian epoch number; without it
    /// the epoch of the current tip is served. When an indexer is attached
    /// it is consulted first, and only an indexer miss falls through to live
    /// consensus state.
    pub fn read_state(
        &self,
        sr: &dyn StateReader,
        method: &[u8],
        args: &[&[u8]],
    ) -> SlasherResult<Vec<u8>> {
        let mut epoch_start = self.schedule.start_of(self.schedule.epoch_of(sr.height()?));
        if let Some(raw) = args.first() {
            let bytes: [u8; 8] = (*raw)
                .try_into()
                .map_err(|_| SlasherError::MalformedArgument)?;
            epoch_start = self.schedule.start_of(u64::from_be_bytes(bytes));
        }

        match method {
            methods::CANDIDATES_BY_EPOCH => {
                if self.indexer.is_some() {
                    match self.candidates_from_indexer(epoch_start) {
                        Ok(candidates) => return Ok(candidates.serialize()),
                        Err(SlasherError::IndexerNotFound) => {}
                        Err(err) => return Err(err),
                    }
                }
                Ok(self.get_candidates(sr, false)?.serialize())
            }
            methods::BLOCK_PRODUCERS_BY_EPOCH => {
                if self.indexer.is_some() {
                    match self.block_producers_from_indexer(epoch_start) {
                        Ok(producers) => return Ok(producers.serialize()),
                        Err(SlasherError::IndexerNotFound) => {}
                        Err(err) => return Err(err),
                    }
                }
                Ok(self.get_block_producers(sr, false)?.serialize())
            }
            methods::ACTIVE_BLOCK_PRODUCERS_BY_EPOCH => {
                if self.indexer.is_some() {
                    match self.active_block_producers_from_indexer(epoch_start) {
                        Ok(committee) => return Ok(committee.serialize()),
                        Err(SlasherError::IndexerNotFound) => {}
                        Err(err) => return Err(err),
                    }
                }
                Ok(self.get_active_block_producers(sr, false)?.serialize())
            }
            methods::KICKOUT_LIST_BY_EPOCH => {
                if let Some(indexer) = &self.indexer {
                    match indexer.kickout_list(epoch_start) {
                        Ok(blacklist) => return Ok(blacklist.serialize()),
                        Err(SlasherError::IndexerNotFound) => {}
                        Err(err) => return Err(err),
                    }
                }
                Ok(self.get_kickout_list(sr, false)?.serialize())
            }
            _ => Err(SlasherError::UnknownMethod(
                String::from_utf8_lossy(method).into_owned(),
            )),
        }
    }
}

impl std::fmt::Debug for Slasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slasher")
            .field("schedule", &self.schedule)
            .field("config", &self.config)
            .field("has_indexer", &self.indexer.is_some())
            .finish()
    }
}
