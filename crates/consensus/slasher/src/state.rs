//! Consensus-State Slots
//!
//! The engine owns five durable slots in the consensus state store: the
//! candidate lists and kick-out blacklists for the current and next epochs,
//! plus the unproductive-delegate history. Every slot is tagged with the
//! height at which it was written; readers use the tag to detect an epoch
//! shift racing a query.
//!
//! All reads go through [`StateReader`] and all writes through
//! [`StateMutator`]; the engine never caches across invocations.

use crate::{
    blacklist::Blacklist,
    candidate::CandidateList,
    errors::SlasherResult,
    indexer::CandidateIndexer,
    upd::UnproductiveDelegateHistory,
};

/// Durable slots owned by the slashing engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Candidate list for the current epoch
    CandidatesCurrent,
    /// Candidate list staged for the next epoch
    CandidatesNext,
    /// Kick-out blacklist for the current epoch
    BlacklistCurrent,
    /// Kick-out blacklist staged for the next epoch
    BlacklistNext,
    /// Unproductive-delegate history ring
    UnproductiveDelegates,
}

impl Slot {
    /// Byte key under which the slot is stored
    pub const fn key(self) -> &'static [u8] {
        match self {
            Self::CandidatesCurrent => b"candidates",
            Self::CandidatesNext => b"nextCandidates",
            Self::BlacklistCurrent => b"kickoutList",
            Self::BlacklistNext => b"nextKickoutList",
            Self::UnproductiveDelegates => b"unproductiveDelegates",
        }
    }
}

/// Snapshot-consistent read access to the consensus state store
pub trait StateReader {
    /// Current tip height of the state store
    fn height(&self) -> SlasherResult<u64>;

    /// Slot value together with the height at which it was last written.
    /// Returns [`crate::SlasherError::StateNotFound`] for a slot that has
    /// never been written.
    fn get(&self, slot: Slot) -> SlasherResult<(Vec<u8>, u64)>;
}

/// Write access to the consensus state store. Writes are stamped with the
/// store's current tip height and commit atomically with the enclosing block.
pub trait StateMutator: StateReader {
    /// Write a slot value
    fn put(&mut self, slot: Slot, value: Vec<u8>) -> SlasherResult<()>;
}

/// Read a candidate list slot with its recorded height
pub fn get_candidates<R: StateReader + ?Sized>(
    reader: &R,
    read_from_next: bool,
) -> SlasherResult<(CandidateList, u64)> {
    let slot = if read_from_next {
        Slot::CandidatesNext
    } else {
        Slot::CandidatesCurrent
    };
    let (bytes, height) = reader.get(slot)?;
    Ok((CandidateList::deserialize(&bytes)?, height))
}

/// Read a blacklist slot with its recorded height
pub fn get_kickout_list<R: StateReader + ?Sized>(
    reader: &R,
    read_from_next: bool,
) -> SlasherResult<(Blacklist, u64)> {
    let slot = if read_from_next {
        Slot::BlacklistNext
    } else {
        Slot::BlacklistCurrent
    };
    let (bytes, height) = reader.get(slot)?;
    Ok((Blacklist::deserialize(&bytes)?, height))
}

/// Read the unproductive-delegate history
pub fn get_unproductive_delegates<R: StateReader + ?Sized>(
    reader: &R,
) -> SlasherResult<UnproductiveDelegateHistory> {
    let (bytes, _) = reader.get(Slot::UnproductiveDelegates)?;
    Ok(UnproductiveDelegateHistory::deserialize(&bytes)?)
}

/// Write a candidate list slot
pub fn set_candidates<M: StateMutator + ?Sized>(
    sm: &mut M,
    write_to_next: bool,
    candidates: &CandidateList,
) -> SlasherResult<()> {
    let slot = if write_to_next {
        Slot::CandidatesNext
    } else {
        Slot::CandidatesCurrent
    };
    sm.put(slot, candidates.serialize())
}

/// Write a blacklist slot
pub fn set_kickout_list<M: StateMutator + ?Sized>(
    sm: &mut M,
    write_to_next: bool,
    blacklist: &Blacklist,
) -> SlasherResult<()> {
    let slot = if write_to_next {
        Slot::BlacklistNext
    } else {
        Slot::BlacklistCurrent
    };
    sm.put(slot, blacklist.serialize())
}

/// Persist the blacklist computed for the next epoch, mirroring it into the
/// indexer when one is attached
pub fn set_next_epoch_blacklist<M: StateMutator + ?Sized>(
    sm: &mut M,
    indexer: Option<&CandidateIndexer>,
    epoch_start_height: u64,
    blacklist: &Blacklist,
) -> SlasherResult<()> {
    if let Some(indexer) = indexer {
        indexer.put_kickout_list(epoch_start_height, blacklist.clone());
    }
    set_kickout_list(sm, true, blacklist)
}

/// Persist the unproductive-delegate history
pub fn set_unproductive_delegates<M: StateMutator + ?Sized>(
    sm: &mut M,
    upd: &UnproductiveDelegateHistory,
) -> SlasherResult<()> {
    sm.put(Slot::UnproductiveDelegates, upd.serialize())
}

/// Move the staged next-epoch candidate list into the current slot. Returns
/// the height tag carried by the staged slot.
pub fn shift_candidates<M: StateMutator + ?Sized>(sm: &mut M) -> SlasherResult<u64> {
    let (bytes, height) = sm.get(Slot::CandidatesNext)?;
    sm.put(Slot::CandidatesCurrent, bytes)?;
    Ok(height)
}

/// Move the staged next-epoch blacklist into the current slot. Returns the
/// height tag carried by the staged slot.
pub fn shift_kickout_list<M: StateMutator + ?Sized>(sm: &mut M) -> SlasherResult<u64> {
    let (bytes, height) = sm.get(Slot::BlacklistNext)?;
    sm.put(Slot::BlacklistCurrent, bytes)?;
    Ok(height)
}
