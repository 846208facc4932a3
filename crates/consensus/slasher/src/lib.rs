//! Roll-DPoS Delegate Slashing and Kick-out Engine
//!
//! At the close of every epoch this engine ranks candidate delegates,
//! selects block producers and the active rotating committee for the next
//! epoch, and maintains a windowed blacklist that attenuates the voting
//! power of delegates who failed the productivity floor.
//!
//! ## Architecture
//!
//! - [`Slasher`] - Epoch-boundary state transition and read path
//! - [`SlasherConfig`] - Consensus-critical slashing parameters
//! - [`Blacklist`] / [`UnproductiveDelegateHistory`] - Strike bookkeeping
//! - [`EpochSchedule`] - Roll-DPoS epoch arithmetic and telemetry windows
//! - `state` - Durable slot layout over the consensus state store
//! - `committee` / `filter` / `sort` - Deterministic election pipeline

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod blacklist;
mod candidate;
pub mod committee;
mod config;
mod epoch;
mod errors;
pub mod filter;
mod indexer;
mod slasher;
pub mod sort;
pub mod state;
mod upd;

#[doc(hidden)]
pub mod tests;

pub use blacklist::Blacklist;
pub use candidate::{Candidate, CandidateList};
pub use config::SlasherConfig;
pub use epoch::{BlockCtx, EpochSchedule, Productivity};
pub use errors::{SlasherError, SlasherResult};
pub use indexer::CandidateIndexer;
pub use slasher::{methods, CandidatesByHeight, Slasher};
pub use state::{Slot, StateMutator, StateReader};
pub use upd::UnproductiveDelegateHistory;

/// Default protocol parameters
pub mod constants {
    /// Default number of block producers elected per epoch
    pub const DEFAULT_NUM_CANDIDATE_DELEGATES: u64 = 36;

    /// Default active committee size
    pub const DEFAULT_NUM_DELEGATES: u64 = 24;

    /// Default number of sub-epochs per epoch
    pub const DEFAULT_NUM_SUB_EPOCHS: u64 = 30;

    /// Default productivity floor in percent
    pub const DEFAULT_PRODUCTIVITY_THRESHOLD: u64 = 85;

    /// Default strike accumulation window in epochs
    pub const DEFAULT_KICKOUT_EPOCH_PERIOD: u64 = 6;

    /// Default hard cap on the unproductive-delegate history
    pub const DEFAULT_MAX_KICKOUT_PERIOD: u64 = 12;

    /// Default voting-power reduction in percent
    pub const DEFAULT_KICKOUT_INTENSITY: u32 = 90;
}
