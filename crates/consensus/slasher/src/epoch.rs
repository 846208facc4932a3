//! Roll-DPoS Epoch Arithmetic
//!
//! Epochs are fixed-length ranges of block heights over which one active
//! committee produces blocks. Heights are 1-based; the genesis block at
//! height 0 belongs to epoch 0, which has no producing committee.

use crate::errors::{SlasherError, SlasherResult};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Block-production telemetry consumed by the productivity evaluator
pub trait Productivity {
    /// Number of blocks each delegate sealed in the inclusive height range.
    /// Delegates that sealed nothing may be absent from the map.
    fn produced(&self, start_height: u64, end_height: u64) -> SlasherResult<BTreeMap<Address, u64>>;
}

/// Context of the block currently moving through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockCtx {
    /// Height of the block being processed
    pub height: u64,
    /// Address that sealed the block being processed
    pub producer: Address,
    /// Height of the committed chain tip; the block being processed is not
    /// part of telemetry yet
    pub tip_height: u64,
}

/// Fixed-length epoch schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSchedule {
    num_delegates: u64,
    num_sub_epochs: u64,
}

impl EpochSchedule {
    /// Create a schedule of `num_delegates * num_sub_epochs` blocks per epoch.
    /// Both factors must be non-zero.
    pub fn new(num_delegates: u64, num_sub_epochs: u64) -> Self {
        debug_assert!(num_delegates > 0 && num_sub_epochs > 0);
        Self {
            num_delegates,
            num_sub_epochs,
        }
    }

    /// Blocks per epoch
    pub fn blocks_per_epoch(&self) -> u64 {
        self.num_delegates * self.num_sub_epochs
    }

    /// Epoch containing the given height
    pub fn epoch_of(&self, height: u64) -> u64 {
        if height == 0 {
            return 0;
        }
        (height - 1) / self.blocks_per_epoch() + 1
    }

    /// First height of the given epoch
    pub fn start_of(&self, epoch: u64) -> u64 {
        if epoch == 0 {
            return 0;
        }
        (epoch - 1) * self.blocks_per_epoch() + 1
    }

    /// Last height of the given epoch
    pub fn last_of(&self, epoch: u64) -> u64 {
        epoch * self.blocks_per_epoch()
    }

    /// Block counts for the given epoch as far as telemetry has seen it.
    ///
    /// Returns the number of blocks in the queried range together with the
    /// per-delegate production counts. For the epoch containing the tip the
    /// range ends at the tip, not at the epoch's last height.
    pub fn productivity_by_epoch(
        &self,
        epoch: u64,
        tip_height: u64,
        source: &dyn Productivity,
    ) -> SlasherResult<(u64, BTreeMap<Address, u64>)> {
        let tip_epoch = self.epoch_of(tip_height);
        if epoch == 0 || epoch > tip_epoch {
            return Err(SlasherError::Telemetry(format!(
                "epoch {epoch} outside the telemetry range (tip epoch {tip_epoch})"
            )));
        }
        let start = self.start_of(epoch);
        let end = if epoch == tip_epoch {
            tip_height
        } else {
            self.last_of(epoch)
        };
        let produced = source.produced(start, end)?;
        Ok((end - start + 1, produced))
    }
}
