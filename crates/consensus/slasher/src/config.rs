//! Slasher Configuration Types

use crate::{constants, epoch::EpochSchedule};
use serde::{Deserialize, Serialize};

/// Slashing engine configuration.
///
/// All parameters are consensus-critical and immutable after construction;
/// every full node must run with identical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlasherConfig {
    /// Maximum number of block producers elected per epoch (top-N cutoff)
    pub num_candidate_delegates: u64,

    /// Size of the active rotating committee per epoch
    pub num_delegates: u64,

    /// Productivity percentage floor; a delegate producing strictly less than
    /// this share of its expected blocks is unproductive for the epoch
    pub prod_threshold: u64,

    /// Number of epochs over which productivity strikes accumulate
    pub kickout_epoch_period: u64,

    /// Hard cap on the unproductive-delegate history retained across restarts
    pub max_kickout_period: u64,

    /// Percentage by which a blacklisted candidate's voting power is reduced
    pub kickout_intensity: u32,

    /// Height at which productivity-based slashing activates. Below this
    /// height the legacy candidate view is served and no blacklist exists.
    /// Zero means active from genesis; callers are then responsible for
    /// bootstrapping the initial candidate and blacklist slots.
    pub activation_height: u64,
}

impl Default for SlasherConfig {
    fn default() -> Self {
        Self {
            num_candidate_delegates: constants::DEFAULT_NUM_CANDIDATE_DELEGATES,
            num_delegates: constants::DEFAULT_NUM_DELEGATES,
            prod_threshold: constants::DEFAULT_PRODUCTIVITY_THRESHOLD,
            kickout_epoch_period: constants::DEFAULT_KICKOUT_EPOCH_PERIOD,
            max_kickout_period: constants::DEFAULT_MAX_KICKOUT_PERIOD,
            kickout_intensity: constants::DEFAULT_KICKOUT_INTENSITY,
            activation_height: 0,
        }
    }
}

impl SlasherConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the block-producer cutoff
    pub fn with_num_candidate_delegates(mut self, count: u64) -> Self {
        self.num_candidate_delegates = count;
        self
    }

    /// Set the active committee size
    pub fn with_num_delegates(mut self, count: u64) -> Self {
        self.num_delegates = count;
        self
    }

    /// Set the productivity threshold percentage
    pub fn with_prod_threshold(mut self, threshold: u64) -> Self {
        self.prod_threshold = threshold;
        self
    }

    /// Set the strike accumulation window in epochs
    pub fn with_kickout_epoch_period(mut self, period: u64) -> Self {
        self.kickout_epoch_period = period;
        self
    }

    /// Set the history hard cap in epochs
    pub fn with_max_kickout_period(mut self, period: u64) -> Self {
        self.max_kickout_period = period;
        self
    }

    /// Set the voting-power reduction percentage
    pub fn with_kickout_intensity(mut self, intensity: u32) -> Self {
        self.kickout_intensity = intensity;
        self
    }

    /// Set the slashing activation height
    pub fn with_activation_height(mut self, height: u64) -> Self {
        self.activation_height = height;
        self
    }

    /// Check whether slashing is active at the given height
    pub fn is_active(&self, height: u64) -> bool {
        height >= self.activation_height
    }

    /// The epoch containing the activation height
    pub fn activation_epoch(&self, schedule: EpochSchedule) -> u64 {
        schedule.epoch_of(self.activation_height)
    }
}
