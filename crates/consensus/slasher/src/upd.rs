//! Unproductive-Delegate History
//!
//! A bounded ring of the most recent per-epoch unproductive-delegate sets.
//! The ring is persisted in consensus state, so its encoding is canonical:
//! every per-epoch set is stored address-ascending and the retained window is
//! capped by the strike accumulation period.

use crate::errors::{SlasherError, SlasherResult};
use alloy_primitives::Address;
use alloy_rlp::{Decodable, Encodable, RlpDecodable, RlpEncodable};
use std::collections::VecDeque;

/// Bounded ring of per-epoch unproductive-delegate sets, oldest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnproductiveDelegateHistory {
    cache_size: u64,
    epochs: VecDeque<Vec<Address>>,
}

/// RLP shape of the history
#[derive(RlpEncodable, RlpDecodable)]
struct HistoryRepr {
    cache_size: u64,
    epochs: Vec<Vec<Address>>,
}

impl UnproductiveDelegateHistory {
    /// Create an empty history retaining up to `kickout_epoch_period` epochs.
    /// `max_kickout_period` is the protocol hard cap on the window.
    pub fn new(kickout_epoch_period: u64, max_kickout_period: u64) -> SlasherResult<Self> {
        if kickout_epoch_period == 0 || kickout_epoch_period > max_kickout_period {
            return Err(SlasherError::Custom(format!(
                "invalid kick-out period {kickout_epoch_period} (hard cap {max_kickout_period})"
            )));
        }
        Ok(Self {
            cache_size: kickout_epoch_period,
            epochs: VecDeque::new(),
        })
    }

    /// Append the newest per-epoch set, evicting the oldest when the ring is
    /// at capacity. The set is stored address-ascending.
    pub fn push_newest(&mut self, mut set: Vec<Address>) {
        set.sort_unstable();
        if self.epochs.len() as u64 >= self.cache_size {
            self.epochs.pop_front();
        }
        self.epochs.push_back(set);
    }

    /// The oldest retained set; empty when no epoch has been recorded
    pub fn oldest(&self) -> &[Address] {
        self.epochs.front().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Retained per-epoch sets, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &[Address]> {
        self.epochs.iter().map(Vec::as_slice)
    }

    /// All retained addresses across epochs; duplicates preserved
    pub fn flatten(&self) -> impl Iterator<Item = &Address> {
        self.epochs.iter().flatten()
    }

    /// Number of retained epochs
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    /// Whether no epoch is retained
    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Maximum number of retained epochs
    pub fn capacity(&self) -> u64 {
        self.cache_size
    }

    /// Canonical byte encoding
    pub fn serialize(&self) -> Vec<u8> {
        let repr = HistoryRepr {
            cache_size: self.cache_size,
            epochs: self.epochs.iter().cloned().collect(),
        };
        let mut out = Vec::new();
        repr.encode(&mut out);
        out
    }

    /// Decode a history from its canonical encoding
    pub fn deserialize(mut buf: &[u8]) -> alloy_rlp::Result<Self> {
        let repr = HistoryRepr::decode(&mut buf)?;
        if repr.cache_size == 0 || repr.epochs.len() as u64 > repr.cache_size {
            return Err(alloy_rlp::Error::Custom(
                "unproductive-delegate history exceeds its window",
            ));
        }
        Ok(Self {
            cache_size: repr.cache_size,
            epochs: repr.epochs.into(),
        })
    }
}
