//! Kick-out Blacklist
//!
//! The blacklist holds the delegates whose voting power is attenuated for the
//! epoch, each with the number of recent epochs in which it failed the
//! productivity floor. Entries and the unproductive-delegate history encode
//! the same information in different shapes: the history keeps per-epoch sets
//! for windowed eviction, the blacklist precomputes per-address strike counts
//! for O(log n) membership checks during ranking.

use alloy_primitives::Address;
use alloy_rlp::{Decodable, Encodable, RlpDecodable, RlpEncodable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-epoch kick-out blacklist
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blacklist {
    /// Percentage by which a listed candidate's voting power is reduced
    pub intensity_rate: u32,
    /// Listed delegates with their strike counts; never holds a zero count
    pub entries: BTreeMap<Address, u32>,
}

/// RLP shape of a blacklist. Entries are emitted address-ascending (the
/// `BTreeMap` iteration order), which makes the encoding canonical.
#[derive(RlpEncodable, RlpDecodable)]
struct BlacklistRepr {
    intensity_rate: u32,
    entries: Vec<StrikeEntry>,
}

#[derive(RlpEncodable, RlpDecodable)]
struct StrikeEntry {
    address: Address,
    strikes: u32,
}

impl Blacklist {
    /// Create an empty blacklist with the given intensity rate
    pub fn new(intensity_rate: u32) -> Self {
        Self {
            intensity_rate,
            entries: BTreeMap::new(),
        }
    }

    /// Whether the address is currently blacklisted
    pub fn contains(&self, address: &Address) -> bool {
        self.entries.contains_key(address)
    }

    /// Number of listed delegates
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no delegate is listed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical byte encoding
    pub fn serialize(&self) -> Vec<u8> {
        let repr = BlacklistRepr {
            intensity_rate: self.intensity_rate,
            entries: self
                .entries
                .iter()
                .map(|(address, strikes)| StrikeEntry {
                    address: *address,
                    strikes: *strikes,
                })
                .collect(),
        };
        let mut out = Vec::new();
        repr.encode(&mut out);
        out
    }

    /// Decode a blacklist from its canonical encoding
    pub fn deserialize(mut buf: &[u8]) -> alloy_rlp::Result<Self> {
        let repr = BlacklistRepr::decode(&mut buf)?;
        let mut entries = BTreeMap::new();
        for entry in repr.entries {
            if entry.strikes == 0 {
                return Err(alloy_rlp::Error::Custom("zero strike count in blacklist"));
            }
            entries.insert(entry.address, entry.strikes);
        }
        Ok(Self {
            intensity_rate: repr.intensity_rate,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let mut blacklist = Blacklist::new(90);
        blacklist.entries.insert(Address::with_last_byte(3), 2);
        blacklist.entries.insert(Address::with_last_byte(1), 1);

        let decoded = Blacklist::deserialize(&blacklist.serialize()).unwrap();
        assert_eq!(decoded, blacklist);
    }

    #[test]
    fn test_encoding_is_address_ordered() {
        // Insertion order must not leak into the encoding.
        let mut first = Blacklist::new(50);
        first.entries.insert(Address::with_last_byte(9), 1);
        first.entries.insert(Address::with_last_byte(2), 3);

        let mut second = Blacklist::new(50);
        second.entries.insert(Address::with_last_byte(2), 3);
        second.entries.insert(Address::with_last_byte(9), 1);

        assert_eq!(first.serialize(), second.serialize());
    }

    #[test]
    fn test_zero_strike_rejected() {
        let repr = BlacklistRepr {
            intensity_rate: 90,
            entries: vec![StrikeEntry {
                address: Address::with_last_byte(1),
                strikes: 0,
            }],
        };
        let mut bytes = Vec::new();
        repr.encode(&mut bytes);

        assert!(Blacklist::deserialize(&bytes).is_err());
    }

    #[test]
    fn test_contains() {
        let mut blacklist = Blacklist::new(90);
        blacklist.entries.insert(Address::with_last_byte(5), 1);

        assert!(blacklist.contains(&Address::with_last_byte(5)));
        assert!(!blacklist.contains(&Address::with_last_byte(6)));
    }
}
