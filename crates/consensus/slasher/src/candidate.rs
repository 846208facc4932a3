//! Delegate Candidates
//!
//! A candidate is a delegate eligible for election, ranked by accumulated
//! voting power. Lists are order-significant: the index of a candidate is its
//! rank, and the canonical RLP encoding preserves that order byte-for-byte.

use alloy_primitives::{Address, Bytes, U256};
use alloy_rlp::{Decodable, RlpDecodable, RlpDecodableWrapper, RlpEncodable, RlpEncodableWrapper};
use serde::{Deserialize, Serialize};

/// A delegate candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, RlpEncodable, RlpDecodable)]
pub struct Candidate {
    /// Delegate address
    pub address: Address,
    /// Accumulated voting power
    pub votes: U256,
    /// Opaque registration payload carried through election unchanged
    pub metadata: Bytes,
}

impl Candidate {
    /// Create a candidate with empty metadata
    pub fn new(address: Address, votes: U256) -> Self {
        Self {
            address,
            votes,
            metadata: Bytes::new(),
        }
    }
}

/// An ordered list of candidates; index defines rank
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    RlpEncodableWrapper,
    RlpDecodableWrapper,
)]
pub struct CandidateList(pub Vec<Candidate>);

impl CandidateList {
    /// Canonical byte encoding of the list
    pub fn serialize(&self) -> Vec<u8> {
        alloy_rlp::encode(self)
    }

    /// Decode a list from its canonical encoding
    pub fn deserialize(mut buf: &[u8]) -> alloy_rlp::Result<Self> {
        Self::decode(&mut buf)
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate candidates in rank order
    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.0.iter()
    }
}

impl FromIterator<Candidate> for CandidateList {
    fn from_iter<T: IntoIterator<Item = Candidate>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for CandidateList {
    type Item = Candidate;
    type IntoIter = std::vec::IntoIter<Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a CandidateList {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
