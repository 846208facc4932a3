//! Slashing Engine Errors

use crate::state::Slot;

/// Slasher-specific error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlasherError {
    /// A shift moved consensus state to a newer epoch while a query was in
    /// flight, or the candidate and blacklist shifts disagreed on heights.
    /// Recoverable by retrying the query.
    #[error("state moved to a newer epoch during the operation")]
    InconsistentHeight,

    /// The slot has never been written.
    #[error("state slot {0:?} has never been written")]
    StateNotFound(Slot),

    /// The kick-out blacklist was queried for an epoch that starts before the
    /// slashing activation height.
    #[error("no kick-out blacklist exists before the slashing activation height")]
    BlacklistNotActivated,

    /// Block-production telemetry could not serve the requested range.
    #[error("telemetry failure: {0}")]
    Telemetry(String),

    /// Unrecognized read-state method name.
    #[error("unknown read method {0}")]
    UnknownMethod(String),

    /// The requested epoch is not present in the candidate indexer.
    #[error("epoch is not indexed")]
    IndexerNotFound,

    /// A read-state argument did not decode as a big-endian epoch number.
    #[error("malformed read-state argument")]
    MalformedArgument,

    /// A persisted slot failed to decode.
    #[error("decode error: {0}")]
    Decode(#[from] alloy_rlp::Error),

    /// Custom error message
    #[error("{0}")]
    Custom(String),
}

/// Result type for slasher operations
pub type SlasherResult<T> = Result<T, SlasherError>;
