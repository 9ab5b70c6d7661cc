use super::Topology;

use thiserror::Error;

/// Errors raised while building, evaluating, breeding
/// or decoding a [`Network`](super::Network).
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The input vector has the wrong length.
    #[error("expected {expected} inputs, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
    /// Two genomes taking part in the same operation
    /// do not share a topology.
    #[error("topology mismatch: expected {expected}, found {found}")]
    TopologyMismatch { expected: Topology, found: Topology },
    /// Explicit network parts do not describe a consistent layer chain.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),
    /// A persisted network record could not be parsed.
    #[error("malformed network record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },
}

impl NetworkError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> NetworkError {
        NetworkError::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }
}
