//! Error types for index construction, configuration and population bookkeeping.

use thiserror::Error;

use super::population::AgentId;

/// Errors raised by the simulation core.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// An index was asked to build over no primitives.
    #[error("cannot build the {0} index from empty geometry")]
    EmptyGeometry(&'static str),

    /// A parameter is outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParams(String),

    /// A controller received an input vector of the wrong length.
    #[error("controller expects {expected} inputs, got {actual}")]
    InputSizeMismatch {
        /// Width of the controller's input layer.
        expected: usize,
        /// Length of the vector that was supplied.
        actual: usize,
    },

    /// An agent id is not part of the live population.
    #[error("agent {0} is not in the live population")]
    UnknownAgent(AgentId),

    /// A restart found neither recorded results nor live agents to select from.
    #[error("no candidates to select a champion from")]
    NoCandidates,

    /// Map loading failed.
    #[error(transparent)]
    Map(#[from] MapError),

    /// Reading or writing a file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file is not valid JSON for [`Params`](super::params::Params).
    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while turning a mesh into track geometry.
#[derive(Debug, Error)]
pub enum MapError {
    /// A line could not be parsed.
    #[error("line {line}: {reason}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A face refers to a vertex that does not exist.
    #[error("face {face} references vertex {vertex}, mesh has {count}")]
    VertexOutOfRange {
        /// Index of the offending face.
        face: usize,
        /// The referenced (0-based) vertex.
        vertex: usize,
        /// Number of vertices in the mesh.
        count: usize,
    },

    /// The mesh has no faces.
    #[error("mesh has no faces")]
    Empty,
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = SimulationError> = std::result::Result<T, E>;
