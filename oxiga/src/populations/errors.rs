use super::Handle;
use crate::networks::NetworkError;

use thiserror::Error;

use std::io;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum PopulationError {
    #[error("no individual with handle {0}")]
    UnknownIndividual(Handle),
    #[error("individual {0} is not alive")]
    NotAlive(Handle),
    #[error("expected one input vector per individual ({expected}), found {found}")]
    InputCount { expected: usize, found: usize },
    #[error("{seeds} seed networks do not fit in a population of {size}")]
    TooManySeeds { seeds: usize, size: usize },
    #[error("invalid population config: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error(transparent)]
    Network(#[from] NetworkError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a probability in [0, 1], found {value}")]
    Probability { name: &'static str, value: f32 },
    #[error("selection percent must be at most 100, found {0}")]
    SelectionPercent(u8),
}

/// A failed write of a generation report or saved network.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
