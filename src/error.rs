//! Error types.
//!
//! The classifier, render queue and controller never fail on model output:
//! every fragment has a defined outcome. Errors exist only at the edges,
//! where configuration is read and where bytes come off a transport.

use std::io;

/// Rejected configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A reasoning marker was configured as the empty string.
    #[error("{which} marker must not be empty")]
    EmptyMarker {
        /// Which marker (`open` or `close`).
        which: &'static str,
    },

    /// The pacer interval was zero.
    #[error("pace interval must be greater than zero")]
    ZeroInterval,

    /// The pacer was configured to reveal nothing per tick.
    #[error("graphemes per tick must be greater than zero")]
    ZeroGraphemes,

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value found in the environment.
        value: String,
    },
}

/// Failure while reading an upstream event stream.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The underlying reader failed.
    #[error("stream read failed: {0}")]
    Io(#[from] io::Error),
}

/// Failure while setting up the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An actor thread could not be spawned.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        /// Thread name.
        name: String,
        /// OS error.
        #[source]
        source: io::Error,
    },
}
