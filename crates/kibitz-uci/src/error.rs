//! Errors raised while talking to an external engine.

/// Errors that can occur while exchanging messages with an external mover.
#[derive(Debug, thiserror::Error)]
pub enum MoverError {
    /// Reading from or writing to the engine failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The engine closed its output before answering.
    #[error("engine closed its output stream")]
    Closed,

    /// The engine has already been shut down.
    #[error("engine is not running")]
    NotRunning,

    /// The engine sent a line that does not fit the protocol.
    #[error("unexpected engine output: {line}")]
    Protocol {
        /// The offending line.
        line: String,
    },
}

/// Errors surfaced by the synchronous turn-coordination entry points.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// No external mover is attached, or it was already shut down.
    #[error("no external mover attached")]
    NoMover,

    /// The external mover failed to produce a reply.
    #[error("external mover failed: {0}")]
    Mover(#[from] MoverError),
}
