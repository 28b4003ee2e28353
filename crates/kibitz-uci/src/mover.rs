//! The seam between the coordinator and whatever produces engine moves.

use std::sync::Arc;

use crate::error::MoverError;

/// Something that, given a position, proposes a move for the side to move.
///
/// Replies are raw coordinate tokens (`e7e5`, `a2a1q`) or a no-move sentinel
/// (`(none)`, `0000`); the coordinator validates them like any other move.
pub trait ExternalMover: Send {
    /// Return the best move for the position described by `fen`.
    fn request_best_move(&mut self, fen: &str) -> Result<String, MoverError>;

    /// Release the mover's resources. Must be safe to call more than once.
    fn close(&mut self) -> Result<(), MoverError> {
        Ok(())
    }

    /// A handle that can cut short a request blocked inside
    /// [`request_best_move`](ExternalMover::request_best_move) from another thread.
    fn interrupter(&self) -> Option<Arc<dyn Interrupt>> {
        None
    }
}

/// Aborts an external mover's in-flight request without access to the mover itself.
///
/// After an interrupt the blocked request returns an error; the mover is not
/// expected to answer again.
pub trait Interrupt: Send + Sync {
    fn interrupt(&self);
}
