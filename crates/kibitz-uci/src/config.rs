//! Coordinator settings.

use std::time::Duration;

use kibitz_core::{ClockPolicy, Color};

/// How a [`TurnCoordinator`](crate::TurnCoordinator) runs a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// The side the external mover plays.
    pub external_side: Color,
    /// Pause before the external mover is asked to reply to a submitted move.
    pub reply_delay: Duration,
    /// Depth passed to `go depth` when the mover is a UCI engine.
    pub search_depth: u8,
    /// What the halfmove field of the position notation reports.
    pub clock: ClockPolicy,
    /// How long shutdown waits for a deferred reply before interrupting the
    /// mover, and again before leaving the reply thread behind.
    pub shutdown_grace: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            external_side: Color::Black,
            reply_delay: Duration::from_millis(500),
            search_depth: 12,
            clock: ClockPolicy::PlyCount,
            shutdown_grace: Duration::from_secs(2),
        }
    }
}
