//! Turn coordination between a local player and an external mover.
//!
//! Every change to the game, whether it comes from [`TurnCoordinator::apply_move`],
//! [`TurnCoordinator::request_move_now`] or a deferred reply, goes through the same
//! lock around the one [`GameState`]. Waiting on the mover happens outside that lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use kibitz_core::{Board, GameState, is_no_move};

use crate::config::CoordinatorConfig;
use crate::error::{CoordinatorError, MoverError};
use crate::mover::{ExternalMover, Interrupt};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// What became of one request to the external mover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The reply was a legal move and has been played.
    Applied(String),
    /// The reply failed validation; the position is unchanged.
    Rejected(String),
    /// The mover had nothing to play.
    NoMove,
    /// Another move was applied while the mover was thinking; the reply was dropped.
    Stale,
}

struct Shared {
    state: Mutex<GameState>,
    mover: Mutex<Option<Box<dyn ExternalMover>>>,
    /// Reaches the mover while a reply thread holds its lock.
    interrupter: Option<Arc<dyn Interrupt>>,
    /// Cleared by shutdown so no new deferred replies are scheduled.
    engaged: AtomicBool,
    config: CoordinatorConfig,
}

// GameState is never left half-mutated, so a poisoned lock is still usable.
fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn request_reply(&self) -> Result<MoveOutcome, CoordinatorError> {
        let (fen, plies) = {
            let state = lock(&self.state);
            (state.to_fen(), state.plies())
        };

        let reply = {
            let mut mover = lock(&self.mover);
            let mover = mover.as_mut().ok_or(CoordinatorError::NoMover)?;
            mover.request_best_move(&fen)?
        };
        let reply = reply.trim().to_string();

        if is_no_move(&reply) {
            debug!(%fen, "external mover has no move");
            return Ok(MoveOutcome::NoMove);
        }

        let mut state = lock(&self.state);
        if state.plies() != plies {
            warn!(%reply, %fen, "discarding reply to an outdated position");
            return Ok(MoveOutcome::Stale);
        }
        if state.apply_move(&reply) {
            info!(mv = %reply, "external move applied");
            Ok(MoveOutcome::Applied(reply))
        } else {
            warn!(%reply, %fen, "external mover proposed an unplayable move");
            Ok(MoveOutcome::Rejected(reply))
        }
    }
}

/// Owns a game and decides when the external mover gets to move.
///
/// After a submitted move hands the turn to
/// [`CoordinatorConfig::external_side`], the mover is asked for a reply on a
/// background thread once [`CoordinatorConfig::reply_delay`] has passed.
pub struct TurnCoordinator {
    shared: Arc<Shared>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl TurnCoordinator {
    /// A game from the starting position with no external mover.
    pub fn new(config: CoordinatorConfig) -> TurnCoordinator {
        Self::from_state(config, GameState::new().with_clock_policy(config.clock), None)
    }

    /// A game from the starting position against `mover`.
    pub fn with_mover(config: CoordinatorConfig, mover: Box<dyn ExternalMover>) -> TurnCoordinator {
        Self::from_state(
            config,
            GameState::new().with_clock_policy(config.clock),
            Some(mover),
        )
    }

    /// A game continuing from `state`, optionally against `mover`.
    pub fn from_state(
        config: CoordinatorConfig,
        state: GameState,
        mover: Option<Box<dyn ExternalMover>>,
    ) -> TurnCoordinator {
        let engaged = mover.is_some();
        let interrupter = mover.as_ref().and_then(|m| m.interrupter());
        TurnCoordinator {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                mover: Mutex::new(mover),
                interrupter,
                engaged: AtomicBool::new(engaged),
                config,
            }),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// The settings this coordinator was built with.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.shared.config
    }

    /// Validate and apply `token`. Returns `false`, leaving the game untouched,
    /// if the move was rejected.
    ///
    /// When the move passes the turn to the external side, a deferred reply is
    /// scheduled.
    pub fn apply_move(&self, token: &str) -> bool {
        let external_turn = {
            let mut state = lock(&self.shared.state);
            if !state.apply_move(token) {
                return false;
            }
            state.side_to_move() == self.shared.config.external_side
        };

        if external_turn && self.shared.engaged.load(Ordering::Acquire) {
            self.schedule_reply();
        }
        true
    }

    /// Ask the external mover for a move and apply it before returning.
    ///
    /// Mover failures are returned to the caller; the position is unchanged.
    pub fn request_move_now(&self) -> Result<MoveOutcome, CoordinatorError> {
        self.shared.request_reply()
    }

    /// The six-field notation of the current position.
    pub fn position_notation(&self) -> String {
        lock(&self.shared.state).to_fen()
    }

    /// Return `true` if white is to move.
    pub fn is_white_to_move(&self) -> bool {
        lock(&self.shared.state).is_white_to_move()
    }

    /// Return `true` if the side to move is the one the external mover plays.
    pub fn is_external_turn(&self) -> bool {
        lock(&self.shared.state).side_to_move() == self.shared.config.external_side
    }

    /// A copy of the current board.
    pub fn board_snapshot(&self) -> Board {
        lock(&self.shared.state).board().clone()
    }

    /// A copy of the whole game state.
    pub fn state_snapshot(&self) -> GameState {
        lock(&self.shared.state).clone()
    }

    /// Block until every scheduled reply has finished.
    pub fn wait_for_pending(&self) {
        let handles = std::mem::take(&mut *lock(&self.pending));
        for handle in handles {
            if handle.join().is_err() {
                warn!("deferred reply panicked");
            }
        }
    }

    /// Stop scheduling replies, wait for outstanding ones, and close the mover.
    ///
    /// A reply still outstanding after [`CoordinatorConfig::shutdown_grace`] gets
    /// the mover interrupted; one that outlives a second grace period is left
    /// running, and the mover is then closed when that reply lets go of it.
    ///
    /// Calling this again, or on a coordinator that never had a mover, does nothing.
    pub fn shutdown(&self) -> Result<(), MoverError> {
        self.shared.engaged.store(false, Ordering::Release);

        let handles = std::mem::take(&mut *lock(&self.pending));
        let grace = self.shared.config.shutdown_grace;
        if !all_finished_within(&handles, grace) {
            if let Some(interrupter) = &self.shared.interrupter {
                warn!(?grace, "deferred reply still outstanding, interrupting the mover");
                interrupter.interrupt();
                all_finished_within(&handles, grace);
            }
        }
        for handle in handles {
            if !handle.is_finished() {
                warn!("leaving a deferred reply behind");
            } else if handle.join().is_err() {
                warn!("deferred reply panicked");
            }
        }

        let mut slot = match self.shared.mover.try_lock() {
            Ok(slot) => slot,
            Err(TryLockError::Poisoned(err)) => err.into_inner(),
            Err(TryLockError::WouldBlock) => {
                warn!("external mover still busy, it closes once released");
                return Ok(());
            }
        };
        let Some(mut mover) = slot.take() else {
            return Ok(());
        };
        drop(slot);
        info!("closing external mover");
        mover.close()
    }

    fn schedule_reply(&self) {
        let shared = Arc::clone(&self.shared);
        let handle = thread::spawn(move || {
            thread::sleep(shared.config.reply_delay);
            if !shared.engaged.load(Ordering::Acquire) {
                debug!("shut down before the reply was requested");
                return;
            }
            match shared.request_reply() {
                Ok(outcome) => debug!(?outcome, "deferred reply finished"),
                Err(err) => warn!(%err, "deferred reply failed, turn stalls"),
            }
        });

        let mut pending = lock(&self.pending);
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }
}

fn all_finished_within(handles: &[JoinHandle<()>], grace: Duration) -> bool {
    let deadline = Instant::now() + grace;
    loop {
        if handles.iter().all(JoinHandle::is_finished) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

impl Drop for TurnCoordinator {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!(%err, "external mover did not close cleanly");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use kibitz_core::{Color, STARTING_FEN};

    use super::*;

    struct Fixed(&'static str);

    impl ExternalMover for Fixed {
        fn request_best_move(&mut self, _fen: &str) -> Result<String, MoverError> {
            Ok(self.0.to_string())
        }
    }

    fn config() -> CoordinatorConfig {
        CoordinatorConfig {
            reply_delay: Duration::ZERO,
            ..CoordinatorConfig::default()
        }
    }

    #[test]
    fn human_moves_without_mover() {
        let game = TurnCoordinator::new(config());
        assert!(game.apply_move("e2e4"));
        assert!(game.apply_move("e7e5"));
        assert!(!game.apply_move("e4e5"));
        game.wait_for_pending();
        assert!(game.is_white_to_move());
        assert_eq!(
            game.position_notation(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 2 1"
        );
    }

    #[test]
    fn request_without_mover_is_an_error() {
        let game = TurnCoordinator::new(config());
        assert!(matches!(
            game.request_move_now(),
            Err(CoordinatorError::NoMover)
        ));
        assert_eq!(game.position_notation(), STARTING_FEN);
    }

    #[test]
    fn reply_is_trimmed_before_validation() {
        let game = TurnCoordinator::with_mover(config(), Box::new(Fixed(" g1f3\n")));
        assert_eq!(
            game.request_move_now().unwrap(),
            MoveOutcome::Applied("g1f3".to_string())
        );
        assert!(!game.is_white_to_move());
    }

    #[test]
    fn unplayable_reply_is_rejected() {
        let game = TurnCoordinator::with_mover(config(), Box::new(Fixed("e2e5")));
        assert_eq!(
            game.request_move_now().unwrap(),
            MoveOutcome::Rejected("e2e5".to_string())
        );
        assert_eq!(game.position_notation(), STARTING_FEN);
    }

    #[test]
    fn external_turn_follows_config() {
        let game = TurnCoordinator::new(CoordinatorConfig {
            external_side: Color::White,
            ..config()
        });
        assert!(game.is_external_turn());
        assert!(game.apply_move("d2d4"));
        assert!(!game.is_external_turn());
    }

    #[test]
    fn shutdown_skips_a_reply_still_in_its_delay() {
        let game = TurnCoordinator::with_mover(
            CoordinatorConfig {
                reply_delay: Duration::from_millis(50),
                ..config()
            },
            Box::new(Fixed("e7e5")),
        );
        assert!(game.apply_move("e2e4"));
        game.shutdown().unwrap();
        assert!(!game.is_white_to_move());
        assert_eq!(game.state_snapshot().plies(), 1);
    }

    #[test]
    fn shutdown_without_mover_is_fine() {
        let game = TurnCoordinator::new(config());
        game.shutdown().unwrap();
        game.shutdown().unwrap();
    }
}
