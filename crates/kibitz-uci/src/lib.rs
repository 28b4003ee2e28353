//! External engines for kibitz: the UCI adapter and the turn coordinator.

pub mod command;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod mover;

pub use config::CoordinatorConfig;
pub use coordinator::{MoveOutcome, TurnCoordinator};
pub use engine::{UciProcess, UciSession};
pub use error::{CoordinatorError, MoverError};
pub use mover::{ExternalMover, Interrupt};
