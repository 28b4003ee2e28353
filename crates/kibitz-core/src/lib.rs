//! Chess rules and state core: board, piece movement, move tokens, and position notation.

mod board;
mod castle_rights;
mod color;
mod error;
mod fen;
mod game_state;
mod move_token;
mod piece;
mod piece_kind;
mod square;

pub use board::{Board, PrettyBoard};
pub use castle_rights::{CastleRights, CastleSide};
pub use color::Color;
pub use error::{BoardError, DecodeError, FenError, MoveRejection};
pub use fen::STARTING_FEN;
pub use game_state::{ClockPolicy, GameState};
pub use move_token::{MoveToken, NO_MOVE, NULL_MOVE, is_no_move};
pub use piece::{Piece, PieceId};
pub use piece_kind::PieceKind;
pub use square::Square;
