//! Error types for move decoding, move rejection and position parsing.

use crate::piece::Piece;
use crate::square::Square;

/// A move token that cannot be turned into coordinates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The token is empty.
    #[error("empty move token")]
    Empty,
    /// The token is not 4 or 5 characters long.
    #[error("move token has {len} characters, expected 4 or 5")]
    WrongLength {
        /// Number of characters found.
        len: usize,
    },
    /// A file character outside `a..h`.
    #[error("invalid file character: '{character}'")]
    InvalidFile {
        /// The offending character.
        character: char,
    },
    /// A rank character outside `1..8`.
    #[error("invalid rank character: '{character}'")]
    InvalidRank {
        /// The offending character.
        character: char,
    },
    /// A promotion letter other than `q`, `r`, `b` or `n`.
    #[error("invalid promotion character: '{character}'")]
    InvalidPromotion {
        /// The offending character.
        character: char,
    },
}

/// Why a submitted move was not applied.
///
/// Rejections never escape [`GameState::apply_move`](crate::GameState::apply_move);
/// they exist so the reason can be logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    /// The token was empty.
    #[error("empty move token")]
    EmptyToken,
    /// The token could not be decoded.
    #[error("undecodable move token: {0}")]
    Decode(#[from] DecodeError),
    /// The token was a "no move available" sentinel.
    #[error("no-move sentinel is not a move")]
    NoMoveToken,
    /// Nothing stands on the source square.
    #[error("no piece on {square}")]
    EmptySource {
        /// The empty source square.
        square: Square,
    },
    /// The piece's movement pattern does not reach the destination.
    #[error("{piece} cannot move from {from} to {to}")]
    IllegalGeometry {
        /// The piece that was asked to move.
        piece: Piece,
        /// Source square.
        from: Square,
        /// Destination square.
        to: Square,
    },
}

/// Errors that occur when parsing a FEN string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    /// The FEN string does not have exactly 6 space-separated fields.
    #[error("expected 6 FEN fields, found {found}")]
    WrongFieldCount {
        /// Number of fields found.
        found: usize,
    },
    /// The piece placement section does not have exactly 8 ranks.
    #[error("expected 8 ranks in piece placement, found {found}")]
    WrongRankCount {
        /// Number of ranks found.
        found: usize,
    },
    /// A rank in the piece placement describes more or fewer than 8 squares.
    #[error("rank {rank_index} describes {length} squares, expected 8")]
    BadRankLength {
        /// Zero-based rank index (0 = rank 8 in FEN, 7 = rank 1).
        rank_index: usize,
        /// Number of squares described.
        length: usize,
    },
    /// An unrecognized character appeared in the piece placement.
    #[error("invalid piece character: '{character}'")]
    InvalidPieceChar {
        /// The invalid character.
        character: char,
    },
    /// The active color field is not "w" or "b".
    #[error("invalid active color: \"{found}\"")]
    InvalidColor {
        /// The invalid color string.
        found: String,
    },
    /// An unrecognized character appeared in the castling rights field.
    #[error("invalid castling character: '{character}'")]
    InvalidCastlingChar {
        /// The invalid character.
        character: char,
    },
    /// The en passant field is not "-" or a valid algebraic square.
    #[error("invalid en passant square: \"{found}\"")]
    InvalidEnPassant {
        /// The invalid en passant string.
        found: String,
    },
    /// A move counter is not a valid non-negative number.
    #[error("invalid {field}: \"{found}\"")]
    InvalidMoveCounter {
        /// The field name ("halfmove clock" or "fullmove number").
        field: &'static str,
        /// The invalid string.
        found: String,
    },
    /// The parsed placement fails structural validation.
    #[error("invalid board: {source}")]
    InvalidBoard {
        /// The underlying board validation error.
        #[from]
        source: BoardError,
    },
}

/// Errors from structural validation of a [`Board`](crate::board::Board).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// A side does not have exactly one king.
    #[error("expected 1 king for {color}, found {count}")]
    InvalidKingCount {
        /// Which side has the wrong king count.
        color: &'static str,
        /// Number of kings found.
        count: usize,
    },
}
