//! Pieces and their movement rules.
//!
//! Every rule here is piece-local: it looks at geometry and at which squares are
//! occupied, but never asks whether the mover's own king ends up attacked.
//! Castling is not a king move at this level; [`GameState`](crate::GameState)
//! recognises it before the king's rule is consulted.

use std::fmt;

use crate::board::Board;
use crate::color::Color;
use crate::piece_kind::PieceKind;
use crate::square::Square;

/// Identity of a placed piece, stable for as long as the piece stays on the board.
///
/// Promotion replaces a pawn with a freshly identified piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PieceId(u16);

impl PieceId {
    #[inline]
    pub(crate) const fn new(raw: u16) -> PieceId {
        PieceId(raw)
    }
}

/// A piece on the board: kind, color, identity and whether it has moved yet.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    id: PieceId,
    kind: PieceKind,
    color: Color,
    moved: bool,
}

impl Piece {
    #[inline]
    pub(crate) const fn new(id: PieceId, kind: PieceKind, color: Color) -> Piece {
        Piece {
            id,
            kind,
            color,
            moved: false,
        }
    }

    #[inline]
    pub const fn id(self) -> PieceId {
        self.id
    }

    #[inline]
    pub const fn kind(self) -> PieceKind {
        self.kind
    }

    #[inline]
    pub const fn color(self) -> Color {
        self.color
    }

    /// `true` for White pieces.
    #[inline]
    pub const fn is_white(self) -> bool {
        self.color.is_white()
    }

    /// Whether this piece has completed at least one move.
    #[inline]
    pub const fn has_moved(self) -> bool {
        self.moved
    }

    #[inline]
    pub(crate) fn mark_moved(&mut self) {
        self.moved = true;
    }

    /// Notation letter: uppercase for White, lowercase for Black.
    #[inline]
    pub fn symbol(self) -> char {
        let c = self.kind.symbol();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// Check whether moving this piece from `from` to `to` fits its movement pattern.
    ///
    /// Returns `false` for a null move, for landing on a piece of the same color and for
    /// any target the pattern does not reach. Pure: the board is only read.
    pub fn is_legal_move(self, from: Square, to: Square, board: &Board) -> bool {
        if from == to {
            return false;
        }
        if board.piece_at(to).is_some_and(|target| target.color == self.color) {
            return false;
        }

        let df = to.file() as i8 - from.file() as i8;
        let dr = to.rank() as i8 - from.rank() as i8;

        match self.kind {
            PieceKind::Pawn => self.is_pawn_move(from, to, df, dr, board),
            PieceKind::Knight => matches!((df.abs(), dr.abs()), (1, 2) | (2, 1)),
            PieceKind::Bishop => df.abs() == dr.abs() && is_ray_clear(from, to, board),
            PieceKind::Rook => (df == 0 || dr == 0) && is_ray_clear(from, to, board),
            PieceKind::Queen => {
                (df == 0 || dr == 0 || df.abs() == dr.abs()) && is_ray_clear(from, to, board)
            }
            PieceKind::King => df.abs() <= 1 && dr.abs() <= 1,
        }
    }

    /// `true` if this is a pawn capturing onto the board's en-passant target.
    ///
    /// The captured pawn is not on `to`; it stands one rank behind it.
    pub fn is_en_passant_capture(self, from: Square, to: Square, board: &Board) -> bool {
        if self.kind != PieceKind::Pawn || !self.can_take_en_passant_on(to, board) {
            return false;
        }
        let df = to.file() as i8 - from.file() as i8;
        let dr = to.rank() as i8 - from.rank() as i8;
        df.abs() == 1 && dr == self.color.forward() && board.piece_at(to).is_none()
    }

    /// `true` if this is a pawn advancing two squares from its starting rank,
    /// which opens an en-passant window for exactly one ply.
    pub fn is_double_step(self, from: Square, to: Square) -> bool {
        self.kind == PieceKind::Pawn
            && from.file() == to.file()
            && from.rank() == self.color.pawn_rank()
            && to.rank() as i8 - from.rank() as i8 == 2 * self.color.forward()
    }

    fn is_pawn_move(self, from: Square, to: Square, df: i8, dr: i8, board: &Board) -> bool {
        let forward = self.color.forward();
        let target_empty = board.piece_at(to).is_none();

        match df.abs() {
            0 if dr == forward => target_empty,
            0 if dr == 2 * forward => {
                from.rank() == self.color.pawn_rank()
                    && target_empty
                    && from
                        .offset(0, forward)
                        .is_some_and(|mid| board.piece_at(mid).is_none())
            }
            // Diagonal: a capture, or onto the en-passant target.
            1 if dr == forward => !target_empty || self.can_take_en_passant_on(to, board),
            _ => false,
        }
    }

    /// The board's en-passant target is `to`, and it was left by an enemy pawn.
    fn can_take_en_passant_on(self, to: Square, board: &Board) -> bool {
        board.en_passant() == Some(to) && to.rank() == self.color.flip().passing_rank()
    }
}

/// Every square strictly between `from` and `to` is empty.
///
/// Callers guarantee the two squares share a file, rank or diagonal.
fn is_ray_clear(from: Square, to: Square, board: &Board) -> bool {
    let step_file = (to.file() as i8 - from.file() as i8).signum();
    let step_rank = (to.rank() as i8 - from.rank() as i8).signum();

    let mut cursor = from.offset(step_file, step_rank);
    while let Some(sq) = cursor {
        if sq == to {
            return true;
        }
        if board.piece_at(sq).is_some() {
            return false;
        }
        cursor = sq.offset(step_file, step_rank);
    }
    false
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let color_prefix = match self.color {
            Color::White => 'W',
            Color::Black => 'B',
        };
        let kind_char = self.kind.symbol().to_ascii_uppercase();
        write!(f, "{color_prefix}{kind_char}")?;
        if self.moved {
            write!(f, "*")?;
        }
        Ok(())
    }
}
