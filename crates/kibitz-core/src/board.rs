//! The 8x8 grid of optional pieces.

use std::fmt;

use crate::color::Color;
use crate::error::BoardError;
use crate::piece::{Piece, PieceId};
use crate::piece_kind::PieceKind;
use crate::square::Square;

/// Back-rank layout from the a-file to the h-file.
const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// Piece placement plus the en-passant target the pawn rule reads.
///
/// The board owns every placed piece. A piece taken off a square and not put back
/// anywhere is gone; that is all a capture is.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    /// Rank-major grid, indexed by [`Square::index`].
    squares: [Option<Piece>; Square::COUNT],
    /// Square a pawn may capture into this ply, if any.
    en_passant: Option<Square>,
    /// Next identity handed out by [`Board::place`].
    next_id: u16,
}

impl Board {
    /// A board with no pieces.
    pub fn empty() -> Board {
        Board {
            squares: [None; Square::COUNT],
            en_passant: None,
            next_id: 0,
        }
    }

    /// The standard initial placement.
    pub fn starting_position() -> Board {
        let mut board = Board::empty();
        for color in Color::ALL {
            for (file, kind) in (0u8..).zip(BACK_RANK) {
                if let Some(sq) = Square::new(file, color.back_rank()) {
                    board.place(sq, kind, color);
                }
                if let Some(sq) = Square::new(file, color.pawn_rank()) {
                    board.place(sq, PieceKind::Pawn, color);
                }
            }
        }
        board
    }

    /// The piece on `sq`, if any.
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<&Piece> {
        self.squares[sq.index()].as_ref()
    }

    /// Iterate over occupied squares in index order (a1 first).
    pub fn iter(&self) -> impl Iterator<Item = (Square, &Piece)> + '_ {
        Square::all().filter_map(|sq| self.piece_at(sq).map(|piece| (sq, piece)))
    }

    /// Locate a piece by identity.
    pub fn find(&self, id: PieceId) -> Option<(Square, &Piece)> {
        self.iter().find(|(_, piece)| piece.id() == id)
    }

    /// The en-passant target square, if the last move opened one.
    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Create a fresh, unmoved piece on `sq`, replacing whatever stood there.
    pub(crate) fn place(&mut self, sq: Square, kind: PieceKind, color: Color) -> PieceId {
        let id = PieceId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.squares[sq.index()] = Some(Piece::new(id, kind, color));
        id
    }

    /// Remove and return the piece on `sq`.
    #[inline]
    pub(crate) fn take(&mut self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()].take()
    }

    /// Put `piece` on `sq`, dropping any piece already there.
    #[inline]
    pub(crate) fn put(&mut self, sq: Square, piece: Piece) {
        self.squares[sq.index()] = Some(piece);
    }

    #[inline]
    pub(crate) fn set_en_passant(&mut self, sq: Option<Square>) {
        self.en_passant = sq;
    }

    /// Check the placement is playable: exactly one king per side.
    pub fn validate(&self) -> Result<(), BoardError> {
        for color in Color::ALL {
            let count = self
                .iter()
                .filter(|(_, piece)| piece.kind() == PieceKind::King && piece.color() == color)
                .count();
            if count != 1 {
                let color_name = match color {
                    Color::White => "white",
                    Color::Black => "black",
                };
                return Err(BoardError::InvalidKingCount {
                    color: color_name,
                    count,
                });
            }
        }
        Ok(())
    }

    /// Return a pretty-printable wrapper for this board.
    pub fn pretty(&self) -> PrettyBoard<'_> {
        PrettyBoard(self)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::starting_position()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board(\n{}\n)", self.pretty())
    }
}

/// Wrapper for printing a board as an 8x8 grid, rank 8 on top.
pub struct PrettyBoard<'a>(&'a Board);

impl fmt::Display for PrettyBoard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0u8..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0u8..8 {
                let c = Square::new(file, rank)
                    .and_then(|sq| self.0.piece_at(sq))
                    .map_or('-', |piece| piece.symbol());
                write!(f, "{c} ")?;
            }
            writeln!(f)?;
        }
        write!(f, "  a b c d e f g h")
    }
}

#[cfg(test)]
mod tests {
    use super::Board;
    use crate::color::Color;
    use crate::error::BoardError;
    use crate::piece_kind::PieceKind;
    use crate::square::Square;

    #[test]
    fn starting_position_layout() {
        let board = Board::starting_position();
        board.validate().unwrap();
        assert_eq!(board.iter().count(), 32);
        let king = board.piece_at(Square::E1).unwrap();
        assert_eq!(king.kind(), PieceKind::King);
        assert_eq!(king.color(), Color::White);
        assert_eq!(board.piece_at(Square::D8).unwrap().kind(), PieceKind::Queen);
        assert!(board.piece_at(Square::new(4, 3).unwrap()).is_none());
        assert_eq!(board.en_passant(), None);
    }

    #[test]
    fn identities_are_unique() {
        let board = Board::starting_position();
        let mut ids: Vec<_> = board.iter().map(|(_, piece)| piece.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 32);
    }

    #[test]
    fn find_follows_a_moved_piece() {
        let mut board = Board::starting_position();
        let id = board.piece_at(Square::G1).unwrap().id();
        let knight = board.take(Square::G1).unwrap();
        board.put(Square::F1, knight);
        let (sq, piece) = board.find(id).unwrap();
        assert_eq!(sq, Square::F1);
        assert_eq!(piece.kind(), PieceKind::Knight);
    }

    #[test]
    fn take_without_put_destroys() {
        let mut board = Board::starting_position();
        let id = board.piece_at(Square::A8).unwrap().id();
        board.take(Square::A8);
        assert!(board.find(id).is_none());
        assert_eq!(board.iter().count(), 31);
    }

    #[test]
    fn validate_counts_kings() {
        let mut board = Board::empty();
        board.place(Square::E1, PieceKind::King, Color::White);
        assert_eq!(
            board.validate(),
            Err(BoardError::InvalidKingCount {
                color: "black",
                count: 0
            })
        );
        board.place(Square::E8, PieceKind::King, Color::Black);
        assert!(board.validate().is_ok());
    }

    #[test]
    fn pretty_print() {
        let output = format!("{}", Board::starting_position().pretty());
        assert!(output.starts_with("8 r n b q k b n r"));
        assert!(output.contains("4 - - - - - - - -"));
        assert!(output.ends_with("  a b c d e f g h"));
    }
}
