//! Coordinate move tokens (`e2e4`, `e7e8q`) as exchanged with engines.

use std::fmt;

use crate::error::DecodeError;
use crate::piece_kind::PieceKind;
use crate::square::Square;

/// Sentinel an engine sends when it has no move to play.
pub const NO_MOVE: &str = "(none)";

/// The UCI null move, treated the same as [`NO_MOVE`].
pub const NULL_MOVE: &str = "0000";

/// Return `true` if `token` means "no move available" rather than a move.
pub fn is_no_move(token: &str) -> bool {
    let token = token.trim();
    token.eq_ignore_ascii_case(NO_MOVE) || token == NULL_MOVE
}

/// A decoded move: source, destination and optional promotion kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveToken {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl MoveToken {
    /// Decode a 4- or 5-character token.
    ///
    /// Returns `Ok(None)` for a no-move sentinel. The promotion letter is
    /// case-insensitive.
    pub fn decode(token: &str) -> Result<Option<MoveToken>, DecodeError> {
        if token.is_empty() {
            return Err(DecodeError::Empty);
        }
        if is_no_move(token) {
            return Ok(None);
        }

        let chars: Vec<char> = token.chars().collect();
        let (from, to, promo) = match chars.as_slice() {
            [ff, fr, tf, tr] => ([*ff, *fr], [*tf, *tr], None),
            [ff, fr, tf, tr, p] => ([*ff, *fr], [*tf, *tr], Some(*p)),
            _ => return Err(DecodeError::WrongLength { len: chars.len() }),
        };

        let promotion = promo
            .map(|c| PieceKind::from_promotion_char(c).ok_or(DecodeError::InvalidPromotion { character: c }))
            .transpose()?;

        Ok(Some(MoveToken {
            from: decode_square(from)?,
            to: decode_square(to)?,
            promotion,
        }))
    }

    /// Encode back to coordinate form; the promotion letter is always lowercase.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

fn decode_square([file, rank]: [char; 2]) -> Result<Square, DecodeError> {
    if !('a'..='h').contains(&file) {
        return Err(DecodeError::InvalidFile { character: file });
    }
    if !('1'..='8').contains(&rank) {
        return Err(DecodeError::InvalidRank { character: rank });
    }
    Square::new(file as u8 - b'a', rank as u8 - b'1').ok_or(DecodeError::InvalidFile { character: file })
}

impl fmt::Display for MoveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.symbol())?;
        }
        Ok(())
    }
}
