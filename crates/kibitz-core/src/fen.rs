//! Forsyth–Edwards notation for [`GameState`].
//!
//! The move counters follow this crate's conventions rather than the usual ones: the
//! fullmove field is always `plies / 2`, and the halfmove field depends on the
//! state's [`ClockPolicy`].

use std::fmt;
use std::str::FromStr;

use crate::board::Board;
use crate::castle_rights::CastleRights;
use crate::color::Color;
use crate::error::FenError;
use crate::game_state::{ClockPolicy, GameState};
use crate::piece_kind::PieceKind;
use crate::square::Square;

/// Notation of the standard starting position as this crate emits it.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0";

impl GameState {
    /// The six-field notation of the current position.
    pub fn to_fen(&self) -> String {
        self.to_string()
    }

    /// Parse a position, seeding the move counters according to `clock`.
    ///
    /// Under [`ClockPolicy::PlyCount`] the halfmove field is the ply counter. Under
    /// [`ClockPolicy::Conventional`] it is the fifty-move clock, and the ply counter is
    /// recovered from the fullmove field and the side to move.
    pub fn from_fen(fen: &str, clock: ClockPolicy) -> Result<GameState, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(FenError::WrongFieldCount {
                found: fields.len(),
            });
        }

        let mut board = parse_placement(fields[0])?;

        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(FenError::InvalidColor {
                    found: other.to_string(),
                });
            }
        };

        let castling = CastleRights::from_fen(fields[2])?;

        let en_passant = match fields[3] {
            "-" => None,
            field => Some(Square::from_algebraic(field).ok_or_else(|| {
                FenError::InvalidEnPassant {
                    found: field.to_string(),
                }
            })?),
        };

        let halfmove = parse_counter(fields[4], "halfmove clock")?;
        let fullmove = parse_counter(fields[5], "fullmove number")?;
        let plies = match clock {
            ClockPolicy::PlyCount => halfmove,
            ClockPolicy::Conventional => fullmove
                .saturating_mul(2)
                .saturating_add(u32::from(side_to_move == Color::Black)),
        };

        board.set_en_passant(en_passant);
        board.validate()?;

        Ok(GameState::from_parts(board, side_to_move, castling, plies, halfmove).with_clock_policy(clock))
    }
}

fn parse_placement(placement: &str) -> Result<Board, FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::WrongRankCount { found: ranks.len() });
    }

    let mut board = Board::empty();
    for (rank_index, rank_str) in ranks.iter().enumerate() {
        // FEN lists rank 8 first.
        let rank = 7 - rank_index as u8;
        let mut file: u8 = 0;

        for c in rank_str.chars() {
            if let Some(digit) = c.to_digit(10) {
                if !(1..=8).contains(&digit) {
                    return Err(FenError::InvalidPieceChar { character: c });
                }
                file += digit as u8;
                if file > 8 {
                    return Err(FenError::BadRankLength {
                        rank_index,
                        length: file as usize,
                    });
                }
                continue;
            }

            let kind = PieceKind::from_symbol(c).ok_or(FenError::InvalidPieceChar { character: c })?;
            let color = if c.is_ascii_uppercase() {
                Color::White
            } else {
                Color::Black
            };
            let sq = Square::new(file, rank).ok_or(FenError::BadRankLength {
                rank_index,
                length: file as usize + 1,
            })?;
            board.place(sq, kind, color);
            file += 1;
        }

        if file != 8 {
            return Err(FenError::BadRankLength {
                rank_index,
                length: file as usize,
            });
        }
    }
    Ok(board)
}

fn parse_counter(field: &str, name: &'static str) -> Result<u32, FenError> {
    field.parse().map_err(|_| FenError::InvalidMoveCounter {
        field: name,
        found: field.to_string(),
    })
}

impl FromStr for GameState {
    type Err = FenError;

    fn from_str(fen: &str) -> Result<GameState, FenError> {
        GameState::from_fen(fen, ClockPolicy::default())
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let board = self.board();

        // Piece placement
        for rank in (0u8..8).rev() {
            let mut empty_count = 0u8;
            for file in 0u8..8 {
                match Square::new(file, rank).and_then(|sq| board.piece_at(sq)) {
                    Some(piece) => {
                        if empty_count > 0 {
                            write!(f, "{empty_count}")?;
                            empty_count = 0;
                        }
                        write!(f, "{}", piece.symbol())?;
                    }
                    None => empty_count += 1,
                }
            }
            if empty_count > 0 {
                write!(f, "{empty_count}")?;
            }
            if rank > 0 {
                write!(f, "/")?;
            }
        }

        write!(f, " {}", self.side_to_move())?;
        write!(f, " {}", self.castling())?;
        match self.en_passant_target() {
            Some(sq) => write!(f, " {sq}")?,
            None => write!(f, " -")?,
        }
        write!(f, " {} {}", self.halfmove_clock(), self.fullmove_number())
    }
}

#[cfg(test)]
mod tests {
    use super::STARTING_FEN;
    use crate::error::FenError;
    use crate::game_state::{ClockPolicy, GameState};

    fn roundtrip(fen: &str) {
        let state: GameState = fen.parse().unwrap();
        assert_eq!(state.to_fen(), fen, "FEN roundtrip failed");
    }

    #[test]
    fn starting_position() {
        assert_eq!(GameState::new().to_fen(), STARTING_FEN);
        assert_eq!(STARTING_FEN.parse::<GameState>().unwrap(), GameState::new());
    }

    #[test]
    fn roundtrips() {
        roundtrip("rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 2 1");
        roundtrip("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 0");
        roundtrip("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 7 3");
    }

    #[test]
    fn fullmove_is_derived_from_plies() {
        let state: GameState = "4k3/8/8/8/8/8/8/4K3 w - - 9 40".parse().unwrap();
        assert_eq!(state.plies(), 9);
        assert_eq!(state.to_fen(), "4k3/8/8/8/8/8/8/4K3 w - - 9 4");
    }

    #[test]
    fn conventional_policy_keeps_both_counters() {
        let fen = "4k3/8/8/8/8/8/8/4K3 b - - 9 40";
        let state = GameState::from_fen(fen, ClockPolicy::Conventional).unwrap();
        assert_eq!(state.plies(), 81);
        assert_eq!(state.to_fen(), fen);
    }

    #[test]
    fn rights_without_pieces_are_dropped() {
        let state: GameState = "4k3/8/8/8/8/8/8/4K3 w KQkq - 0 0".parse().unwrap();
        assert_eq!(format!("{}", state.castling()), "-");
        let partial: GameState = "r3k3/8/8/8/8/8/8/4K2R w KQkq - 0 0".parse().unwrap();
        assert_eq!(format!("{}", partial.castling()), "Kq");
    }

    #[test]
    fn overlong_empty_run_is_an_error() {
        let fen = format!("{}/8/8/8/8/8/8/4K2k w - - 0 0", "8".repeat(40));
        assert!(matches!(
            fen.parse::<GameState>(),
            Err(FenError::BadRankLength { rank_index: 0, .. })
        ));
        assert!(matches!(
            "4k3/8/8/8/8/8/8/4K2R1 w - - 0 0".parse::<GameState>(),
            Err(FenError::BadRankLength { rank_index: 7, length: 9 })
        ));
    }

    #[test]
    fn errors() {
        assert!("e4 e5".parse::<GameState>().is_err());
        assert!("rnbqkbnr/pppppppp/8/8/8/8/PPPPXPPP/RNBQKBNR w KQkq - 0 0".parse::<GameState>().is_err());
        assert!("rnbqkbnr/ppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0".parse::<GameState>().is_err());
        assert!("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 0".parse::<GameState>().is_err());
        assert!("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w XQkq - 0 0".parse::<GameState>().is_err());
        assert!("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq z9 0 0".parse::<GameState>().is_err());
        assert!("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - abc 0".parse::<GameState>().is_err());
        assert!("rnbq1bnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0".parse::<GameState>().is_err());
    }
}
