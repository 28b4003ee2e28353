//! Authoritative game state and the single move-application path.

use tracing::{debug, trace};

use crate::board::Board;
use crate::castle_rights::{CastleRights, CastleSide, king_home};
use crate::color::Color;
use crate::error::MoveRejection;
use crate::move_token::MoveToken;
use crate::piece::{Piece, PieceId};
use crate::piece_kind::PieceKind;
use crate::square::Square;

/// What the halfmove field of the position notation reports.
///
/// After `e2e4` from the starting position the notation ends in `e3 1 0` under
/// [`PlyCount`](ClockPolicy::PlyCount) and in `e3 0 0` under
/// [`Conventional`](ClockPolicy::Conventional). The fullmove field is `plies / 2` either way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClockPolicy {
    /// The raw ply counter: +1 on every applied move, never reset.
    #[default]
    PlyCount,
    /// The fifty-move clock: reset to 0 by pawn moves and captures, +1 otherwise.
    Conventional,
}

/// The six pieces castling rights hang on, by identity.
///
/// Slots follow the pieces wherever they go; a slot whose piece has moved or
/// has been captured revokes the rights that depend on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CastlingPieces {
    /// Indexed by [`Color`].
    kings: [Option<PieceId>; 2],
    /// Indexed by [`Color`], then king side / queen side.
    rooks: [[Option<PieceId>; 2]; 2],
}

impl CastlingPieces {
    /// Bind whichever kings and rooks currently stand on their home squares.
    fn bind(board: &Board) -> CastlingPieces {
        let mut refs = CastlingPieces::default();
        for color in Color::ALL {
            refs.kings[color as usize] = home_piece(board, king_home(color), PieceKind::King, color);
            for side in CastleSide::ALL {
                refs.rooks[color as usize][side as usize] =
                    home_piece(board, side.rook_home(color), PieceKind::Rook, color);
            }
        }
        refs
    }

    fn king(&self, color: Color) -> Option<PieceId> {
        self.kings[color as usize]
    }

    fn rook(&self, color: Color, side: CastleSide) -> Option<PieceId> {
        self.rooks[color as usize][side as usize]
    }
}

fn home_piece(board: &Board, sq: Square, kind: PieceKind, color: Color) -> Option<PieceId> {
    board
        .piece_at(sq)
        .filter(|piece| piece.kind() == kind && piece.color() == color)
        .map(|piece| piece.id())
}

/// A validated move, ready to be carried out.
enum Plan {
    Normal {
        /// Square of a pawn captured en passant.
        en_passant_victim: Option<Square>,
        capture: bool,
    },
    Castle {
        rook_from: Square,
        rook_to: Square,
    },
}

/// Board, side to move, counters, castling rights and en-passant target.
///
/// Mutated only through [`apply_move`](GameState::apply_move) / [`apply`](GameState::apply),
/// which validate fully before touching anything: a rejected move leaves the state as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    board: Board,
    side_to_move: Color,
    /// Moves applied since the position was set up (plus any seed from FEN).
    plies: u32,
    /// Fifty-move clock, reported under [`ClockPolicy::Conventional`].
    halfmove_clock: u32,
    castling: CastleRights,
    castling_pieces: CastlingPieces,
    clock: ClockPolicy,
}

impl GameState {
    /// The standard initial position: White to move, all rights, no en-passant target.
    pub fn new() -> GameState {
        GameState::from_parts(Board::starting_position(), Color::White, CastleRights::ALL, 0, 0)
    }

    /// Assemble a state from parsed components. Castling references are bound to the
    /// kings and rooks on their home squares, and rights without them are dropped.
    pub(crate) fn from_parts(
        board: Board,
        side_to_move: Color,
        castling: CastleRights,
        plies: u32,
        halfmove_clock: u32,
    ) -> GameState {
        let castling_pieces = CastlingPieces::bind(&board);
        let mut state = GameState {
            board,
            side_to_move,
            plies,
            halfmove_clock,
            castling,
            castling_pieces,
            clock: ClockPolicy::default(),
        };
        state.refresh_castling();
        state
    }

    /// Choose what the halfmove field reports.
    #[must_use]
    pub fn with_clock_policy(mut self, clock: ClockPolicy) -> GameState {
        self.clock = clock;
        self
    }

    /// Read-only view of the grid.
    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// `true` when it is White's turn.
    #[inline]
    pub fn is_white_to_move(&self) -> bool {
        self.side_to_move.is_white()
    }

    /// Number of moves applied so far.
    #[inline]
    pub fn plies(&self) -> u32 {
        self.plies
    }

    /// Value of the halfmove field under the configured [`ClockPolicy`].
    pub fn halfmove_clock(&self) -> u32 {
        match self.clock {
            ClockPolicy::PlyCount => self.plies,
            ClockPolicy::Conventional => self.halfmove_clock,
        }
    }

    /// Fullmove field: plies / 2, rounded down.
    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.plies / 2
    }

    #[inline]
    pub fn clock_policy(&self) -> ClockPolicy {
        self.clock
    }

    #[inline]
    pub fn castling(&self) -> CastleRights {
        self.castling
    }

    /// Square a pawn may capture into on this ply, if any.
    #[inline]
    pub fn en_passant_target(&self) -> Option<Square> {
        self.board.en_passant()
    }

    /// Apply a move token such as `"e2e4"` or `"e7e8q"`.
    ///
    /// Returns `false` and leaves the state untouched for an empty, malformed or
    /// sentinel token, an empty source square, or a move the piece cannot make.
    /// The reason is logged, never returned.
    pub fn apply_move(&mut self, token: &str) -> bool {
        match self.try_apply(token) {
            Ok(mv) => {
                debug!(%mv, fen = %self, "move applied");
                trace!("\n{}", self.board.pretty());
                true
            }
            Err(reason) => {
                debug!(token, %reason, "move rejected");
                false
            }
        }
    }

    /// Decode and apply a token, reporting why it was refused.
    pub fn try_apply(&mut self, token: &str) -> Result<MoveToken, MoveRejection> {
        if token.is_empty() {
            return Err(MoveRejection::EmptyToken);
        }
        let mv = MoveToken::decode(token)?.ok_or(MoveRejection::NoMoveToken)?;
        self.apply(mv)?;
        Ok(mv)
    }

    /// Apply an already decoded move.
    pub fn apply(&mut self, mv: MoveToken) -> Result<(), MoveRejection> {
        let MoveToken { from, to, promotion } = mv;
        let piece = *self
            .board
            .piece_at(from)
            .ok_or(MoveRejection::EmptySource { square: from })?;

        let plan = self
            .castle_plan(piece, mv)
            .or_else(|| self.normal_plan(piece, from, to))
            .ok_or(MoveRejection::IllegalGeometry { piece, from, to })?;

        // Validated; from here on nothing can fail.
        self.board.set_en_passant(None);

        let capture = match plan {
            Plan::Normal {
                en_passant_victim,
                capture,
            } => {
                self.relocate(from, to);
                if let Some(victim) = en_passant_victim {
                    self.board.take(victim);
                }
                capture
            }
            Plan::Castle { rook_from, rook_to } => {
                self.relocate(from, to);
                self.relocate(rook_from, rook_to);
                false
            }
        };

        if let Some(kind) = promotion {
            self.board.place(to, kind, piece.color());
        }

        if piece.is_double_step(from, to) {
            self.board
                .set_en_passant(to.offset(0, -piece.color().forward()));
        }

        self.side_to_move = self.side_to_move.flip();
        self.plies = self.plies.saturating_add(1);
        self.halfmove_clock = if capture || piece.kind() == PieceKind::Pawn {
            0
        } else {
            self.halfmove_clock.saturating_add(1)
        };
        self.refresh_castling();
        Ok(())
    }

    /// Move the piece on `from` to `to`, marking it moved. Whatever stood on `to` is destroyed.
    fn relocate(&mut self, from: Square, to: Square) {
        if let Some(mut piece) = self.board.take(from) {
            piece.mark_moved();
            self.board.put(to, piece);
        }
    }

    fn normal_plan(&self, piece: Piece, from: Square, to: Square) -> Option<Plan> {
        if !piece.is_legal_move(from, to, &self.board) {
            return None;
        }
        let en_passant_victim = if piece.is_en_passant_capture(from, to, &self.board) {
            to.offset(0, -piece.color().forward())
        } else {
            None
        };
        let capture = en_passant_victim.is_some() || self.board.piece_at(to).is_some();
        Some(Plan::Normal {
            en_passant_victim,
            capture,
        })
    }

    /// Recognise a castling move: the bound, unmoved king steps two files from its
    /// home square toward a bound, unmoved rook, with every square between them empty
    /// and the matching right still held. Attacked squares are not considered.
    fn castle_plan(&self, piece: Piece, mv: MoveToken) -> Option<Plan> {
        let MoveToken { from, to, promotion } = mv;
        let color = piece.color();
        if piece.kind() != PieceKind::King
            || piece.has_moved()
            || promotion.is_some()
            || from != king_home(color)
            || to.rank() != from.rank()
            || self.castling_pieces.king(color) != Some(piece.id())
        {
            return None;
        }

        let step = to.file() as i8 - from.file() as i8;
        let side = CastleSide::from_king_step(step)?;
        if !self.castling.has(color, side) {
            return None;
        }

        let rook_from = side.rook_home(color);
        let rook = self.board.piece_at(rook_from)?;
        if self.castling_pieces.rook(color, side) != Some(rook.id()) || rook.has_moved() {
            return None;
        }

        let (low, high) = if from.file() < rook_from.file() {
            (from.file(), rook_from.file())
        } else {
            (rook_from.file(), from.file())
        };
        let blocked = (low + 1..high)
            .filter_map(|file| Square::new(file, from.rank()))
            .any(|sq| self.board.piece_at(sq).is_some());
        if blocked {
            return None;
        }

        let rook_to = from.offset(step.signum(), 0)?;
        Some(Plan::Castle { rook_from, rook_to })
    }

    /// Drop every right whose king or rook has moved or left the board.
    fn refresh_castling(&mut self) {
        for color in Color::ALL {
            let king_ready = self.is_unmoved(self.castling_pieces.king(color));
            for side in CastleSide::ALL {
                if !self.castling.has(color, side) {
                    continue;
                }
                if !king_ready || !self.is_unmoved(self.castling_pieces.rook(color, side)) {
                    self.castling = self.castling.without(color, side);
                }
            }
        }
    }

    fn is_unmoved(&self, id: Option<PieceId>) -> bool {
        id.and_then(|id| self.board.find(id))
            .is_some_and(|(_, piece)| !piece.has_moved())
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{ClockPolicy, GameState};
    use crate::castle_rights::CastleSide;
    use crate::color::Color;
    use crate::error::{DecodeError, MoveRejection};
    use crate::piece_kind::PieceKind;
    use crate::square::Square;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn play(state: &mut GameState, moves: &[&str]) {
        for mv in moves {
            assert!(state.apply_move(mv), "{mv} should be accepted in {state}");
        }
    }

    #[test]
    fn initial_state() {
        let state = GameState::new();
        assert!(state.is_white_to_move());
        assert_eq!(state.plies(), 0);
        assert_eq!(state.en_passant_target(), None);
        assert_eq!(format!("{}", state.castling()), "KQkq");
    }

    #[test]
    fn pawn_push_moves_piece_and_flips_turn() {
        let mut state = GameState::new();
        assert!(state.apply_move("e2e4"));
        assert!(state.board().piece_at(sq("e2")).is_none());
        let pawn = state.board().piece_at(sq("e4")).unwrap();
        assert_eq!(pawn.kind(), PieceKind::Pawn);
        assert!(pawn.has_moved());
        assert_eq!(state.side_to_move(), Color::Black);
        assert_eq!(state.plies(), 1);
        assert_eq!(state.en_passant_target(), Some(sq("e3")));
    }

    #[test]
    fn rejections_carry_reasons() {
        let mut state = GameState::new();
        assert_eq!(state.try_apply(""), Err(MoveRejection::EmptyToken));
        assert_eq!(
            state.try_apply("e2"),
            Err(MoveRejection::Decode(DecodeError::WrongLength { len: 2 }))
        );
        assert_eq!(state.try_apply("(none)"), Err(MoveRejection::NoMoveToken));
        assert_eq!(
            state.try_apply("e4e5"),
            Err(MoveRejection::EmptySource { square: sq("e4") })
        );
        assert!(matches!(
            state.try_apply("e2e5"),
            Err(MoveRejection::IllegalGeometry { .. })
        ));
        assert_eq!(state, GameState::new());
    }

    #[test]
    fn capture_destroys_target() {
        let mut state = GameState::new();
        play(&mut state, &["e2e4", "d7d5", "e4d5"]);
        assert_eq!(state.board().iter().count(), 31);
        let pawn = state.board().piece_at(sq("d5")).unwrap();
        assert_eq!(pawn.color(), Color::White);
    }

    #[test]
    fn turn_is_not_enforced() {
        let mut state = GameState::new();
        play(&mut state, &["e2e4", "d2d4"]);
        assert!(state.is_white_to_move());
        assert_eq!(state.plies(), 2);
    }

    #[test]
    fn en_passant_window_lasts_one_ply() {
        let mut state = GameState::new();
        play(&mut state, &["e2e4"]);
        assert_eq!(state.en_passant_target(), Some(sq("e3")));
        play(&mut state, &["g8f6"]);
        assert_eq!(state.en_passant_target(), None);
        play(&mut state, &["e4e5", "d7d5"]);
        assert_eq!(state.en_passant_target(), Some(sq("d6")));
        play(&mut state, &["e5e6"]);
        assert_eq!(state.en_passant_target(), None);
    }

    #[test]
    fn en_passant_capture_removes_passed_pawn() {
        let mut state = GameState::new();
        play(&mut state, &["e2e4", "a7a6", "e4e5", "d7d5", "e5d6"]);
        assert!(state.board().piece_at(sq("d5")).is_none());
        assert_eq!(
            state.board().piece_at(sq("d6")).map(|p| (p.kind(), p.color())),
            Some((PieceKind::Pawn, Color::White))
        );
        assert_eq!(state.board().iter().count(), 31);
    }

    #[test]
    fn pawn_cannot_take_en_passant_behind_its_own_pawn() {
        let mut state = GameState::new().with_clock_policy(ClockPolicy::Conventional);
        play(&mut state, &["g1f3", "e2e4"]);
        let before = state.clone();
        assert!(!state.apply_move("d2e3"));
        assert_eq!(state, before);
        assert_eq!(state.board().iter().count(), 32);
    }

    #[test]
    fn en_passant_expires_after_intervening_move() {
        let mut state = GameState::new();
        play(&mut state, &["e2e4", "a7a6", "e4e5", "d7d5", "h2h3", "h7h6"]);
        assert!(!state.apply_move("e5d6"));
    }

    #[test]
    fn promotion_replaces_pawn() {
        let mut state: GameState = "k7/4P3/8/8/8/8/8/4K3 w - - 0 0".parse().unwrap();
        assert!(state.apply_move("e7e8n"));
        let piece = state.board().piece_at(sq("e8")).unwrap();
        assert_eq!(piece.kind(), PieceKind::Knight);
        assert_eq!(piece.color(), Color::White);
        assert!(!piece.has_moved());
    }

    #[test]
    fn black_promotion_is_black() {
        let mut state: GameState = "4k3/8/8/8/8/8/3p4/K7 b - - 0 0".parse().unwrap();
        assert!(state.apply_move("d2d1R"));
        let piece = state.board().piece_at(sq("d1")).unwrap();
        assert_eq!((piece.kind(), piece.color()), (PieceKind::Rook, Color::Black));
    }

    #[test]
    fn kingside_castle_moves_rook() {
        let mut state = GameState::new();
        play(&mut state, &["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6", "e1g1"]);
        assert_eq!(state.board().piece_at(sq("g1")).unwrap().kind(), PieceKind::King);
        assert_eq!(state.board().piece_at(sq("f1")).unwrap().kind(), PieceKind::Rook);
        assert!(state.board().piece_at(sq("h1")).is_none());
        assert!(!state.castling().has(Color::White, CastleSide::KingSide));
        assert!(!state.castling().has(Color::White, CastleSide::QueenSide));
        assert!(state.castling().has(Color::Black, CastleSide::KingSide));
    }

    #[test]
    fn queenside_castle_for_black() {
        let mut state: GameState = "r3k3/8/8/8/8/8/8/4K3 b q - 0 0".parse().unwrap();
        assert!(state.apply_move("e8c8"));
        assert_eq!(state.board().piece_at(sq("c8")).unwrap().kind(), PieceKind::King);
        assert_eq!(state.board().piece_at(sq("d8")).unwrap().kind(), PieceKind::Rook);
        assert!(state.castling().is_empty());
    }

    #[test]
    fn castle_refused_when_blocked_or_revoked() {
        let mut state = GameState::new();
        assert!(!state.apply_move("e1g1"));

        let mut no_right: GameState = "4k3/8/8/8/8/8/8/4K2R w - - 0 0".parse().unwrap();
        assert!(!no_right.apply_move("e1g1"));

        let mut queenside: GameState = "4k3/8/8/8/8/8/8/RN2K3 w Q - 0 0".parse().unwrap();
        assert!(!queenside.apply_move("e1c1"));
    }

    #[test]
    fn captured_rook_revokes_right() {
        let mut state: GameState = "r3k3/8/8/8/8/8/8/R3K3 w Qq - 0 0".parse().unwrap();
        assert!(state.apply_move("a1a8"));
        assert!(!state.castling().has(Color::Black, CastleSide::QueenSide));
        assert!(!state.castling().has(Color::White, CastleSide::QueenSide));
    }

    #[test]
    fn clock_policies() {
        let mut plies = GameState::new();
        let mut fifty = GameState::new().with_clock_policy(ClockPolicy::Conventional);
        for state in [&mut plies, &mut fifty] {
            play(state, &["g1f3", "g8f6", "e2e4"]);
        }
        assert_eq!(plies.halfmove_clock(), 3);
        assert_eq!(fifty.halfmove_clock(), 0);
        play(&mut fifty, &["b8c6"]);
        assert_eq!(fifty.halfmove_clock(), 1);
        assert_eq!(plies.fullmove_number(), 1);
        assert_eq!(fifty.fullmove_number(), 2);
    }
}
