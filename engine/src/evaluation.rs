use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::bitboard::Square;
use crate::position::{Piece, Position, Side};

/// Score in centipawns from the side to move's perspective. Scores at or
/// beyond [`Eval::MATE_BOUND`] encode a forced mate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize, Serialize,
)]
pub struct Eval(pub i32);

impl Eval {
    pub const INFINITY: Eval = Eval(21_000);
    pub const CHECKMATE: Eval = Eval(20_000);
    pub const MATE_BOUND: Eval = Eval(19_500);
    pub const DRAW: Eval = Eval(0);

    pub const fn value(self) -> i32 {
        self.0
    }

    /// Score of the side to move when it is checkmated `ply` half-moves from the root.
    pub const fn mated_in(ply: u8) -> Eval {
        Eval(-(Eval::CHECKMATE.0 - ply as i32))
    }

    pub const fn is_mate(self) -> bool {
        self.0.abs() >= Eval::MATE_BOUND.0
    }

    /// Full moves until mate, negative when the side to move is getting mated.
    pub fn mate_in(self) -> Option<i32> {
        if !self.is_mate() {
            return None;
        }
        let plies = Eval::CHECKMATE.0 - self.0.abs();
        let moves = (plies + 1) / 2;
        Some(if self.0 > 0 { moves } else { -moves })
    }
}

impl Neg for Eval {
    type Output = Eval;

    fn neg(self) -> Self::Output {
        Eval(-self.0)
    }
}

impl Add<i32> for Eval {
    type Output = Eval;

    fn add(self, rhs: i32) -> Self::Output {
        Eval(self.0 + rhs)
    }
}

impl Sub<i32> for Eval {
    type Output = Eval;

    fn sub(self, rhs: i32) -> Self::Output {
        Eval(self.0 - rhs)
    }
}

impl fmt::Display for Eval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mate_in() {
            Some(moves) => write!(f, "mate {}", moves),
            None => write!(f, "cp {}", self.0),
        }
    }
}

pub trait EvaluatePosition {
    /// Static score of `position` for the side to move. Must stay strictly
    /// inside the mate bound.
    fn evaluate(&self, position: &Position) -> Eval;
}

/// Material plus piece-square tables, with the king table blended between
/// middlegame and endgame by remaining non-pawn material.
#[derive(Clone, Copy, Debug, Default)]
pub struct PositionEvaluator;

pub static POSITION_EVALUATOR: PositionEvaluator = PositionEvaluator;

impl EvaluatePosition for PositionEvaluator {
    fn evaluate(&self, position: &Position) -> Eval {
        let phase = game_phase(position);
        let mut score = 0;

        for side in [Side::White, Side::Black] {
            let sign = if side == Side::White { 1 } else { -1 };

            for piece in Piece::iter() {
                for square in position.pieces_of(piece, side).squares() {
                    let table_idx = pst_index(square, side);
                    let positional = match piece {
                        Piece::King => {
                            (KING_MIDDLEGAME_PST[table_idx] * phase
                                + KING_ENDGAME_PST[table_idx] * (MAX_PHASE - phase))
                                / MAX_PHASE
                        }
                        _ => pst(piece)[table_idx],
                    };
                    score += sign * (piece_value(piece) + positional);
                }
            }
        }

        let limit = Eval::MATE_BOUND.value() - 1;
        let score = score.clamp(-limit, limit);
        match position.to_move() {
            Side::White => Eval(score),
            Side::Black => Eval(-score),
        }
    }
}

pub fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => 100,
        Piece::Knight => 320,
        Piece::Bishop => 330,
        Piece::Rook => 500,
        Piece::Queen => 900,
        Piece::King => 0,
    }
}

const MAX_PHASE: i32 = 24;

/// 24 with all minor and major pieces on the board, 0 with only kings and pawns.
fn game_phase(position: &Position) -> i32 {
    let count = |piece| {
        (position.pieces_of(piece, Side::White) | position.pieces_of(piece, Side::Black))
            .num_squares_set() as i32
    };
    let phase = count(Piece::Knight)
        + count(Piece::Bishop)
        + 2 * count(Piece::Rook)
        + 4 * count(Piece::Queen);
    phase.min(MAX_PHASE)
}

/// Tables are laid out as seen from white's side, rank 8 first.
fn pst_index(square: Square, side: Side) -> usize {
    match side {
        Side::White => square.mirror().index(),
        Side::Black => square.index(),
    }
}

fn pst(piece: Piece) -> &'static [i32; 64] {
    match piece {
        Piece::Pawn => &PAWN_PST,
        Piece::Knight => &KNIGHT_PST,
        Piece::Bishop => &BISHOP_PST,
        Piece::Rook => &ROOK_PST,
        Piece::Queen => &QUEEN_PST,
        Piece::King => &KING_MIDDLEGAME_PST,
    }
}

#[rustfmt::skip]
const PAWN_PST: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_PST: [i32; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP_PST: [i32; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK_PST: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_PST: [i32; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5,  5,  5,  5,  0,-10,
     -5,  0,  5,  5,  5,  5,  0, -5,
      0,  0,  5,  5,  5,  5,  0, -5,
    -10,  5,  5,  5,  5,  5,  0,-10,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_MIDDLEGAME_PST: [i32; 64] = [
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -10,-20,-20,-20,-20,-20,-20,-10,
     20, 20,  0,  0,  0,  0, 20, 20,
     20, 30, 10,  0,  0, 10, 30, 20,
];

#[rustfmt::skip]
const KING_ENDGAME_PST: [i32; 64] = [
    -50,-40,-30,-20,-20,-30,-40,-50,
    -30,-20,-10,  0,  0,-10,-20,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-30,  0,  0,  0,  0,-30,-30,
    -50,-30,-30,-30,-30,-30,-30,-50,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::START_FEN;
    use test_case::test_case;
    use testresult::TestResult;

    #[test]
    fn test_start_is_balanced() -> TestResult {
        assert_eq!(POSITION_EVALUATOR.evaluate(&Position::from_fen(START_FEN)?), Eval::DRAW);
        Ok(())
    }

    #[test]
    fn test_score_is_from_side_to_move() -> TestResult {
        let white = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1")?;
        let black = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 b - - 0 1")?;

        let white_eval = POSITION_EVALUATOR.evaluate(&white);
        assert!(white_eval > Eval(800));
        assert_eq!(POSITION_EVALUATOR.evaluate(&black), -white_eval);
        Ok(())
    }

    #[test]
    fn test_mirrored_positions_score_equal() -> TestResult {
        let white = Position::from_fen("r3k3/pp6/8/8/4N3/8/5PPP/6K1 w - - 0 1")?;
        let black = Position::from_fen("6k1/5ppp/8/4n3/8/8/PP6/R3K3 b - - 0 1")?;
        assert_eq!(
            POSITION_EVALUATOR.evaluate(&white),
            POSITION_EVALUATOR.evaluate(&black)
        );
        Ok(())
    }

    #[test]
    fn test_king_prefers_center_in_endgame() -> TestResult {
        let center = Position::from_fen("4k3/8/8/8/3K4/8/8/8 w - - 0 1")?;
        let corner = Position::from_fen("4k3/8/8/8/8/8/8/K7 w - - 0 1")?;
        assert!(POSITION_EVALUATOR.evaluate(&center) > POSITION_EVALUATOR.evaluate(&corner));
        Ok(())
    }

    #[test_case(Eval(35), "cp 35" ; "centipawns")]
    #[test_case(Eval(-120), "cp -120" ; "negative centipawns")]
    #[test_case(Eval::CHECKMATE - 1, "mate 1" ; "mate in one")]
    #[test_case(Eval::CHECKMATE - 5, "mate 3" ; "mate in three")]
    #[test_case(Eval::mated_in(2), "mate -1" ; "mated in one")]
    #[test_case(Eval::mated_in(0), "mate 0" ; "already mated")]
    fn test_display(eval: Eval, want: &str) {
        assert_eq!(eval.to_string(), want);
    }

    #[test]
    fn test_mate_bound() {
        assert!(Eval::mated_in(40).is_mate());
        assert!(!Eval(Eval::MATE_BOUND.value() - 1).is_mate());
        assert!(Eval::CHECKMATE < Eval::INFINITY);
    }
}
