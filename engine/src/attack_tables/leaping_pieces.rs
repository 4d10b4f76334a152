use std::sync::LazyLock;

use crate::bitboard::{BitBoard, Direction, Square};
use crate::position::Side;

use Direction::*;

type SquareTable = [BitBoard; 64];

const KNIGHT_SHIFTS: &[&[Direction]] = &[
    &[IncRank, IncRank, IncFile],
    &[IncRank, IncRank, DecFile],
    &[DecRank, DecRank, IncFile],
    &[DecRank, DecRank, DecFile],
    &[IncRank, IncFile, IncFile],
    &[IncRank, DecFile, DecFile],
    &[DecRank, IncFile, IncFile],
    &[DecRank, DecFile, DecFile],
];

const KING_SHIFTS: &[&[Direction]] = &[
    &[IncRank],
    &[IncFile],
    &[DecFile],
    &[DecRank],
    &[IncRank, IncFile],
    &[IncRank, DecFile],
    &[DecRank, IncFile],
    &[DecRank, DecFile],
];

const WHITE_PAWN_SHIFTS: &[&[Direction]] = &[&[IncRank, IncFile], &[IncRank, DecFile]];
const BLACK_PAWN_SHIFTS: &[&[Direction]] = &[&[DecRank, IncFile], &[DecRank, DecFile]];

fn square_table(shifts: &[&[Direction]]) -> SquareTable {
    std::array::from_fn(|idx| BitBoard::from_square_shifts(Square::from_index(idx), shifts))
}

static KNIGHT_ATKS: LazyLock<SquareTable> = LazyLock::new(|| square_table(KNIGHT_SHIFTS));
static KING_ATKS: LazyLock<SquareTable> = LazyLock::new(|| square_table(KING_SHIFTS));
static PAWN_ATKS: LazyLock<[SquareTable; 2]> = LazyLock::new(|| {
    [
        square_table(WHITE_PAWN_SHIFTS),
        square_table(BLACK_PAWN_SHIFTS),
    ]
});

pub fn knight_attacks(square: Square) -> BitBoard {
    KNIGHT_ATKS[square.index()]
}

pub fn king_attacks(square: Square) -> BitBoard {
    KING_ATKS[square.index()]
}

/// Squares a pawn of `side` standing on `square` attacks.
pub fn pawn_attacks(square: Square, side: Side) -> BitBoard {
    PAWN_ATKS[side as usize][square.index()]
}
