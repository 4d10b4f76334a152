//! Read-only attack lookups. Leaping pieces use per-square tables; sliding
//! pieces go through [`SlidingAttacks`] so the algorithm can be swapped.

mod hyperbola_quintessence;
mod leaping_pieces;
mod ray_scan;

use crate::bitboard::{BitBoard, Square};

pub use hyperbola_quintessence::HyperbolaQuintessence;
pub use leaping_pieces::{king_attacks, knight_attacks, pawn_attacks};
pub use ray_scan::RayScan;

pub trait SlidingAttacks {
    fn bishop_attacks(&self, square: Square, occupancy: BitBoard) -> BitBoard;
    fn rook_attacks(&self, square: Square, occupancy: BitBoard) -> BitBoard;

    fn queen_attacks(&self, square: Square, occupancy: BitBoard) -> BitBoard {
        self.bishop_attacks(square, occupancy) | self.rook_attacks(square, occupancy)
    }
}

/// Implementation used by move generation and attack queries.
pub type DefaultSlidingAttacks = HyperbolaQuintessence;

const SLIDING_ATTACKS: DefaultSlidingAttacks = HyperbolaQuintessence;

pub fn bishop_attacks(square: Square, occupancy: BitBoard) -> BitBoard {
    SLIDING_ATTACKS.bishop_attacks(square, occupancy)
}

pub fn rook_attacks(square: Square, occupancy: BitBoard) -> BitBoard {
    SLIDING_ATTACKS.rook_attacks(square, occupancy)
}

pub fn queen_attacks(square: Square, occupancy: BitBoard) -> BitBoard {
    SLIDING_ATTACKS.queen_attacks(square, occupancy)
}
