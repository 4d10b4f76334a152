use crate::bitboard::{BitBoard, Square};

use super::SlidingAttacks;

const BISHOP_RAYS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROOK_RAYS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Walks each ray square by square until it leaves the board or hits a piece.
#[derive(Debug, Clone, Copy, Default)]
pub struct RayScan;

impl RayScan {
    fn scan(square: Square, occupancy: BitBoard, rays: &[(i8, i8)]) -> BitBoard {
        let mut atks = BitBoard::empty();

        for &(rank_step, file_step) in rays {
            let mut rank = square.rank() as i8 + rank_step;
            let mut file = square.file() as i8 + file_step;

            // Negative coordinates wrap to large u8 values and are rejected
            while let Some(target) = Square::from_rank_file(rank as u8, file as u8) {
                atks.set_square(target);
                if occupancy.is_square_set(target) {
                    break;
                }
                rank += rank_step;
                file += file_step;
            }
        }
        atks
    }
}

impl SlidingAttacks for RayScan {
    fn bishop_attacks(&self, square: Square, occupancy: BitBoard) -> BitBoard {
        Self::scan(square, occupancy, &BISHOP_RAYS)
    }

    fn rook_attacks(&self, square: Square, occupancy: BitBoard) -> BitBoard {
        Self::scan(square, occupancy, &ROOK_RAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitboard::Square::*;
    use test_case::test_case;

    #[test_case(A1, BitBoard::from_squares(&[C3]), BitBoard::from_squares(&[B2, C3]) ; "corner")]
    #[test_case(H8, BitBoard::empty(), BitBoard::from_squares(&[G7, F6, E5, D4, C3, B2, A1]) ; "open")]
    fn test_bishop_attacks(square: Square, occupancy: BitBoard, want: BitBoard) {
        assert_eq!(RayScan.bishop_attacks(square, occupancy), want);
    }

    #[test_case(A1, BitBoard::from_squares(&[A3, C1]), BitBoard::from_squares(&[A2, A3, B1, C1]) ; "corner")]
    fn test_rook_attacks(square: Square, occupancy: BitBoard, want: BitBoard) {
        assert_eq!(RayScan.rook_attacks(square, occupancy), want);
    }
}
