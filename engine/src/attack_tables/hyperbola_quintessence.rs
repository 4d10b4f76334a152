use std::sync::LazyLock;

use strum::IntoEnumIterator;

use crate::bitboard::{BitBoard, Square};

use super::SlidingAttacks;

#[derive(Debug, Clone, Copy, Default)]
struct LineMasks {
    file: BitBoard,
    diag: BitBoard,
    anti_diag: BitBoard,
}

/// Lines through each square, excluding the square itself.
static LINE_MASKS: LazyLock<[LineMasks; 64]> =
    LazyLock::new(|| std::array::from_fn(|idx| line_masks(Square::from_index(idx))));

/// Indexed by `file * 64 + inner six bits of the rank occupancy`.
static RANK_ATKS: LazyLock<[u8; 8 * 64]> = LazyLock::new(|| {
    std::array::from_fn(|idx| rank_attacks_for((idx / 64) as u8, (idx % 64) as u8))
});

fn line_masks(square: Square) -> LineMasks {
    let rank = square.rank() as i8;
    let file = square.file() as i8;

    let mut masks = LineMasks::default();
    for other in Square::iter().filter(|&other| other != square) {
        let rank_diff = other.rank() as i8 - rank;
        let file_diff = other.file() as i8 - file;

        if file_diff == 0 {
            masks.file.set_square(other);
        }
        if rank_diff == file_diff {
            masks.diag.set_square(other);
        }
        if rank_diff == -file_diff {
            masks.anti_diag.set_square(other);
        }
    }
    masks
}

fn rank_attacks_for(file: u8, inner_occupancy: u8) -> u8 {
    let occupancy = inner_occupancy << 1;
    let mut atks = 0;

    for f in (file + 1)..8 {
        atks |= 1 << f;
        if occupancy & (1 << f) != 0 {
            break;
        }
    }
    for f in (0..file).rev() {
        atks |= 1 << f;
        if occupancy & (1 << f) != 0 {
            break;
        }
    }
    atks
}

/// Sliding attacks using the o^(o-2r) trick. Byte swapping mirrors the board
/// vertically, so it only works for lines with one square per rank; rank
/// attacks come from a lookup table instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct HyperbolaQuintessence;

impl HyperbolaQuintessence {
    fn line_attacks(occupancy: BitBoard, mask: BitBoard, square: Square) -> BitBoard {
        let bit = BitBoard::from_square(square);
        let mut forward = occupancy & mask;
        let mut reverse = forward.swap_bytes();
        forward -= bit;
        reverse -= bit.swap_bytes();
        forward ^= reverse.swap_bytes();
        forward & mask
    }

    fn rank_attacks(occupancy: BitBoard, square: Square) -> BitBoard {
        let rank_shift = square.rank() * 8;
        let inner_occupancy = ((occupancy.to_val() >> (rank_shift + 1)) & 63) as usize;
        let atks = RANK_ATKS[square.file() as usize * 64 + inner_occupancy] as u64;
        BitBoard::from_val(atks << rank_shift)
    }
}

impl SlidingAttacks for HyperbolaQuintessence {
    fn bishop_attacks(&self, square: Square, occupancy: BitBoard) -> BitBoard {
        let masks = &LINE_MASKS[square.index()];
        Self::line_attacks(occupancy, masks.diag, square)
            | Self::line_attacks(occupancy, masks.anti_diag, square)
    }

    fn rook_attacks(&self, square: Square, occupancy: BitBoard) -> BitBoard {
        let masks = &LINE_MASKS[square.index()];
        Self::line_attacks(occupancy, masks.file, square) | Self::rank_attacks(occupancy, square)
    }
}
