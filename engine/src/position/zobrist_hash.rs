use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bitboard::Square;
use crate::position::{CastlingRights, Piece, Side, State};

const RNG_SEED: u64 = 123456789;

/// Standard xorshift64 step.
const fn xorshift(mut x: u64) -> u64 {
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}

struct ZobristKeys {
    pieces: [u64; 64 * 12],
    black_to_move: u64,
    castling_rights: [u64; 4],
    en_passant_file: [u64; 8],
}

impl ZobristKeys {
    const fn init() -> Self {
        let mut rng = RNG_SEED;

        let mut pieces = [0; 64 * 12];
        let mut i = 0;
        while i < pieces.len() {
            rng = xorshift(rng);
            pieces[i] = rng;
            i += 1;
        }

        rng = xorshift(rng);
        let black_to_move = rng;

        let mut castling_rights = [0; 4];
        let mut i = 0;
        while i < castling_rights.len() {
            rng = xorshift(rng);
            castling_rights[i] = rng;
            i += 1;
        }

        let mut en_passant_file = [0; 8];
        let mut i = 0;
        while i < en_passant_file.len() {
            rng = xorshift(rng);
            en_passant_file[i] = rng;
            i += 1;
        }

        Self {
            pieces,
            black_to_move,
            castling_rights,
            en_passant_file,
        }
    }
}

static ZOBRIST_KEYS: ZobristKeys = ZobristKeys::init();

fn piece_key(square: Square, piece: Piece, side: Side) -> u64 {
    let bb_idx = piece as usize + side as usize * 6;
    ZOBRIST_KEYS.pieces[bb_idx * 64 + square as usize]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub struct ZobristHash(u64);

impl fmt::Display for ZobristHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl ZobristHash {
    pub const fn value(self) -> u64 {
        self.0
    }

    pub const fn from_value(value: u64) -> ZobristHash {
        ZobristHash(value)
    }

    /// Recomputes the hash from scratch. The incrementally maintained hash must
    /// always equal this.
    pub(crate) fn calculate(board: &[Option<(Piece, Side)>; 64], state: &State) -> ZobristHash {
        let mut hash = ZobristHash(0);

        for (idx, slot) in board.iter().enumerate() {
            if let Some((piece, side)) = *slot {
                hash.toggle_piece(Square::from_index(idx), piece, side);
            }
        }

        if state.to_move == Side::Black {
            hash.flip_side_to_move();
        }

        hash.flip_castling_rights(&state.castling_rights);

        if let Some(en_passant_target) = state.en_passant_target {
            hash.flip_en_passant_file(en_passant_target);
        }

        hash
    }

    /// Adding and removing a piece are the same operation.
    pub(crate) fn toggle_piece(&mut self, square: Square, piece: Piece, side: Side) {
        self.0 ^= piece_key(square, piece, side);
    }

    pub(crate) fn move_piece(&mut self, src: Square, dest: Square, piece: Piece, side: Side) {
        self.0 ^= piece_key(src, piece, side) ^ piece_key(dest, piece, side);
    }

    pub(crate) fn flip_side_to_move(&mut self) {
        self.0 ^= ZOBRIST_KEYS.black_to_move;
    }

    /// Toggles every right that is set in `rights`. Passing the XOR of the old
    /// and new rights applies exactly the changes.
    pub(crate) fn flip_castling_rights(&mut self, rights: &CastlingRights) {
        let flags = [
            rights.white_king_side,
            rights.white_queen_side,
            rights.black_king_side,
            rights.black_queen_side,
        ];
        for (key, _) in ZOBRIST_KEYS
            .castling_rights
            .iter()
            .zip(flags)
            .filter(|(_, set)| *set)
        {
            self.0 ^= key;
        }
    }

    pub(crate) fn flip_en_passant_file(&mut self, en_passant_square: Square) {
        self.0 ^= ZOBRIST_KEYS.en_passant_file[en_passant_square.file() as usize];
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::bitboard::Square::*;

    #[test]
    fn test_piece_keys_are_distinct() {
        let keys: HashSet<u64> = ZOBRIST_KEYS.pieces.iter().copied().collect();
        assert_eq!(keys.len(), ZOBRIST_KEYS.pieces.len());
    }

    #[test]
    fn test_toggle_is_own_inverse() {
        let mut hash = ZobristHash::default();
        hash.toggle_piece(E4, Piece::Knight, Side::Black);
        assert_ne!(hash, ZobristHash::default());
        hash.toggle_piece(E4, Piece::Knight, Side::Black);
        assert_eq!(hash, ZobristHash::default());
    }

    #[test]
    fn test_move_piece_matches_toggles() {
        let mut moved = ZobristHash::default();
        moved.move_piece(G1, F3, Piece::Knight, Side::White);

        let mut toggled = ZobristHash::default();
        toggled.toggle_piece(G1, Piece::Knight, Side::White);
        toggled.toggle_piece(F3, Piece::Knight, Side::White);

        assert_eq!(moved, toggled);
    }
}
