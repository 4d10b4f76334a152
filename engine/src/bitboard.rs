use std::fmt;
use std::ops::{
    BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not, Sub, SubAssign,
};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, FromRepr};

#[rustfmt::skip]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumString, FromRepr, Display, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum Square {
    A1, B1, C1, D1, E1, F1, G1, H1,
    A2, B2, C2, D2, E2, F2, G2, H2,
    A3, B3, C3, D3, E3, F3, G3, H3,
    A4, B4, C4, D4, E4, F4, G4, H4,
    A5, B5, C5, D5, E5, F5, G5, H5,
    A6, B6, C6, D6, E6, F6, G6, H6,
    A7, B7, C7, D7, E7, F7, G7, H7,
    A8, B8, C8, D8, E8, F8, G8, H8,
}

use Square::*;

#[rustfmt::skip]
const SQUARES: [Square; 64] = [
    A1, B1, C1, D1, E1, F1, G1, H1,
    A2, B2, C2, D2, E2, F2, G2, H2,
    A3, B3, C3, D3, E3, F3, G3, H3,
    A4, B4, C4, D4, E4, F4, G4, H4,
    A5, B5, C5, D5, E5, F5, G5, H5,
    A6, B6, C6, D6, E6, F6, G6, H6,
    A7, B7, C7, D7, E7, F7, G7, H7,
    A8, B8, C8, D8, E8, F8, G8, H8,
];

impl Square {
    /// Index is taken modulo 64.
    pub const fn from_index(idx: usize) -> Square {
        SQUARES[idx & 63]
    }

    pub const fn from_rank_file(rank: u8, file: u8) -> Option<Square> {
        if rank < 8 && file < 8 {
            Some(SQUARES[(rank * 8 + file) as usize])
        } else {
            None
        }
    }

    /// Parses lowercase coordinates such as `e4`.
    pub fn from_coordinate(coordinate: &str) -> Option<Square> {
        match coordinate.as_bytes() {
            &[file @ b'a'..=b'h', rank @ b'1'..=b'8'] => {
                Square::from_rank_file(rank - b'1', file - b'a')
            }
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn rank(self) -> u8 {
        self as u8 / 8
    }

    pub const fn file(self) -> u8 {
        self as u8 % 8
    }

    pub(crate) const fn abs_diff(self, other: Square) -> u8 {
        (self as u8).abs_diff(other as u8)
    }

    pub(crate) const fn file_char(self) -> char {
        (b'a' + self.file()) as char
    }

    pub(crate) const fn rank_char(self) -> char {
        (b'1' + self.rank()) as char
    }

    /// Vertical flip, A1 <-> A8.
    pub(crate) const fn mirror(self) -> Square {
        SQUARES[(self as usize) ^ 56]
    }

    #[rustfmt::skip]
    pub const fn list_white_perspective() -> [Square; 64] {
        [
            A8, B8, C8, D8, E8, F8, G8, H8,
            A7, B7, C7, D7, E7, F7, G7, H7,
            A6, B6, C6, D6, E6, F6, G6, H6,
            A5, B5, C5, D5, E5, F5, G5, H5,
            A4, B4, C4, D4, E4, F4, G4, H4,
            A3, B3, C3, D3, E3, F3, G3, H3,
            A2, B2, C2, D2, E2, F2, G2, H2,
            A1, B1, C1, D1, E1, F1, G1, H1,
        ]
    }
}

#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Direction {
    IncRank = 8,
    IncFile = 1,
    DecRank = -8,
    DecFile = -1,
}

#[derive(PartialEq, Eq, Clone, Copy, Default, Hash, Deserialize, Serialize)]
pub struct BitBoard(u64);

impl BitBoard {
    pub const fn empty() -> Self {
        BitBoard(0)
    }

    pub const fn from_square(square: Square) -> Self {
        BitBoard(1 << (square as u8))
    }

    pub fn from_squares(squares: &[Square]) -> Self {
        BitBoard(squares.iter().fold(0, |board, sq| board | 1 << (*sq as u8)))
    }

    pub const fn from_val(val: u64) -> Self {
        BitBoard(val)
    }

    pub const fn to_val(self) -> u64 {
        self.0
    }

    /// Union of `square` shifted along each direction path. Paths that leave the
    /// board contribute nothing.
    pub(crate) fn from_square_shifts(square: Square, shift_dirs_list: &[&[Direction]]) -> Self {
        let start = BitBoard::from_square(square);
        shift_dirs_list
            .iter()
            .fold(BitBoard::empty(), |acc, shift_dirs| {
                let shifted = shift_dirs
                    .iter()
                    .fold(start, |shifted, &dir| shifted.shift(dir));
                acc | shifted
            })
    }

    pub fn squares(self) -> BitBoardSquares {
        BitBoardSquares(self)
    }

    pub(crate) fn move_piece(&mut self, src: Square, dest: Square) {
        self.clear_square(src);
        self.set_square(dest);
    }

    pub(crate) fn set_square(&mut self, square: Square) {
        self.0 |= 1 << square as u64
    }

    pub(crate) fn clear_square(&mut self, square: Square) {
        self.0 &= !(1 << square as u64)
    }

    pub fn is_square_set(&self, square: Square) -> bool {
        self.0 & 1 << (square as u64) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub(crate) const fn shift(mut self, dir: Direction) -> BitBoard {
        const NOT_H_FILE: u64 = 0x7F7F7F7F7F7F7F7F;
        const NOT_A_FILE: u64 = 0xFEFEFEFEFEFEFEFE;
        match dir {
            Direction::IncFile => self.0 &= NOT_H_FILE,
            Direction::DecFile => self.0 &= NOT_A_FILE,
            _ => (),
        }
        let shift_amt = dir as i8;
        if shift_amt >= 0 {
            self.0 <<= shift_amt
        } else {
            self.0 >>= -shift_amt
        }
        self
    }

    /// Lowest set square. Callers must check `is_empty` first.
    pub(crate) fn get_lsb(&self) -> Square {
        debug_assert!(self.0 != 0, "want != 0, got 0");
        Square::from_index(self.0.trailing_zeros() as usize)
    }

    pub(crate) fn pop_lsb(&mut self) -> Square {
        let lsb = self.get_lsb();
        self.0 &= self.0 - 1;
        lsb
    }

    pub(crate) fn swap_bytes(&self) -> BitBoard {
        BitBoard(self.0.swap_bytes())
    }

    pub fn num_squares_set(self) -> u32 {
        self.0.count_ones()
    }
}

pub struct BitBoardSquares(BitBoard);

impl Iterator for BitBoardSquares {
    type Item = Square;

    fn next(&mut self) -> Option<Square> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.pop_lsb())
        }
    }
}

impl BitOr for BitBoard {
    type Output = BitBoard;

    fn bitor(self, other: BitBoard) -> BitBoard {
        BitBoard(self.0 | other.0)
    }
}

impl BitOrAssign for BitBoard {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0
    }
}

impl BitAnd for BitBoard {
    type Output = BitBoard;

    fn bitand(self, other: BitBoard) -> BitBoard {
        BitBoard(self.0 & other.0)
    }
}

impl BitAndAssign for BitBoard {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0
    }
}

impl BitXor for BitBoard {
    type Output = BitBoard;

    fn bitxor(self, other: BitBoard) -> BitBoard {
        BitBoard(self.0 ^ other.0)
    }
}

impl BitXorAssign for BitBoard {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0
    }
}

impl Not for BitBoard {
    type Output = BitBoard;

    fn not(self) -> Self::Output {
        BitBoard(!self.0)
    }
}

impl Sub for BitBoard {
    type Output = BitBoard;

    fn sub(self, other: BitBoard) -> Self::Output {
        Self(self.0.wrapping_sub(other.0))
    }
}

impl SubAssign for BitBoard {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.wrapping_sub(rhs.0)
    }
}

impl fmt::Debug for BitBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut board_str = String::with_capacity(64 + 7);

        for (idx, square) in Square::list_white_perspective().into_iter().enumerate() {
            board_str.push(if self.is_square_set(square) { 'X' } else { '.' });
            if (idx + 1) % 8 == 0 && idx != 63 {
                board_str.push('\n');
            }
        }

        write!(f, "{}", board_str)
    }
}
