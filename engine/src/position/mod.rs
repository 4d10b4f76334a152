use std::fmt;
use std::ops::BitXor;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::bitboard::Square::*;
use crate::bitboard::{BitBoard, Square};

mod fen;
mod move_gen;
mod notation;
mod zobrist_hash;

pub use fen::{FenParseError, START_FEN};
pub use move_gen::MoveList;
pub use notation::{IllegalMoveError, MoveParseError};
pub use zobrist_hash::ZobristHash;

/// Half-move clock value at which the game is drawn.
pub const DRAW_HALF_MOVE_CLOCK: u16 = 100;

#[derive(thiserror::Error, Debug)]
pub enum PositionError {
    #[error("char -> piece: got {0}")]
    FromCharPiece(char),

    #[error(transparent)]
    Fen(#[from] FenParseError),

    #[error(transparent)]
    MoveParse(#[from] MoveParseError),

    #[error(transparent)]
    IllegalMove(#[from] IllegalMoveError),
}

#[derive(Debug, PartialEq, Eq, EnumIter, Clone, Copy, Display, Hash, Deserialize, Serialize)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite_side(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

#[derive(Debug, PartialEq, Eq, EnumIter, Clone, Copy, Display, Hash, Deserialize, Serialize)]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl From<Piece> for char {
    fn from(piece: Piece) -> char {
        match piece {
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            Piece::Queen => 'q',
            Piece::King => 'k',
        }
    }
}

impl TryFrom<char> for Piece {
    type Error = PositionError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            'p' => Ok(Piece::Pawn),
            'n' => Ok(Piece::Knight),
            'b' => Ok(Piece::Bishop),
            'r' => Ok(Piece::Rook),
            'q' => Ok(Piece::Queen),
            'k' => Ok(Piece::King),
            _ => Err(PositionError::FromCharPiece(value)),
        }
    }
}

/// Special-move tag carried by every [`Move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum MoveKind {
    #[default]
    Normal,
    PromoteKnight,
    PromoteBishop,
    PromoteRook,
    PromoteQueen,
    CastleKingside,
    CastleQueenside,
    DoublePawnPush,
    EnPassant,
}

impl MoveKind {
    /// Generation order for promotions, strongest first.
    pub const PROMOTIONS: [MoveKind; 4] = [
        MoveKind::PromoteQueen,
        MoveKind::PromoteRook,
        MoveKind::PromoteBishop,
        MoveKind::PromoteKnight,
    ];

    pub fn promotion(self) -> Option<Piece> {
        match self {
            MoveKind::PromoteKnight => Some(Piece::Knight),
            MoveKind::PromoteBishop => Some(Piece::Bishop),
            MoveKind::PromoteRook => Some(Piece::Rook),
            MoveKind::PromoteQueen => Some(Piece::Queen),
            _ => None,
        }
    }

    pub fn from_promotion(piece: Piece) -> Option<MoveKind> {
        match piece {
            Piece::Knight => Some(MoveKind::PromoteKnight),
            Piece::Bishop => Some(MoveKind::PromoteBishop),
            Piece::Rook => Some(MoveKind::PromoteRook),
            Piece::Queen => Some(MoveKind::PromoteQueen),
            Piece::Pawn | Piece::King => None,
        }
    }

    pub fn is_castle(self) -> bool {
        matches!(self, MoveKind::CastleKingside | MoveKind::CastleQueenside)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Move {
    pub src: Square,
    pub dest: Square,
    pub kind: MoveKind,
}

impl Move {
    pub const fn new(src: Square, dest: Square) -> Move {
        Self {
            src,
            dest,
            kind: MoveKind::Normal,
        }
    }

    pub const fn with_kind(src: Square, dest: Square, kind: MoveKind) -> Move {
        Self { src, dest, kind }
    }

    pub fn promotion(&self) -> Option<Piece> {
        self.kind.promotion()
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dest)?;
        if self.kind != MoveKind::Normal {
            write!(f, " ({:?})", self.kind)?;
        }
        Ok(())
    }
}

/// Coordinate notation, e.g. `e2e4` or `e7e8q`. Castling renders as the king's move.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            self.src.file_char(),
            self.src.rank_char(),
            self.dest.file_char(),
            self.dest.rank_char()
        )?;
        if let Some(promotion) = self.promotion() {
            write!(f, "{}", char::from(promotion))?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Sides {
    white: BitBoard,
    black: BitBoard,
}

impl Sides {
    fn new() -> Self {
        Self {
            white: BitBoard::empty(),
            black: BitBoard::empty(),
        }
    }

    pub(crate) fn get(&self, side: Side) -> BitBoard {
        match side {
            Side::White => self.white,
            Side::Black => self.black,
        }
    }

    fn get_mut(&mut self, side: Side) -> &mut BitBoard {
        match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Pieces {
    pawns: Sides,
    knights: Sides,
    bishops: Sides,
    rooks: Sides,
    queens: Sides,
    kings: Sides,
}

impl Pieces {
    fn new() -> Self {
        Self {
            pawns: Sides::new(),
            knights: Sides::new(),
            bishops: Sides::new(),
            rooks: Sides::new(),
            queens: Sides::new(),
            kings: Sides::new(),
        }
    }

    pub(crate) fn get(&self, piece: Piece) -> &Sides {
        match piece {
            Piece::Pawn => &self.pawns,
            Piece::Knight => &self.knights,
            Piece::Bishop => &self.bishops,
            Piece::Rook => &self.rooks,
            Piece::Queen => &self.queens,
            Piece::King => &self.kings,
        }
    }

    fn get_mut(&mut self, piece: Piece) -> &mut Sides {
        match piece {
            Piece::Pawn => &mut self.pawns,
            Piece::Knight => &mut self.knights,
            Piece::Bishop => &mut self.bishops,
            Piece::Rook => &mut self.rooks,
            Piece::Queen => &mut self.queens,
            Piece::King => &mut self.kings,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Deserialize, Serialize)]
pub struct CastlingRights {
    pub white_king_side: bool,
    pub white_queen_side: bool,
    pub black_king_side: bool,
    pub black_queen_side: bool,
}

impl CastlingRights {
    fn start() -> Self {
        Self::new(true, true, true, true)
    }

    pub const fn new(
        white_king_side: bool,
        white_queen_side: bool,
        black_king_side: bool,
        black_queen_side: bool,
    ) -> Self {
        Self {
            white_king_side,
            white_queen_side,
            black_king_side,
            black_queen_side,
        }
    }

    pub fn get(&self, side: Side, kind: MoveKind) -> bool {
        match (side, kind) {
            (Side::White, MoveKind::CastleKingside) => self.white_king_side,
            (Side::White, MoveKind::CastleQueenside) => self.white_queen_side,
            (Side::Black, MoveKind::CastleKingside) => self.black_king_side,
            (Side::Black, MoveKind::CastleQueenside) => self.black_queen_side,
            _ => false,
        }
    }

    /// Drops the rights tied to a king or rook home square once anything moves
    /// from or to it.
    fn revoke_for_square(&mut self, square: Square) {
        match square {
            A1 => self.white_queen_side = false,
            H1 => self.white_king_side = false,
            E1 => {
                self.white_king_side = false;
                self.white_queen_side = false;
            }
            A8 => self.black_queen_side = false,
            H8 => self.black_king_side = false,
            E8 => {
                self.black_king_side = false;
                self.black_queen_side = false;
            }
            _ => (),
        }
    }
}

impl BitXor for CastlingRights {
    type Output = CastlingRights;

    fn bitxor(self, rhs: Self) -> Self::Output {
        CastlingRights::new(
            self.white_king_side ^ rhs.white_king_side,
            self.white_queen_side ^ rhs.white_queen_side,
            self.black_king_side ^ rhs.black_king_side,
            self.black_queen_side ^ rhs.black_queen_side,
        )
    }
}

/// Fixed squares involved in one castling move.
pub(crate) struct CastlingSquares {
    pub(crate) king_src: Square,
    pub(crate) king_dest: Square,
    pub(crate) rook_src: Square,
    pub(crate) rook_dest: Square,
    /// The square the king crosses on its way to `king_dest`.
    pub(crate) pass_through: Square,
    /// Squares that must be empty.
    pub(crate) between: BitBoard,
}

pub(crate) fn castling_squares(side: Side, kingside: bool) -> CastlingSquares {
    match (side, kingside) {
        (Side::White, true) => CastlingSquares {
            king_src: E1,
            king_dest: G1,
            rook_src: H1,
            rook_dest: F1,
            pass_through: F1,
            between: BitBoard::from_squares(&[F1, G1]),
        },
        (Side::White, false) => CastlingSquares {
            king_src: E1,
            king_dest: C1,
            rook_src: A1,
            rook_dest: D1,
            pass_through: D1,
            between: BitBoard::from_squares(&[B1, C1, D1]),
        },
        (Side::Black, true) => CastlingSquares {
            king_src: E8,
            king_dest: G8,
            rook_src: H8,
            rook_dest: F8,
            pass_through: F8,
            between: BitBoard::from_squares(&[F8, G8]),
        },
        (Side::Black, false) => CastlingSquares {
            king_src: E8,
            king_dest: C8,
            rook_src: A8,
            rook_dest: D8,
            pass_through: D8,
            between: BitBoard::from_squares(&[B8, C8, D8]),
        },
    }
}

/// Square of the pawn removed by an en passant capture landing on `dest`.
pub(crate) fn en_passant_capture_square(src: Square, dest: Square) -> Square {
    Square::from_index(src.rank() as usize * 8 + dest.file() as usize)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct State {
    pub to_move: Side,
    pub half_move_clock: u16,
    pub en_passant_target: Option<Square>,
    pub castling_rights: CastlingRights,
    pub full_move_counter: u16,
}

impl State {
    fn start() -> Self {
        Self {
            to_move: Side::White,
            half_move_clock: 0,
            en_passant_target: None,
            castling_rights: CastlingRights::start(),
            full_move_counter: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct UndoRecord {
    mve: Move,
    captured_piece: Option<Piece>,
    state: State,
    zobrist_hash: ZobristHash,
}

/// Proof that a move was applied. It has to be handed back to
/// [`Position::unmake_move`] to take the move back.
#[must_use = "an applied move can only be taken back with its undo token"]
#[derive(Debug, PartialEq, Eq)]
pub struct UndoToken {
    mve: Move,
    depth: usize,
}

impl UndoToken {
    pub fn mve(&self) -> Move {
        self.mve
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate,
    Stalemate,
    FiftyMoveDraw,
}

#[derive(Clone)]
pub struct Position {
    pub state: State,
    pub(crate) sides: Sides,
    pub(crate) pieces: Pieces,
    board: [Option<(Piece, Side)>; 64],
    zobrist_hash: ZobristHash,
    history: Vec<UndoRecord>,
}

const BACK_RANK: [Piece; 8] = [
    Piece::Rook,
    Piece::Knight,
    Piece::Bishop,
    Piece::Queen,
    Piece::King,
    Piece::Bishop,
    Piece::Knight,
    Piece::Rook,
];

impl Position {
    /// No pieces. Callers place pieces and then call `refresh_hash`.
    fn empty(state: State) -> Self {
        Self {
            state,
            sides: Sides::new(),
            pieces: Pieces::new(),
            board: [None; 64],
            zobrist_hash: ZobristHash::default(),
            history: Vec::new(),
        }
    }

    pub fn start() -> Self {
        let mut position = Position::empty(State::start());
        for (file, &piece) in BACK_RANK.iter().enumerate() {
            position.put_piece(Square::from_index(file), piece, Side::White);
            position.put_piece(Square::from_index(8 + file), Piece::Pawn, Side::White);
            position.put_piece(Square::from_index(48 + file), Piece::Pawn, Side::Black);
            position.put_piece(Square::from_index(56 + file), piece, Side::Black);
        }
        position.refresh_hash();
        position
    }

    fn refresh_hash(&mut self) {
        self.zobrist_hash = ZobristHash::calculate(&self.board, &self.state);
    }

    pub fn is_piece_at(&self, square: Square) -> Option<(Piece, Side)> {
        self.board[square.index()]
    }

    pub fn zobrist_hash(&self) -> ZobristHash {
        self.zobrist_hash
    }

    /// Hash recomputed from the board and state, ignoring the incremental value.
    pub fn recalculate_hash(&self) -> ZobristHash {
        ZobristHash::calculate(&self.board, &self.state)
    }

    pub fn to_move(&self) -> Side {
        self.state.to_move
    }

    pub fn occupancy(&self) -> BitBoard {
        self.sides.white | self.sides.black
    }

    pub fn pieces_of(&self, piece: Piece, side: Side) -> BitBoard {
        self.pieces.get(piece).get(side)
    }

    pub fn side_pieces(&self, side: Side) -> BitBoard {
        self.sides.get(side)
    }

    pub(crate) fn king_square(&self, side: Side) -> Square {
        let kings = self.pieces.kings.get(side);
        debug_assert!(!kings.is_empty(), "no {side} king\n{self}");
        kings.get_lsb()
    }

    /// Number of applied moves that have not been taken back.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|record| record.mve)
    }

    /// True unless the last move captured or promoted. Also true with no history.
    pub fn last_move_was_quiet(&self) -> bool {
        self.history.last().map_or(true, |record| {
            record.captured_piece.is_none() && record.mve.promotion().is_none()
        })
    }

    pub fn is_draw_by_half_move_clock(&self) -> bool {
        self.state.half_move_clock >= DRAW_HALF_MOVE_CLOCK
    }

    pub fn status(&self) -> GameStatus {
        if self.generate_legal_moves().is_empty() {
            if self.is_king_in_check(self.state.to_move) {
                GameStatus::Checkmate
            } else {
                GameStatus::Stalemate
            }
        } else if self.is_draw_by_half_move_clock() {
            GameStatus::FiftyMoveDraw
        } else {
            GameStatus::Ongoing
        }
    }

    fn put_piece(&mut self, square: Square, piece: Piece, side: Side) {
        debug_assert!(self.board[square.index()].is_none(), "{square} occupied");
        self.board[square.index()] = Some((piece, side));
        self.sides.get_mut(side).set_square(square);
        self.pieces.get_mut(piece).get_mut(side).set_square(square);
        self.zobrist_hash.toggle_piece(square, piece, side);
    }

    fn take_piece(&mut self, square: Square) -> Option<(Piece, Side)> {
        let (piece, side) = self.board[square.index()].take()?;
        self.sides.get_mut(side).clear_square(square);
        self.pieces.get_mut(piece).get_mut(side).clear_square(square);
        self.zobrist_hash.toggle_piece(square, piece, side);
        Some((piece, side))
    }

    fn shift_piece(&mut self, src: Square, dest: Square, piece: Piece, side: Side) {
        debug_assert_eq!(self.board[src.index()], Some((piece, side)));
        self.board[src.index()] = None;
        self.board[dest.index()] = Some((piece, side));
        self.sides.get_mut(side).move_piece(src, dest);
        self.pieces.get_mut(piece).get_mut(side).move_piece(src, dest);
        self.zobrist_hash.move_piece(src, dest, piece, side);
    }

    /// Applies a generated or validated move.
    ///
    /// # Panics
    ///
    /// If there is no piece on the origin square.
    pub fn make_move(&mut self, mve: Move) -> UndoToken {
        let (piece, side) = match self.board[mve.src.index()] {
            Some(piece_side) => piece_side,
            None => panic!("no piece at {} for move {mve:?}\n{self}", mve.src),
        };
        debug_assert_eq!(side, self.state.to_move, "{mve:?} moves the wrong side");

        let prev_state = self.state;
        let prev_hash = self.zobrist_hash;

        let captured_square = if mve.kind == MoveKind::EnPassant {
            en_passant_capture_square(mve.src, mve.dest)
        } else {
            mve.dest
        };
        let captured_piece = self
            .take_piece(captured_square)
            .map(|(captured_piece, captured_side)| {
                debug_assert_eq!(captured_side, side.opposite_side(), "{mve:?} captures own piece");
                captured_piece
            });

        self.shift_piece(mve.src, mve.dest, piece, side);

        if let Some(promotion) = mve.promotion() {
            self.take_piece(mve.dest);
            self.put_piece(mve.dest, promotion, side);
        }

        if mve.kind.is_castle() {
            let squares = castling_squares(side, mve.kind == MoveKind::CastleKingside);
            self.shift_piece(squares.rook_src, squares.rook_dest, Piece::Rook, side);
        }

        if let Some(old_target) = self.state.en_passant_target {
            self.zobrist_hash.flip_en_passant_file(old_target);
        }
        self.state.en_passant_target = if mve.kind == MoveKind::DoublePawnPush {
            let target = Square::from_index((mve.src.index() + mve.dest.index()) / 2);
            self.zobrist_hash.flip_en_passant_file(target);
            Some(target)
        } else {
            None
        };

        let mut castling_rights = self.state.castling_rights;
        castling_rights.revoke_for_square(mve.src);
        castling_rights.revoke_for_square(mve.dest);
        self.zobrist_hash
            .flip_castling_rights(&(castling_rights ^ self.state.castling_rights));
        self.state.castling_rights = castling_rights;

        if piece == Piece::Pawn || captured_piece.is_some() {
            self.state.half_move_clock = 0;
        } else {
            self.state.half_move_clock = self.state.half_move_clock.saturating_add(1);
        }

        if side == Side::Black {
            self.state.full_move_counter = self.state.full_move_counter.saturating_add(1);
        }

        self.state.to_move = side.opposite_side();
        self.zobrist_hash.flip_side_to_move();

        self.history.push(UndoRecord {
            mve,
            captured_piece,
            state: prev_state,
            zobrist_hash: prev_hash,
        });

        #[cfg(debug_assertions)]
        self.validate();

        UndoToken {
            mve,
            depth: self.history.len(),
        }
    }

    /// Takes back the move `undo_token` was issued for. Tokens must be returned
    /// in the reverse order they were issued.
    ///
    /// # Panics
    ///
    /// If no move has been applied.
    pub fn unmake_move(&mut self, undo_token: UndoToken) {
        debug_assert_eq!(
            undo_token.depth,
            self.history.len(),
            "{:?} taken back out of order",
            undo_token.mve
        );
        let record = match self.history.pop() {
            Some(record) => record,
            None => panic!("no move to unmake for {:?}", undo_token.mve),
        };
        let mve = record.mve;
        debug_assert_eq!(mve, undo_token.mve);
        let side = record.state.to_move;

        if mve.kind.is_castle() {
            let squares = castling_squares(side, mve.kind == MoveKind::CastleKingside);
            self.shift_piece(squares.rook_dest, squares.rook_src, Piece::Rook, side);
        }

        if let Some((moved_piece, _)) = self.take_piece(mve.dest) {
            let piece = if mve.promotion().is_some() {
                Piece::Pawn
            } else {
                moved_piece
            };
            self.put_piece(mve.src, piece, side);
        }

        if let Some(captured_piece) = record.captured_piece {
            let captured_square = if mve.kind == MoveKind::EnPassant {
                en_passant_capture_square(mve.src, mve.dest)
            } else {
                mve.dest
            };
            self.put_piece(captured_square, captured_piece, side.opposite_side());
        }

        self.state = record.state;
        self.zobrist_hash = record.zobrist_hash;

        #[cfg(debug_assertions)]
        self.validate();
    }

    /// Checks that the bitboards, the board array and the hash agree.
    #[cfg(debug_assertions)]
    fn validate(&self) {
        use strum::IntoEnumIterator;

        let mut sides = Sides::new();
        let mut pieces = Pieces::new();
        for square in Square::iter() {
            if let Some((piece, side)) = self.board[square.index()] {
                sides.get_mut(side).set_square(square);
                pieces.get_mut(piece).get_mut(side).set_square(square);
            }
        }
        debug_assert_eq!(sides, self.sides, "side masks out of sync\n{self}");
        debug_assert_eq!(pieces, self.pieces, "piece masks out of sync\n{self}");
        debug_assert_eq!(
            self.zobrist_hash,
            self.recalculate_hash(),
            "hash out of sync\n{self}"
        );
    }
}

// History is ignored: positions reached by different move orders compare equal.
impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
            && self.sides == other.sides
            && self.pieces == other.pieces
            && self.board == other.board
            && self.zobrist_hash == other.zobrist_hash
    }
}

impl Eq for Position {}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut board_str = String::with_capacity(64 + 7);
        for (idx, square) in Square::list_white_perspective().into_iter().enumerate() {
            let ch = match self.is_piece_at(square) {
                Some((p, Side::White)) => char::from(p).to_ascii_uppercase(),
                Some((p, Side::Black)) => char::from(p),
                None => '.',
            };

            board_str.push(ch);
            if (idx + 1) % 8 == 0 && idx != 63 {
                board_str.push('\n');
            }
        }
        write!(f, "{}", board_str)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self, self.to_fen())
    }
}
