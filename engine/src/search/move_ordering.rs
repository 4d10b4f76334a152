use crate::position::{Move, MoveKind, MoveList, Piece, Position};

/// Priority given to the transposition table's move.
pub const HINT_PRIORITY: i32 = 99;

/// Rows are the moving piece, columns the captured piece with nothing first.
#[rustfmt::skip]
const CAPTURE_PRIORITY: [[i32; 6]; 6] = [
    //  -   P   N   B   R   Q
    [40, 31, 47, 48, 54, 58], // pawn
    [43, 24, 36, 37, 52, 57], // knight
    [42, 23, 35, 34, 51, 56], // bishop
    [38, 22, 27, 28, 32, 53], // rook
    [39, 21, 25, 26, 29, 33], // queen
    [30, 46, 49, 50, 55, 59], // king
];

fn piece_row(piece: Piece) -> usize {
    match piece {
        Piece::Pawn => 0,
        Piece::Knight => 1,
        Piece::Bishop => 2,
        Piece::Rook => 3,
        Piece::Queen => 4,
        Piece::King => 5,
    }
}

fn special_bonus(kind: MoveKind) -> i32 {
    match kind {
        MoveKind::Normal => 0,
        MoveKind::PromoteKnight => -39,
        MoveKind::PromoteBishop => -40,
        MoveKind::PromoteRook => -38,
        MoveKind::PromoteQueen => 20,
        MoveKind::CastleKingside => 15,
        MoveKind::CastleQueenside => 14,
        MoveKind::DoublePawnPush => 1,
        MoveKind::EnPassant => 0,
    }
}

impl Position {
    /// Sort key for `mve`, higher searches first. Never stored with the move.
    pub fn move_priority(&self, mve: Move, hint: Option<Move>) -> i32 {
        if hint == Some(mve) {
            return HINT_PRIORITY;
        }

        let Some((mover, _)) = self.is_piece_at(mve.src) else {
            return 0;
        };
        let captured_column = match (mve.kind, self.is_piece_at(mve.dest)) {
            (MoveKind::EnPassant, _) => 1 + piece_row(Piece::Pawn),
            (_, Some((captured, _))) => 1 + piece_row(captured),
            (_, None) => 0,
        };

        CAPTURE_PRIORITY[piece_row(mover)][captured_column] + special_bonus(mve.kind)
    }

    /// Stable sort by descending priority.
    pub fn order_moves(&self, moves: &mut MoveList, hint: Option<Move>) {
        moves.sort_by_cached_key(|&mve| std::cmp::Reverse(self.move_priority(mve, hint)));
    }
}
