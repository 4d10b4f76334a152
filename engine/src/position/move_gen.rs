use arrayvec::ArrayVec;

use crate::attack_tables::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, rook_attacks,
};
use crate::bitboard::{BitBoard, Square};
use crate::position::{
    castling_squares, en_passant_capture_square, Move, MoveKind, Piece, Position, Side,
};

/// Large enough for any pseudo-legal move list.
pub type MoveList = ArrayVec<Move, 256>;

impl Position {
    pub fn generate_legal_moves(&self) -> MoveList {
        self.generate_moves(false)
    }

    /// Legal captures, en passant captures and promotions.
    pub fn generate_captures(&self) -> MoveList {
        self.generate_moves(true)
    }

    fn generate_moves(&self, captures_only: bool) -> MoveList {
        let mut moves = MoveList::new();
        self.gen_pseudo_legal_moves(&mut moves, captures_only);
        moves.retain(|mve| !self.leaves_king_in_check(*mve));
        moves
    }

    pub fn is_square_attacked(&self, square: Square, by_side: Side) -> bool {
        self.is_square_attacked_with(square, by_side, self.occupancy(), !BitBoard::empty())
    }

    pub fn is_king_in_check(&self, side: Side) -> bool {
        self.is_square_attacked(self.king_square(side), side.opposite_side())
    }

    /// Enemy pieces attacking the king of the side to move.
    pub fn checkers(&self) -> BitBoard {
        let side = self.state.to_move;
        let square = self.king_square(side);
        let occupancy = self.occupancy();
        let enemies = |piece: Piece| self.pieces.get(piece).get(side.opposite_side());
        let queens = enemies(Piece::Queen);

        (bishop_attacks(square, occupancy) & (enemies(Piece::Bishop) | queens))
            | (rook_attacks(square, occupancy) & (enemies(Piece::Rook) | queens))
            | (knight_attacks(square) & enemies(Piece::Knight))
            | (pawn_attacks(square, side) & enemies(Piece::Pawn))
    }

    /// Attack query against an arbitrary occupancy. Only attackers inside
    /// `attacker_mask` are considered.
    fn is_square_attacked_with(
        &self,
        square: Square,
        by_side: Side,
        occupancy: BitBoard,
        attacker_mask: BitBoard,
    ) -> bool {
        let attackers = |piece: Piece| self.pieces.get(piece).get(by_side) & attacker_mask;
        let queens = attackers(Piece::Queen);

        !(bishop_attacks(square, occupancy) & (attackers(Piece::Bishop) | queens)).is_empty()
            || !(rook_attacks(square, occupancy) & (attackers(Piece::Rook) | queens)).is_empty()
            || !(knight_attacks(square) & attackers(Piece::Knight)).is_empty()
            || !(king_attacks(square) & attackers(Piece::King)).is_empty()
            || !(pawn_attacks(square, by_side.opposite_side()) & attackers(Piece::Pawn))
                .is_empty()
    }

    /// Self-check filter. Only the occupancy delta of the move is applied, to
    /// copies of the bitboards, so nothing has to be undone afterwards.
    fn leaves_king_in_check(&self, mve: Move) -> bool {
        let side = self.state.to_move;
        let moves_king = matches!(self.is_piece_at(mve.src), Some((Piece::King, _)));

        let dest_bb = BitBoard::from_square(mve.dest);
        let mut occupancy = (self.occupancy() & !BitBoard::from_square(mve.src)) | dest_bb;
        let mut captured = dest_bb;

        if mve.kind == MoveKind::EnPassant {
            let captured_pawn = BitBoard::from_square(en_passant_capture_square(mve.src, mve.dest));
            occupancy &= !captured_pawn;
            captured |= captured_pawn;
        }

        let king_square = if moves_king {
            mve.dest
        } else {
            self.king_square(side)
        };

        self.is_square_attacked_with(king_square, side.opposite_side(), occupancy, !captured)
    }

    fn gen_pseudo_legal_moves(&self, moves: &mut MoveList, captures_only: bool) {
        let side = self.state.to_move;
        let occupancy = self.occupancy();
        let targets = if captures_only {
            self.sides.get(side.opposite_side())
        } else {
            !self.sides.get(side)
        };

        let piece_moves = |piece: Piece, src: Square| match piece {
            Piece::Knight => knight_attacks(src),
            Piece::Bishop => bishop_attacks(src, occupancy),
            Piece::Rook => rook_attacks(src, occupancy),
            Piece::Queen => queen_attacks(src, occupancy),
            Piece::King => king_attacks(src),
            Piece::Pawn => BitBoard::empty(),
        };

        for piece in [
            Piece::Knight,
            Piece::Bishop,
            Piece::Rook,
            Piece::Queen,
            Piece::King,
        ] {
            for src in self.pieces.get(piece).get(side).squares() {
                for dest in (piece_moves(piece, src) & targets).squares() {
                    moves.push(Move::new(src, dest));
                }
            }
        }

        self.gen_pawn_moves(moves, captures_only);

        if !captures_only {
            self.gen_castling_moves(moves);
        }
    }

    fn gen_pawn_moves(&self, moves: &mut MoveList, captures_only: bool) {
        let side = self.state.to_move;
        let occupancy = self.occupancy();
        let enemies = self.sides.get(side.opposite_side());
        let (rank_step, double_push_rank, promotion_rank): (i8, u8, u8) = match side {
            Side::White => (1, 1, 7),
            Side::Black => (-1, 6, 0),
        };
        let forward = |square: Square| {
            Square::from_rank_file((square.rank() as i8 + rank_step) as u8, square.file())
        };

        let push_with_promotions = |moves: &mut MoveList, src: Square, dest: Square| {
            if dest.rank() == promotion_rank {
                for kind in MoveKind::PROMOTIONS {
                    moves.push(Move::with_kind(src, dest, kind));
                }
            } else {
                moves.push(Move::new(src, dest));
            }
        };

        for src in self.pieces.get(Piece::Pawn).get(side).squares() {
            if let Some(single) = forward(src).filter(|&sq| !occupancy.is_square_set(sq)) {
                if single.rank() == promotion_rank {
                    push_with_promotions(moves, src, single);
                } else if !captures_only {
                    moves.push(Move::new(src, single));

                    if src.rank() == double_push_rank {
                        if let Some(double) =
                            forward(single).filter(|&sq| !occupancy.is_square_set(sq))
                        {
                            moves.push(Move::with_kind(src, double, MoveKind::DoublePawnPush));
                        }
                    }
                }
            }

            let attacks = pawn_attacks(src, side);
            for dest in (attacks & enemies).squares() {
                push_with_promotions(moves, src, dest);
            }

            if let Some(target) = self.state.en_passant_target {
                if attacks.is_square_set(target) {
                    moves.push(Move::with_kind(src, target, MoveKind::EnPassant));
                }
            }
        }
    }

    /// The king's destination square is not checked here. A castle into check
    /// is generated and then removed by the self-check filter like any other
    /// move that leaves the king attacked.
    fn gen_castling_moves(&self, moves: &mut MoveList) {
        let side = self.state.to_move;
        let opponent = side.opposite_side();
        let occupancy = self.occupancy();

        let mut king_attacked = None;

        for kind in [MoveKind::CastleKingside, MoveKind::CastleQueenside] {
            if !self.state.castling_rights.get(side, kind) {
                continue;
            }

            let squares = castling_squares(side, kind == MoveKind::CastleKingside);
            if self.is_piece_at(squares.king_src) != Some((Piece::King, side))
                || self.is_piece_at(squares.rook_src) != Some((Piece::Rook, side))
                || !(occupancy & squares.between).is_empty()
            {
                continue;
            }

            let in_check = *king_attacked
                .get_or_insert_with(|| self.is_square_attacked(squares.king_src, opponent));
            if in_check || self.is_square_attacked(squares.pass_through, opponent) {
                continue;
            }

            moves.push(Move::with_kind(squares.king_src, squares.king_dest, kind));
        }
    }
}
