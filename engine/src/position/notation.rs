use crate::bitboard::Square;
use crate::position::{
    castling_squares, Move, MoveKind, Piece, Position, PositionError, Side, UndoToken,
};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MoveParseError {
    #[error("move text: want <from><to>[promotion] or a castling token, got {0:?}")]
    Malformed(String),

    #[error("move {0:?}: no piece at {1}")]
    NoPiece(String, Square),

    #[error("move {0:?}: origin and destination are the same square")]
    SameSquare(String),
}

/// Rejections from the shallow validator. Passing it does not make a move legal.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum IllegalMoveError {
    #[error("{0:?}: no piece on the origin square")]
    EmptyOrigin(Move),

    #[error("{0:?}: piece belongs to {1}, {2} is to move")]
    NotToMove(Move, Side, Side),

    #[error("{0:?}: destination holds a piece of the side to move")]
    OwnPieceOnDestination(Move),

    #[error("{0:?}: only a {1} can make this move")]
    WrongPiece(Move, Piece),

    #[error("{0:?}: promotions have to land on the back rank")]
    PromotionNotOnBackRank(Move),

    #[error("{0:?}: a pawn reaching the back rank has to promote")]
    MissingPromotion(Move),

    #[error("{0:?}: destination is not the en passant target")]
    NoEnPassantTarget(Move),

    #[error("{0:?}: castling right is gone")]
    NoCastlingRight(Move),

    #[error("{0:?}: squares between king and rook are occupied")]
    CastlingBlocked(Move),

    #[error("{0:?}: kings can't be captured")]
    KingCapture(Move),
}

impl Position {
    /// Parses coordinate notation (`e2e4`, `e7e8q`, `e2-e4`, `d4xe5`, `0-0`, `O-O-O`).
    /// Special-move tags are inferred from the board, nothing else is checked.
    pub fn parse_move(&self, text: &str) -> Result<Move, MoveParseError> {
        let mut normalized = text.trim().to_ascii_lowercase();
        let malformed = || MoveParseError::Malformed(text.to_string());

        let castle_kind = match normalized.as_str() {
            "0-0" | "o-o" => Some(MoveKind::CastleKingside),
            "0-0-0" | "o-o-o" => Some(MoveKind::CastleQueenside),
            _ => None,
        };
        if let Some(kind) = castle_kind {
            let squares = castling_squares(self.state.to_move, kind == MoveKind::CastleKingside);
            return Ok(Move::with_kind(squares.king_src, squares.king_dest, kind));
        }

        if !normalized.is_ascii() {
            Err(malformed())?
        }
        if normalized.len() > 4 && matches!(normalized.as_bytes()[2], b'-' | b'x') {
            normalized.remove(2);
        }
        if !(4..=5).contains(&normalized.len()) {
            Err(malformed())?
        }

        let src = Square::from_coordinate(&normalized[0..2]).ok_or_else(malformed)?;
        let dest = Square::from_coordinate(&normalized[2..4]).ok_or_else(malformed)?;
        let promotion = match normalized.as_bytes().get(4) {
            Some(&ch) => {
                let piece = Piece::try_from(ch as char).map_err(|_| malformed())?;
                Some(MoveKind::from_promotion(piece).ok_or_else(malformed)?)
            }
            None => None,
        };

        if src == dest {
            Err(MoveParseError::SameSquare(text.to_string()))?
        }
        let (piece, _) = self
            .is_piece_at(src)
            .ok_or_else(|| MoveParseError::NoPiece(text.to_string(), src))?;

        let kind = match (promotion, piece) {
            (Some(kind), _) => kind,
            (None, Piece::Pawn) if src.file() != dest.file() && self.is_piece_at(dest).is_none() => {
                MoveKind::EnPassant
            }
            (None, Piece::Pawn) if src.abs_diff(dest) == 16 => MoveKind::DoublePawnPush,
            (None, Piece::King) if src.rank() == dest.rank() && src.file().abs_diff(dest.file()) == 2 => {
                if dest.file() > src.file() {
                    MoveKind::CastleKingside
                } else {
                    MoveKind::CastleQueenside
                }
            }
            _ => MoveKind::Normal,
        };

        Ok(Move::with_kind(src, dest, kind))
    }

    /// Shallow checks on an externally supplied move: the right side moves, the
    /// destination holds neither the mover's piece nor a king, special tags go
    /// with the right piece and castling has a clear path. King safety and
    /// piece movement rules are not checked.
    pub fn validate_move(&self, mve: Move) -> Result<(), IllegalMoveError> {
        let to_move = self.state.to_move;
        let (piece, side) = self
            .is_piece_at(mve.src)
            .ok_or(IllegalMoveError::EmptyOrigin(mve))?;

        if side != to_move {
            Err(IllegalMoveError::NotToMove(mve, side, to_move))?
        }
        match self.is_piece_at(mve.dest) {
            Some((_, dest_side)) if dest_side == to_move => {
                Err(IllegalMoveError::OwnPieceOnDestination(mve))?
            }
            Some((Piece::King, _)) => Err(IllegalMoveError::KingCapture(mve))?,
            _ => {}
        }

        let back_rank = match to_move {
            Side::White => 7,
            Side::Black => 0,
        };

        match mve.kind {
            MoveKind::PromoteKnight
            | MoveKind::PromoteBishop
            | MoveKind::PromoteRook
            | MoveKind::PromoteQueen => {
                if piece != Piece::Pawn {
                    Err(IllegalMoveError::WrongPiece(mve, Piece::Pawn))?
                }
                if mve.dest.rank() != back_rank {
                    Err(IllegalMoveError::PromotionNotOnBackRank(mve))?
                }
            }
            MoveKind::EnPassant => {
                if piece != Piece::Pawn {
                    Err(IllegalMoveError::WrongPiece(mve, Piece::Pawn))?
                }
                if self.state.en_passant_target != Some(mve.dest) {
                    Err(IllegalMoveError::NoEnPassantTarget(mve))?
                }
            }
            MoveKind::DoublePawnPush => {
                if piece != Piece::Pawn {
                    Err(IllegalMoveError::WrongPiece(mve, Piece::Pawn))?
                }
            }
            MoveKind::CastleKingside | MoveKind::CastleQueenside => {
                if piece != Piece::King {
                    Err(IllegalMoveError::WrongPiece(mve, Piece::King))?
                }
                let squares = castling_squares(to_move, mve.kind == MoveKind::CastleKingside);
                if !self.state.castling_rights.get(to_move, mve.kind)
                    || mve.src != squares.king_src
                    || mve.dest != squares.king_dest
                    || self.is_piece_at(squares.rook_src) != Some((Piece::Rook, to_move))
                {
                    Err(IllegalMoveError::NoCastlingRight(mve))?
                }
                if !(self.occupancy() & squares.between).is_empty() {
                    Err(IllegalMoveError::CastlingBlocked(mve))?
                }
            }
            MoveKind::Normal => {
                if piece == Piece::Pawn && mve.dest.rank() == back_rank {
                    Err(IllegalMoveError::MissingPromotion(mve))?
                }
            }
        }

        Ok(())
    }

    /// Parses, validates and applies one coordinate move. Nothing changes on error.
    pub fn play_move(&mut self, text: &str) -> Result<UndoToken, PositionError> {
        let mve = self.parse_move(text)?;
        self.validate_move(mve)?;
        Ok(self.make_move(mve))
    }

    /// Builds the position reached by replaying `moves` from `fen`.
    pub fn from_fen_with_moves<S: AsRef<str>>(
        fen: &str,
        moves: impl IntoIterator<Item = S>,
    ) -> Result<Position, PositionError> {
        let mut position = Position::from_fen(fen)?;
        for mve in moves {
            // Replayed moves are permanent
            let _ = position.play_move(mve.as_ref())?;
        }
        Ok(position)
    }
}
