use crate::bitboard::Square;
use crate::position::{CastlingRights, Piece, Position, Side, State};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FenParseError {
    #[error("num fields: want 6 got {0}")]
    NumFields(usize),

    #[error("piece placement: got {0}, err at {1}")]
    PiecePlacement(String, usize),

    #[error("piece placement: want exactly one {0} king, got {1}")]
    KingCount(Side, u32),

    #[error("side to move: want 'w'|'b' got {0}")]
    SideToMove(String),

    #[error("castling rights given: got {0}, err at idx {1}")]
    CastlingRights(String, usize),

    #[error("en passant target: got {0}")]
    EnPassantTarget(String),

    #[error("halfmove clock: want 0 <= x <= 65_535 got {0}")]
    HalfmoveClock(String),

    #[error("full move counter: want 0 <= x <= 65_535 got {0}")]
    FullMoveCounter(String),
}

impl Position {
    /// Builds a new position. Nothing is shared with any existing position, so a
    /// parse failure cannot leave one half-initialized.
    pub fn from_fen(fen: &str) -> Result<Self, FenParseError> {
        let fields = fen.split_whitespace().collect::<Vec<&str>>();

        if fields.len() != 6 {
            Err(FenParseError::NumFields(fields.len()))?
        }

        let to_move = match fields[1] {
            "w" => Side::White,
            "b" => Side::Black,
            _ => Err(FenParseError::SideToMove(String::from(fields[1])))?,
        };

        let half_move_clock = fields[4]
            .parse::<u16>()
            .map_err(|_| FenParseError::HalfmoveClock(fields[4].to_string()))?;

        let full_move_counter = fields[5]
            .parse::<u16>()
            .map_err(|_| FenParseError::FullMoveCounter(fields[5].to_string()))?;

        let state = State {
            castling_rights: castling_rights_from_fen(fields[2])?,
            en_passant_target: en_passant_target_from_fen(fields[3], to_move)?,
            half_move_clock,
            to_move,
            full_move_counter,
        };

        let mut position = Position::empty(state);
        place_pieces_from_fen(&mut position, fields[0])?;

        if let Some(target) = state.en_passant_target {
            // The pawn that just double pushed sits one rank past the target
            let pushed_pawn = Square::from_index(if to_move == Side::White {
                target.index() - 8
            } else {
                target.index() + 8
            });
            if position.is_piece_at(pushed_pawn) != Some((Piece::Pawn, to_move.opposite_side()))
            {
                Err(FenParseError::EnPassantTarget(fields[3].to_string()))?
            }
        }

        position.refresh_hash();
        Ok(position)
    }

    /// Replaces `self` only if `fen` parses.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), FenParseError> {
        *self = Position::from_fen(fen)?;
        Ok(())
    }

    pub fn to_fen(&self) -> String {
        let mut pieces = String::with_capacity(64);
        let mut curr_empty_count = 0;

        for (idx, sq) in Square::list_white_perspective().into_iter().enumerate() {
            if let Some((piece, side)) = self.is_piece_at(sq) {
                if curr_empty_count != 0 {
                    pieces += &curr_empty_count.to_string();
                    curr_empty_count = 0;
                }
                let piece_char = match side {
                    Side::White => char::from(piece).to_ascii_uppercase(),
                    Side::Black => char::from(piece),
                };
                pieces.push(piece_char);
            } else {
                curr_empty_count += 1;
            }
            if (idx + 1) % 8 == 0 {
                if curr_empty_count != 0 {
                    pieces += &curr_empty_count.to_string();
                    curr_empty_count = 0;
                }
                if idx != 63 {
                    pieces.push('/');
                }
            }
        }

        let side_to_move_char = match self.state.to_move {
            Side::White => 'w',
            Side::Black => 'b',
        };

        let rights = &self.state.castling_rights;
        let mut castling_rights = String::with_capacity(4);
        for (set, ch) in [
            (rights.white_king_side, 'K'),
            (rights.white_queen_side, 'Q'),
            (rights.black_king_side, 'k'),
            (rights.black_queen_side, 'q'),
        ] {
            if set {
                castling_rights.push(ch);
            }
        }
        if castling_rights.is_empty() {
            castling_rights.push('-');
        }

        let en_passant = match self.state.en_passant_target {
            Some(target) => format!("{}{}", target.file_char(), target.rank_char()),
            None => "-".to_string(),
        };

        format!(
            "{} {} {} {} {} {}",
            pieces,
            side_to_move_char,
            castling_rights,
            en_passant,
            self.state.half_move_clock,
            self.state.full_move_counter
        )
    }
}

fn castling_rights_from_fen(castling_rights_str: &str) -> Result<CastlingRights, FenParseError> {
    let mut rights = CastlingRights::default();
    if castling_rights_str == "-" {
        return Ok(rights);
    }

    for (idx, ch) in castling_rights_str.chars().enumerate() {
        let right = match ch {
            'K' => &mut rights.white_king_side,
            'Q' => &mut rights.white_queen_side,
            'k' => &mut rights.black_king_side,
            'q' => &mut rights.black_queen_side,
            _ => Err(FenParseError::CastlingRights(
                castling_rights_str.to_string(),
                idx,
            ))?,
        };
        if *right {
            Err(FenParseError::CastlingRights(
                castling_rights_str.to_string(),
                idx,
            ))?
        }
        *right = true;
    }

    Ok(rights)
}

fn en_passant_target_from_fen(
    en_passant_target_str: &str,
    to_move: Side,
) -> Result<Option<Square>, FenParseError> {
    if en_passant_target_str == "-" {
        return Ok(None);
    }

    let want_rank = match to_move {
        Side::White => 5,
        Side::Black => 2,
    };
    Square::from_coordinate(en_passant_target_str)
        .filter(|target| target.rank() == want_rank)
        .map(Some)
        .ok_or_else(|| FenParseError::EnPassantTarget(en_passant_target_str.to_string()))
}

fn place_pieces_from_fen(position: &mut Position, pieces_str: &str) -> Result<(), FenParseError> {
    let err = |idx: usize| FenParseError::PiecePlacement(pieces_str.to_string(), idx);

    let mut rank: u8 = 7;
    let mut file: u8 = 0;

    for (ch_idx, ch) in pieces_str.chars().enumerate() {
        if ch == '/' {
            if file != 8 || rank == 0 {
                Err(err(ch_idx))?
            }
            rank -= 1;
            file = 0;
        } else if let Some(digit) = ch.to_digit(10).filter(|d| (1..=8).contains(d)) {
            file += digit as u8;
            if file > 8 {
                Err(err(ch_idx))?
            }
        } else {
            let piece = Piece::try_from(ch.to_ascii_lowercase()).map_err(|_| err(ch_idx))?;
            let side = if ch.is_ascii_uppercase() {
                Side::White
            } else {
                Side::Black
            };
            let square = Square::from_rank_file(rank, file).ok_or_else(|| err(ch_idx))?;
            if piece == Piece::Pawn && (rank == 0 || rank == 7) {
                Err(err(ch_idx))?
            }
            position.put_piece(square, piece, side);
            file += 1;
        }
    }

    if rank != 0 || file != 8 {
        Err(err(pieces_str.len()))?
    }

    for side in [Side::White, Side::Black] {
        let num_kings = position.pieces_of(Piece::King, side).num_squares_set();
        if num_kings != 1 {
            Err(FenParseError::KingCount(side, num_kings))?
        }
    }

    Ok(())
}
