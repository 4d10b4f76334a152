pub mod attack_tables;
pub mod bitboard;
pub mod evaluation;
pub mod perft;
pub mod position;
pub mod search;
pub mod transposition_table;

pub use bitboard::{BitBoard, Square};
pub use evaluation::{Eval, EvaluatePosition, PositionEvaluator, POSITION_EVALUATOR};
pub use perft::{perft, perft_divide, perft_stats, PerftDepthResult, PerftResult};
pub use position::{
    CastlingRights, FenParseError, GameStatus, IllegalMoveError, Move, MoveKind, MoveList,
    MoveParseError, Piece, Position, PositionError, Side, State, UndoToken, ZobristHash,
    START_FEN,
};
pub use search::{
    search, SearchError, SearchParams, SearchReport, SearchResult, DEFAULT_QUIESCENCE_DEPTH,
    MAX_DEPTH,
};
pub use transposition_table::{Bound, TranspositionTable, TranspositionTableEntry};
