use bitsearch::Square::*;
use bitsearch::{
    GameStatus, IllegalMoveError, Move, MoveKind, Position, PositionError, START_FEN,
};

use test_case::test_case;
use testresult::TestResult;

#[test_case(&[
    "d2d4", "d7d5", "c2c4", "d5c4", "e2e3", "b7b5", "a2a4", "c7c6",
    "a4b5", "c6b5", "d1f3", "b8c6", "f3c6", "c8d7",
], "r2qkbnr/p2bpppp/2Q5/1p6/2pP4/4P3/1P3PPP/RNB1KBNR w KQkq - 1 8" ; "normal")]
#[test_case(&[
    "e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6", "b5a4", "f8e7", "e1g1",
], "r1bqk1nr/1pppbppp/p1n5/4p3/B3P3/5N2/PPPP1PPP/RNBQ1RK1 b kq - 3 5" ; "castling")]
#[test_case(&[
    "d2d4", "e7e5", "d4d5", "e5e4", "d5d6", "e4e3", "d6c7", "e3f2", "e1f2", "d7d5", "c7d8q",
], "rnbQkbnr/pp3ppp/8/3p4/8/8/PPP1PKPP/RNBQ1BNR b kq - 0 6" ; "promotion")]
#[test_case(&[
    "e2e4", "e7e5", "d1h5", "b8c6", "f1c4", "g8f6", "h5f7",
], "r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4" ; "scholars mate")]
#[test_case(&[
    "e2e4", "a7a6", "e4e5", "d7d5", "e5d6",
], "rnbqkbnr/1pp1pppp/p2P4/8/8/8/PPPP1PPP/RNBQKBNR b KQkq - 0 3" ; "en passant")]
fn test_play_game(moves: &[&str], want_fen: &str) -> TestResult {
    let mut position = Position::start();
    for mve in moves {
        // Game moves are never taken back
        let _ = position.play_move(mve)?;
    }

    assert_eq!(position, Position::from_fen(want_fen)?);
    assert_eq!(position.to_fen(), want_fen);
    assert_eq!(position.history_len(), moves.len());
    Ok(())
}

#[test]
fn test_take_back_whole_game() -> TestResult {
    let mut position = Position::start();
    let start = position.clone();

    let mut tokens = vec![];
    for mve in ["e2e4", "d7d5", "e4d5", "g8f6", "f1b5", "c7c6", "d5c6", "d8d2", "b1d2", "e7e5", "c6b7", "e8e7", "b7a8q", "c8g4"] {
        tokens.push(position.play_move(mve)?);
    }
    while let Some(token) = tokens.pop() {
        position.unmake_move(token);
    }

    assert_eq!(position, start);
    assert_eq!(position.zobrist_hash(), start.zobrist_hash());
    Ok(())
}

#[test]
fn test_replay_reaches_checkmate() -> TestResult {
    let position = Position::from_fen_with_moves(START_FEN, ["f2f3", "e7e5", "g2g4", "d8h4"])?;
    assert_eq!(position.status(), GameStatus::Checkmate);
    assert_eq!(position.last_move(), Some(Move::new(D8, H4)));
    Ok(())
}

#[test]
fn test_replay_rejects_illegal_sequence() {
    let got = Position::from_fen_with_moves(START_FEN, ["e2e4", "e2e4"]);
    assert!(matches!(got, Err(PositionError::MoveParse(_))));

    let got = Position::from_fen_with_moves(START_FEN, ["e2e4", "d2d4"]);
    assert!(matches!(got, Err(PositionError::IllegalMove(_))));
}

#[test]
fn test_castle_token() -> TestResult {
    let position = Position::from_fen_with_moves(
        "r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1",
        ["O-O-O", "0-0"],
    )?;
    assert_eq!(
        position.last_move(),
        Some(Move::with_kind(E1, G1, MoveKind::CastleKingside))
    );
    assert_eq!(position.to_fen(), "2kr3r/8/8/8/8/8/8/R4RK1 b - - 2 2");
    Ok(())
}

#[test_case("4k3/8/8/8/8/8/8/R2QK3 w Q - 0 1", "e1c1" ; "castle over own queen")]
#[test_case("4k3/8/8/8/8/8/8/RN2K3 w Q - 0 1", "O-O-O" ; "castle token over own knight")]
#[test_case("r3k2r/8/8/8/8/8/8/R3KB1R w KQkq - 0 1", "e1g1" ; "castle over own bishop")]
fn test_blocked_castle_is_rejected(fen: &str, mve: &str) -> TestResult {
    let mut position = Position::from_fen(fen)?;
    let before = position.clone();

    let got = position.play_move(mve);

    assert!(matches!(
        got,
        Err(PositionError::IllegalMove(IllegalMoveError::CastlingBlocked(_)))
    ));
    assert_eq!(position, before);
    assert_eq!(position.zobrist_hash(), position.recalculate_hash());
    Ok(())
}

#[test]
fn test_king_capture_is_rejected() -> TestResult {
    let mut position = Position::from_fen("4k3/8/8/8/8/8/4Q3/4K3 w - - 0 1")?;
    let before = position.clone();

    let got = position.play_move("e2e8");

    assert!(matches!(
        got,
        Err(PositionError::IllegalMove(IllegalMoveError::KingCapture(_)))
    ));
    assert_eq!(position, before);
    assert_eq!(position.history_len(), 0);
    Ok(())
}
