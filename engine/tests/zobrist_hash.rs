use bitsearch::{Position, START_FEN};
use test_case::test_case;
use testresult::TestResult;

#[test_case(START_FEN, 4)]
#[test_case("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1", 3)]
#[test_case("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 5)]
#[test_case("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8", 3)]
fn test_zobrist_hash_perft(fen: &str, max_depth: usize) -> TestResult {
    let mut position = Position::from_fen(fen)?;
    zobrist_hash_perft_helper(&mut position, 0, max_depth);
    Ok(())
}

#[test_case(START_FEN, 5)]
#[test_case("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1", 4)]
#[test_case("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 6)]
#[ignore]
fn test_zobrist_hash_perft_long(fen: &str, max_depth: usize) -> TestResult {
    let mut position = Position::from_fen(fen)?;
    zobrist_hash_perft_helper(&mut position, 0, max_depth);
    Ok(())
}

fn zobrist_hash_perft_helper(position: &mut Position, curr_depth: usize, max_depth: usize) {
    if curr_depth == max_depth {
        return;
    }

    for mve in position.generate_legal_moves() {
        let before_hash = position.zobrist_hash();
        let token = position.make_move(mve);

        // Incremental hash has to match the one generated from scratch
        assert_eq!(
            position.recalculate_hash(),
            position.zobrist_hash(),
            "incremental hash not equal for move: {:?}, fen=`{}`",
            mve,
            position.to_fen()
        );

        zobrist_hash_perft_helper(position, curr_depth + 1, max_depth);

        position.unmake_move(token);
        assert_eq!(
            position.zobrist_hash(),
            before_hash,
            "couldn't reverse hash for move: {:?}, fen=`{}`",
            mve,
            position.to_fen()
        );
    }
}

#[test]
fn test_transpositions_share_hash() -> TestResult {
    let knights_first = Position::from_fen_with_moves(START_FEN, ["g1f3", "g8f6", "b1c3", "b8c6"])?;
    let other_order = Position::from_fen_with_moves(START_FEN, ["b1c3", "b8c6", "g1f3", "g8f6"])?;
    assert_eq!(knights_first.zobrist_hash(), other_order.zobrist_hash());
    Ok(())
}

#[test]
fn test_hash_depends_on_side_castling_and_en_passant() -> TestResult {
    let base = Position::from_fen("r3k2r/8/8/3pP3/8/8/8/R3K2R w KQkq d6 0 2")?;
    let variants = [
        "r3k2r/8/8/3pP3/8/8/8/R3K2R b KQkq - 0 2",
        "r3k2r/8/8/3pP3/8/8/8/R3K2R w Kkq d6 0 2",
        "r3k2r/8/8/3pP3/8/8/8/R3K2R w KQkq - 0 2",
    ];
    for fen in variants {
        assert_ne!(Position::from_fen(fen)?.zobrist_hash(), base.zobrist_hash(), "{fen}");
    }
    Ok(())
}
