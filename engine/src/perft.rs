use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use tabled::{Table, Tabled};
use tracing::debug;

use crate::bitboard::BitBoard;
use crate::position::{Move, MoveKind, Position};

/// Number of leaf nodes `depth` plies below `position`.
pub fn perft(position: &mut Position, depth: u8) -> u64 {
    let moves = position.generate_legal_moves();
    if depth <= 1 {
        return if depth == 0 { 1 } else { moves.len() as u64 };
    }

    let mut nodes = 0;
    for mve in moves {
        let token = position.make_move(mve);
        nodes += perft(position, depth - 1);
        position.unmake_move(token);
    }
    nodes
}

/// Leaf counts split by root move.
pub fn perft_divide(position: &mut Position, depth: u8) -> HashMap<Move, u64> {
    if depth == 0 {
        return HashMap::new();
    }

    let mut divide = HashMap::new();
    for mve in position.generate_legal_moves() {
        let token = position.make_move(mve);
        divide.insert(mve, perft(position, depth - 1));
        position.unmake_move(token);
    }
    divide
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Tabled)]
pub struct PerftDepthResult {
    pub tot: u64,
    pub captures: u64,
    pub en_passants: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
    pub discovery_checks: u64,
    pub double_checks: u64,
    pub checkmates: u64,
}

pub struct PerftResult {
    pub depth_results: Vec<PerftDepthResult>,
    pub tot_nodes: u64,
    pub time_elapsed: Duration,
    pub nodes_per_second: f64,
}

impl fmt::Display for PerftResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "total nodes: {}", self.tot_nodes)?;
        writeln!(f, "time elapsed: {}", self.time_elapsed.as_secs_f32())?;
        writeln!(f, "nodes/s: {:.0}", self.nodes_per_second)?;
        write!(f, "{}", Table::new(&self.depth_results))
    }
}

/// Per-depth move statistics, `depth_results[i]` covering ply `i + 1`.
pub fn perft_stats(position: &mut Position, depth: usize) -> PerftResult {
    let mut depth_results = vec![PerftDepthResult::default(); depth];

    let start = Instant::now();
    perft_stats_helper(&mut depth_results, position, 0);
    let time_elapsed = start.elapsed();

    let tot_nodes = depth_results.iter().map(|result| result.tot).sum();
    let nodes_per_second = tot_nodes as f64 / time_elapsed.as_secs_f64().max(1e-9);
    debug!(depth, tot_nodes, ?time_elapsed, "perft finished");

    PerftResult {
        depth_results,
        tot_nodes,
        time_elapsed,
        nodes_per_second,
    }
}

fn perft_stats_helper(
    depth_results: &mut [PerftDepthResult],
    position: &mut Position,
    curr_depth: usize,
) {
    let Some(curr_res) = depth_results.get_mut(curr_depth) else {
        return;
    };

    let side = position.to_move();
    let enemies = position.side_pieces(side.opposite_side());
    let moves = position.generate_legal_moves();

    curr_res.tot += moves.len() as u64;
    for mve in &moves {
        let is_capture = !(BitBoard::from_square(mve.dest) & enemies).is_empty();
        if mve.kind == MoveKind::EnPassant {
            curr_res.en_passants += 1;
        }
        if is_capture || mve.kind == MoveKind::EnPassant {
            curr_res.captures += 1;
        }
        if mve.kind.is_castle() {
            curr_res.castles += 1;
        }
        if mve.promotion().is_some() {
            curr_res.promotions += 1;
        }
    }

    for mve in moves {
        let token = position.make_move(mve);

        let mut checkers = position.checkers();
        if !checkers.is_empty() {
            let curr_res = &mut depth_results[curr_depth];
            curr_res.checks += 1;
            if checkers.num_squares_set() > 1 {
                curr_res.double_checks += 1;
            } else {
                checkers.clear_square(mve.dest);
                if !checkers.is_empty() {
                    curr_res.discovery_checks += 1;
                }
            }
            if position.generate_legal_moves().is_empty() {
                curr_res.checkmates += 1;
            }
        }

        perft_stats_helper(depth_results, position, curr_depth + 1);
        position.unmake_move(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitboard::Square::*;
    use test_case::test_case;
    use testresult::TestResult;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    #[test_case(0, 1 ; "depth 0")]
    #[test_case(1, 20 ; "depth 1")]
    #[test_case(2, 400 ; "depth 2")]
    #[test_case(3, 8902 ; "depth 3")]
    fn test_perft_start(depth: u8, want: u64) {
        assert_eq!(perft(&mut Position::start(), depth), want);
    }

    #[test]
    fn test_perft_leaves_position_unchanged() -> TestResult {
        let mut position = Position::from_fen(KIWIPETE)?;
        let before = position.clone();
        assert_eq!(perft(&mut position, 2), 2039);
        assert_eq!(position, before);
        Ok(())
    }

    #[test]
    fn test_perft_divide() -> TestResult {
        let mut position = Position::from_fen(KIWIPETE)?;
        let divide = perft_divide(&mut position, 2);

        assert_eq!(divide.len(), 48);
        assert_eq!(divide.values().sum::<u64>(), 2039);
        assert_eq!(divide[&Move::with_kind(E1, G1, MoveKind::CastleKingside)], 43);
        assert_eq!(divide[&Move::new(E5, F7)], 44);
        Ok(())
    }

    #[test]
    fn test_perft_stats_kiwipete() -> TestResult {
        let result = perft_stats(&mut Position::from_fen(KIWIPETE)?, 2);

        assert_eq!(result.tot_nodes, 48 + 2039);
        assert_eq!(
            result.depth_results[0],
            PerftDepthResult {
                tot: 48,
                captures: 8,
                castles: 2,
                ..PerftDepthResult::default()
            }
        );
        assert_eq!(
            result.depth_results[1],
            PerftDepthResult {
                tot: 2039,
                captures: 351,
                en_passants: 1,
                castles: 91,
                checks: 3,
                ..PerftDepthResult::default()
            }
        );
        Ok(())
    }

    #[test]
    fn test_count_en_passant() -> TestResult {
        let mut position = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/Pp2P3/2N2Q1p/1PPBBPPP/R3K2R b KQkq a3 0 1",
        )?;
        let result = perft_stats(&mut position, 1);
        assert_eq!(result.depth_results[0].en_passants, 1);
        Ok(())
    }
}
