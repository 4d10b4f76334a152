use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arrayvec::ArrayVec;
use serde::Serialize;
use tracing::{debug, debug_span, info, trace, warn};

use crate::evaluation::{Eval, EvaluatePosition};
use crate::position::{Move, Position};
use crate::transposition_table::{Bound, TranspositionTable};

mod move_ordering;

pub use move_ordering::HINT_PRIORITY;

/// Deepest iterative-deepening round a search may run.
pub const MAX_DEPTH: u8 = 64;

pub const DEFAULT_QUIESCENCE_DEPTH: u8 = 8;

/// Nodes between wall-clock polls.
const DEADLINE_CHECK_INTERVAL: u64 = 1024;

type PrincipalVariation = ArrayVec<Move, { MAX_DEPTH as usize }>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchParams {
    /// Last round to run. `None` searches up to [`MAX_DEPTH`].
    pub max_depth: Option<u8>,
    pub move_time: Option<Duration>,
    /// Plies of capture-only search below the main search's leaves.
    pub quiescence_depth: u8,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            move_time: None,
            quiescence_depth: DEFAULT_QUIESCENCE_DEPTH,
        }
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Print out only non default fields
        let default = SearchParams::default();
        let mut parts = vec![];

        if let Some(max_depth) = self.max_depth {
            parts.push(format!("max_depth: {}", max_depth));
        }
        if let Some(move_time) = self.move_time {
            parts.push(format!("move_time: {:?}", move_time));
        }
        if self.quiescence_depth != default.quiescence_depth {
            parts.push(format!("quiescence_depth: {}", self.quiescence_depth));
        }
        write!(f, "SearchParams: {}", parts.join(", "))
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SearchError {
    #[error("max depth has to be between 1 and {MAX_DEPTH}, got {0}")]
    InvalidMaxDepth(u8),
}

/// Progress of one completed iterative-deepening round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    pub depth: u8,
    pub score: Eval,
    pub nodes: u64,
    pub elapsed: Duration,
    pub hashfull: u16,
    pub pv: Vec<Move>,
}

impl fmt::Display for SearchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nps = self.nodes as f64 / self.elapsed.as_secs_f64().max(1e-9);
        let pv = self
            .pv
            .iter()
            .map(|mve| mve.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        write!(
            f,
            "depth {} score {} nodes {} nps {:.0} hashfull {} time {} pv {}",
            self.depth,
            self.score,
            self.nodes,
            nps,
            self.hashfull,
            self.elapsed.as_millis(),
            pv
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchResult {
    /// `None` only when the side to move has no legal moves.
    pub best_move: Option<Move>,
    pub score: Eval,
    /// Last completed round, 0 when none completed.
    pub depth: u8,
    pub nodes: u64,
    pub elapsed: Duration,
    pub pv: Vec<Move>,
}

#[derive(Clone, Copy, Debug)]
struct RootMove {
    mve: Move,
    score: Eval,
}

/// Iterative deepening from `position` until `params` run out, `stop` is
/// raised, or a forced mate is found. Each completed round is passed to
/// `on_report`. The best move always comes from a completed round, except
/// for a timed search with a single legal move, which returns it unsearched.
///
/// `position` is searched in place and is unchanged on return.
pub fn search(
    position: &mut Position,
    params: &SearchParams,
    evaluator: &impl EvaluatePosition,
    transposition_table: &mut TranspositionTable,
    stop: Arc<AtomicBool>,
    mut on_report: impl FnMut(&SearchReport),
) -> Result<SearchResult, SearchError> {
    let max_depth = params.max_depth.unwrap_or(MAX_DEPTH);
    if !(1..=MAX_DEPTH).contains(&max_depth) {
        return Err(SearchError::InvalidMaxDepth(max_depth));
    }

    let _span = debug_span!("search", fen = %position.to_fen(), params = %params).entered();
    let start = Instant::now();
    let generation = transposition_table.new_generation();

    let hint = transposition_table
        .probe(position.zobrist_hash())
        .and_then(|entry| entry.best_move);
    let mut moves = position.generate_legal_moves();
    position.order_moves(&mut moves, hint);

    let Some(&first_move) = moves.first() else {
        let score = if position.is_king_in_check(position.to_move()) {
            Eval::mated_in(0)
        } else {
            Eval::DRAW
        };
        warn!(%score, "no legal moves to search");
        return Ok(SearchResult {
            best_move: None,
            score,
            depth: 0,
            nodes: 0,
            elapsed: start.elapsed(),
            pv: vec![],
        });
    };

    let mut result = SearchResult {
        best_move: Some(first_move),
        score: evaluator.evaluate(position),
        depth: 0,
        nodes: 0,
        elapsed: Duration::ZERO,
        pv: vec![first_move],
    };

    if position.is_draw_by_half_move_clock() {
        debug!("half-move clock reached the draw threshold");
        result.score = Eval::DRAW;
        result.elapsed = start.elapsed();
        return Ok(result);
    }

    if moves.len() == 1 && params.move_time.is_some() {
        debug!(%first_move, "only one legal move, skipping the timed search");
        result.elapsed = start.elapsed();
        return Ok(result);
    }

    let mut root_moves: Vec<RootMove> = moves
        .iter()
        .map(|&mve| RootMove {
            mve,
            score: -Eval::INFINITY,
        })
        .collect();

    let mut searcher = Searcher {
        position,
        evaluator,
        transposition_table,
        generation,
        stop: &stop,
        deadline: params.move_time.map(|move_time| start + move_time),
        enforce_deadline: false,
        timed_out: false,
        nodes: 0,
        quiescence_depth: params.quiescence_depth,
    };

    for depth in 1..=max_depth {
        let _round = debug_span!("iteration", depth).entered();
        // Only the stop flag can interrupt round one
        searcher.enforce_deadline = depth > 1;

        let Some((score, pv)) = searcher.search_root(depth, &mut root_moves) else {
            warn!(depth, nodes = searcher.nodes, "round abandoned, keeping previous result");
            break;
        };

        let best_move = pv[0];
        root_moves.sort_by_key(|root_move| {
            (root_move.mve != best_move, std::cmp::Reverse(root_move.score))
        });

        result.best_move = Some(best_move);
        result.score = score;
        result.depth = depth;
        result.pv = pv.to_vec();

        let report = SearchReport {
            depth,
            score,
            nodes: searcher.nodes,
            elapsed: start.elapsed(),
            hashfull: searcher.transposition_table.hashfull(),
            pv: result.pv.clone(),
        };
        info!(target: "search", "{}", report);
        on_report(&report);

        if score.is_mate() {
            debug!(%score, "forced mate found");
            break;
        }
        if let Some(move_time) = params.move_time {
            if start.elapsed() >= move_time {
                debug!(elapsed = ?start.elapsed(), ?move_time, "time budget spent");
                break;
            }
        }
    }

    result.nodes = searcher.nodes;
    result.elapsed = start.elapsed();
    Ok(result)
}

struct Searcher<'a, E> {
    position: &'a mut Position,
    evaluator: &'a E,
    transposition_table: &'a mut TranspositionTable,
    generation: u8,
    stop: &'a AtomicBool,
    deadline: Option<Instant>,
    enforce_deadline: bool,
    timed_out: bool,
    nodes: u64,
    quiescence_depth: u8,
}

impl<E: EvaluatePosition> Searcher<'_, E> {
    fn should_stop(&mut self) -> bool {
        if self.stop.load(Ordering::Relaxed) {
            return true;
        }
        if self.enforce_deadline && !self.timed_out && self.nodes % DEADLINE_CHECK_INTERVAL == 0 {
            if let Some(deadline) = self.deadline {
                self.timed_out = Instant::now() >= deadline;
            }
        }
        self.enforce_deadline && self.timed_out
    }

    /// One full-window round over the root moves, storing each move's score.
    /// Returns `None` if the round was interrupted.
    fn search_root(
        &mut self,
        depth: u8,
        root_moves: &mut [RootMove],
    ) -> Option<(Eval, PrincipalVariation)> {
        let mut alpha = -Eval::INFINITY;
        let beta = Eval::INFINITY;
        let mut pv = PrincipalVariation::new();
        let mut child_pv = PrincipalVariation::new();

        for root_move in root_moves.iter_mut() {
            let token = self.position.make_move(root_move.mve);
            let score = self.negamax(depth - 1, 1, -beta, -alpha, &mut child_pv);
            self.position.unmake_move(token);

            root_move.score = -score?;
            if root_move.score > alpha || pv.is_empty() {
                alpha = alpha.max(root_move.score);
                pv.clear();
                pv.push(root_move.mve);
                extend_pv(&mut pv, &child_pv);
            }
        }

        self.transposition_table.store(
            self.position.zobrist_hash(),
            score_to_tt(alpha, 0),
            Bound::Exact,
            depth,
            self.generation,
            pv.first().copied(),
        );
        Some((alpha, pv))
    }

    fn negamax(
        &mut self,
        depth: u8,
        ply: u8,
        mut alpha: Eval,
        mut beta: Eval,
        pv: &mut PrincipalVariation,
    ) -> Option<Eval> {
        pv.clear();
        self.nodes += 1;
        if self.should_stop() {
            return None;
        }

        if self.position.is_draw_by_half_move_clock() {
            return Some(Eval::DRAW);
        }

        let hash = self.position.zobrist_hash();
        let mut hint = None;
        if let Some(entry) = self.transposition_table.probe(hash) {
            hint = entry.best_move;
            if entry.depth >= depth {
                let score = score_from_tt(entry.score, ply);
                match entry.bound {
                    Bound::Exact => return Some(score),
                    Bound::Lower => alpha = alpha.max(score),
                    Bound::Upper => beta = beta.min(score),
                }
                if alpha >= beta {
                    return Some(score);
                }
            }
        }

        if depth == 0 {
            // Checked before quiescence, which never detects mate
            let to_move = self.position.to_move();
            if self.position.is_king_in_check(to_move)
                && self.position.generate_legal_moves().is_empty()
            {
                return Some(Eval::mated_in(ply));
            }
            if !self.position.last_move_was_quiet() {
                return self.quiescence(self.quiescence_depth, alpha, beta);
            }
            return Some(self.evaluator.evaluate(self.position));
        }

        let mut moves = self.position.generate_legal_moves();
        if moves.is_empty() {
            return Some(if self.position.is_king_in_check(self.position.to_move()) {
                Eval::mated_in(ply)
            } else {
                Eval::DRAW
            });
        }
        self.position.order_moves(&mut moves, hint);

        let window_alpha = alpha;
        let mut best_score = -Eval::INFINITY;
        let mut best_move = None;
        let mut child_pv = PrincipalVariation::new();

        for mve in moves {
            let token = self.position.make_move(mve);
            let score = self.negamax(depth - 1, ply + 1, -beta, -alpha, &mut child_pv);
            self.position.unmake_move(token);
            let score = -score?;

            if score > best_score {
                best_score = score;
                best_move = Some(mve);
            }
            if score > alpha {
                alpha = score;
                pv.clear();
                pv.push(mve);
                extend_pv(pv, &child_pv);
            }
            if score >= beta {
                trace!(ply, depth, %mve, "beta cutoff");
                break;
            }
        }

        let bound = if best_score >= beta {
            Bound::Lower
        } else if best_score <= window_alpha {
            Bound::Upper
        } else {
            Bound::Exact
        };
        self.transposition_table.store(
            hash,
            score_to_tt(best_score, ply),
            bound,
            depth,
            self.generation,
            best_move,
        );

        Some(alpha)
    }

    /// Capture-only search below the horizon.
    fn quiescence(&mut self, depth: u8, mut alpha: Eval, beta: Eval) -> Option<Eval> {
        self.nodes += 1;
        if self.should_stop() {
            return None;
        }

        let stand_pat = self.evaluator.evaluate(self.position);
        if stand_pat >= beta || depth == 0 {
            return Some(stand_pat);
        }
        alpha = alpha.max(stand_pat);

        let mut moves = self.position.generate_captures();
        self.position.order_moves(&mut moves, None);

        for mve in moves {
            let token = self.position.make_move(mve);
            let score = self.quiescence(depth - 1, -beta, -alpha);
            self.position.unmake_move(token);
            let score = -score?;

            if score >= beta {
                return Some(score);
            }
            alpha = alpha.max(score);
        }

        Some(alpha)
    }
}

fn extend_pv(pv: &mut PrincipalVariation, child_pv: &PrincipalVariation) {
    let extended = pv.try_extend_from_slice(child_pv);
    debug_assert!(extended.is_ok(), "principal variation deeper than {MAX_DEPTH}");
}

/// Mate scores are stored relative to the node so they stay valid when the
/// position is reached at another ply.
fn score_to_tt(score: Eval, ply: u8) -> Eval {
    if score >= Eval::MATE_BOUND {
        score + i32::from(ply)
    } else if score <= -Eval::MATE_BOUND {
        score - i32::from(ply)
    } else {
        score
    }
}

fn score_from_tt(score: Eval, ply: u8) -> Eval {
    if score >= Eval::MATE_BOUND {
        score - i32::from(ply)
    } else if score <= -Eval::MATE_BOUND {
        score + i32::from(ply)
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitboard::Square::*;
    use crate::evaluation::POSITION_EVALUATOR;
    use test_case::test_case;
    use testresult::TestResult;

    fn run(position: &mut Position, params: SearchParams) -> Result<SearchResult, SearchError> {
        search(
            position,
            &params,
            &POSITION_EVALUATOR,
            &mut TranspositionTable::with_memory(1 << 20),
            Arc::new(AtomicBool::new(false)),
            |_| {},
        )
    }

    #[test_case(Eval::CHECKMATE - 3, 2 ; "winning mate")]
    #[test_case(Eval::mated_in(6), 4 ; "losing mate")]
    #[test_case(Eval(250), 7 ; "not a mate")]
    fn test_tt_score_round_trip(score: Eval, ply: u8) {
        assert_eq!(score_from_tt(score_to_tt(score, ply), ply), score);
    }

    #[test]
    fn test_tt_mate_score_is_relative_to_node() {
        // Mated 5 plies from the root, stored at ply 3: 2 plies from the node
        assert_eq!(score_to_tt(Eval::mated_in(5), 3), Eval::mated_in(2));
        // Read back at ply 1, the mate is 3 plies away
        assert_eq!(score_from_tt(Eval::mated_in(2), 1), Eval::mated_in(3));
    }

    #[test_case(0 ; "zero")]
    #[test_case(MAX_DEPTH + 1 ; "too deep")]
    fn test_invalid_max_depth(max_depth: u8) {
        let got = run(
            &mut Position::start(),
            SearchParams {
                max_depth: Some(max_depth),
                ..SearchParams::default()
            },
        );
        assert_eq!(got, Err(SearchError::InvalidMaxDepth(max_depth)));
    }

    #[test]
    fn test_mate_in_one_found_at_depth_one() -> TestResult {
        let mut position = Position::from_fen("k7/6R1/7R/8/8/8/8/3K4 w - - 0 1")?;

        let result = run(
            &mut position,
            SearchParams {
                max_depth: Some(1),
                ..SearchParams::default()
            },
        )?;

        assert_eq!(result.best_move, Some(Move::new(H6, H8)));
        assert_eq!(result.score, Eval::CHECKMATE - 1);
        assert_eq!(result.score.to_string(), "mate 1");
        Ok(())
    }

    #[test]
    fn test_no_legal_moves() -> TestResult {
        let mut mated = Position::from_fen(
            "r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4",
        )?;
        let result = run(&mut mated, SearchParams::default())?;
        assert_eq!(result.best_move, None);
        assert_eq!(result.score, Eval::mated_in(0));

        let mut stalemate = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1")?;
        let result = run(&mut stalemate, SearchParams::default())?;
        assert_eq!(result.best_move, None);
        assert_eq!(result.score, Eval::DRAW);
        Ok(())
    }

    #[test]
    fn test_reports_every_round() -> TestResult {
        let mut position = Position::start();
        let mut reports = vec![];

        let result = search(
            &mut position,
            &SearchParams {
                max_depth: Some(3),
                ..SearchParams::default()
            },
            &POSITION_EVALUATOR,
            &mut TranspositionTable::with_memory(1 << 20),
            Arc::new(AtomicBool::new(false)),
            |report| reports.push(report.clone()),
        )?;

        let depths: Vec<u8> = reports.iter().map(|report| report.depth).collect();
        assert_eq!(depths, vec![1, 2, 3]);
        assert!(reports.windows(2).all(|pair| pair[0].nodes <= pair[1].nodes));

        let last = &reports[2];
        assert_eq!(result.depth, 3);
        assert_eq!(result.score, last.score);
        assert_eq!(result.pv, last.pv);
        assert_eq!(result.best_move, last.pv.first().copied());
        assert!(!last.pv.is_empty() && last.pv.len() <= 3);
        Ok(())
    }

    #[test]
    fn test_stop_before_start_returns_fallback() -> TestResult {
        let mut position = Position::start();
        let before = position.clone();

        let result = search(
            &mut position,
            &SearchParams::default(),
            &POSITION_EVALUATOR,
            &mut TranspositionTable::with_memory(1 << 20),
            Arc::new(AtomicBool::new(true)),
            |_| panic!("no round can complete"),
        )?;

        assert_eq!(result.depth, 0);
        assert!(result.best_move.is_some());
        assert_eq!(position, before);
        Ok(())
    }

    #[test]
    fn test_search_params_display() {
        let params = SearchParams {
            max_depth: Some(5),
            quiescence_depth: 2,
            ..SearchParams::default()
        };
        assert_eq!(
            params.to_string(),
            "SearchParams: max_depth: 5, quiescence_depth: 2"
        );
    }
}
