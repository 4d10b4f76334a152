use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use anyhow::{Context, Result};
use bitsearch::{
    DEFAULT_QUIESCENCE_DEPTH, POSITION_EVALUATOR, Position, START_FEN, SearchParams, SearchResult,
    TranspositionTable, perft, perft_divide, perft_stats, search,
};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search a position for the best move.
    Search(SearchArgs),
    /// Count the leaf nodes of the move tree.
    Perft(PerftArgs),
    /// List the legal moves of a position.
    Moves(PositionArgs),
}

#[derive(Debug, Clone, Args)]
pub struct PositionArgs {
    /// Starting position in Forsyth-Edwards Notation.
    #[arg(long, default_value = START_FEN)]
    pub fen: String,
    /// Moves played from the starting position, e.g. `e2e4` or `O-O`.
    #[arg(long = "moves", value_name = "MOVE", num_args = 1..)]
    pub moves: Vec<String>,
}

impl PositionArgs {
    pub fn position(&self) -> Result<Position> {
        Position::from_fen_with_moves(&self.fen, &self.moves).with_context(|| {
            format!(
                "Couldn't set up position from fen `{}` and moves {:?}",
                self.fen, self.moves
            )
        })
    }
}

#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub position: PositionArgs,
    /// Deepest round to search.
    #[arg(long)]
    pub depth: Option<u8>,
    /// Stop starting new rounds after this many milliseconds.
    #[arg(long)]
    pub move_time_ms: Option<u64>,
    /// Transposition table size in MiB.
    #[arg(long, default_value_t = 16)]
    pub hash_mb: usize,
    #[arg(long, default_value_t = DEFAULT_QUIESCENCE_DEPTH)]
    pub quiescence_depth: u8,
}

impl SearchArgs {
    pub fn params(&self) -> SearchParams {
        SearchParams {
            max_depth: self.depth,
            move_time: self.move_time_ms.map(Duration::from_millis),
            quiescence_depth: self.quiescence_depth,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct PerftArgs {
    #[command(flatten)]
    pub position: PositionArgs,
    pub depth: u8,
    /// Print the leaf count below every root move.
    #[arg(long, conflicts_with = "stats")]
    pub divide: bool,
    /// Print captures, castles, checks and mates per ply.
    #[arg(long)]
    pub stats: bool,
}

/// Searches the position, writing one `info` line per completed round and
/// the chosen move last.
pub fn run_search(args: &SearchArgs, out: &mut impl Write) -> Result<SearchResult> {
    let mut position = args.position.position()?;
    let mut transposition_table = TranspositionTable::with_memory(args.hash_mb * 1024 * 1024);
    let params = args.params();
    debug!(%params, hash_entries = transposition_table.len(), "starting search");

    let mut write_result = Ok(());
    let result = search(
        &mut position,
        &params,
        &POSITION_EVALUATOR,
        &mut transposition_table,
        Arc::new(AtomicBool::new(false)),
        |report| {
            if write_result.is_ok() {
                write_result = writeln!(out, "info {}", report);
            }
        },
    )?;
    write_result?;

    match result.best_move {
        Some(best_move) => writeln!(out, "bestmove {}", best_move)?,
        None => writeln!(out, "bestmove (none) {:?}", position.status())?,
    }
    Ok(result)
}

/// Returns the number of leaf nodes at `args.depth`.
pub fn run_perft(args: &PerftArgs, out: &mut impl Write) -> Result<u64> {
    let mut position = args.position.position()?;

    if args.stats {
        let result = perft_stats(&mut position, args.depth as usize);
        writeln!(out, "{}", result)?;
        return Ok(result.depth_results.last().map_or(1, |res| res.tot));
    }

    if !args.divide {
        let total = perft(&mut position, args.depth);
        writeln!(out, "Total: {}", total)?;
        return Ok(total);
    }

    let mut move_counts: Vec<_> = perft_divide(&mut position, args.depth)
        .into_iter()
        .map(|(mve, nodes)| (mve.to_string(), nodes))
        .collect();
    move_counts.sort();

    let total: u64 = move_counts.iter().map(|(_, nodes)| nodes).sum();
    for (mve, nodes) in move_counts {
        writeln!(out, "{}: {}", mve, nodes)?;
    }
    writeln!(out, "Total: {}", total)?;
    Ok(total)
}

pub fn run_moves(args: &PositionArgs, out: &mut impl Write) -> Result<()> {
    let position = args.position()?;
    let mut moves: Vec<_> = position
        .generate_legal_moves()
        .iter()
        .map(|mve| mve.to_string())
        .collect();
    moves.sort();

    writeln!(out, "{}", position)?;
    writeln!(out)?;
    writeln!(out, "fen: {}", position.to_fen())?;
    writeln!(out, "status: {:?}", position.status())?;
    writeln!(out, "moves ({}): {}", moves.len(), moves.join(" "))?;
    Ok(())
}
