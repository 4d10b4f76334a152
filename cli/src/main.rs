use std::{
    env,
    fs::{self, File},
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use bitsearch_cli::{Cli, Commands, run_moves, run_perft, run_search};
use clap::Parser;
use mimalloc::MiMalloc;
use tracing::{Level, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, Registry, filter::Directive, prelude::*};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    enable_logging()?;

    let mut stdout = io::stdout().lock();
    match cli.command {
        Commands::Search(args) => run_search(&args, &mut stdout).map(|_| ()),
        Commands::Perft(args) => run_perft(&args, &mut stdout).map(|_| ()),
        Commands::Moves(args) => run_moves(&args, &mut stdout),
    }?;
    stdout.flush()?;
    Ok(())
}

fn enable_logging() -> Result<()> {
    let log_path = match env::var("BITSEARCH_LOG_PATH") {
        Ok(log_path) => PathBuf::from(log_path),
        Err(_) => get_default_log_path()?,
    };
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Couldn't create directory {:?}", log_dir))?;
    }
    let log_file =
        File::create(&log_path).with_context(|| format!("Couldn't create file {:?}", log_path))?;

    // Search rounds are already printed on stdout.
    let stderr_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("info").add_directive("search=off".parse::<Directive>()?),
    };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false)
        .with_writer(io::stderr)
        .with_filter(stderr_filter);

    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_filter(LevelFilter::from_level(Level::DEBUG));

    Registry::default()
        .with(stderr_layer)
        .with(log_layer)
        .try_init()?;

    Ok(())
}

fn get_default_log_path() -> Result<PathBuf> {
    let mut log_path = dirs::home_dir().context("Home directory not set")?;
    log_path.push(".local/state/bitsearch/bitsearch.log");
    Ok(log_path)
}
