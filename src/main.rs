//! Kingsgrid CLI - generate maps and run bot games from the terminal.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Kingsgrid - a real-time territory-capture game engine
#[derive(Parser, Debug)]
#[command(name = "kingsgrid")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log filter used when RUST_LOG is unset (e.g. info, kingsgrid=debug)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// JSON engine config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a single map and print it
    Generate {
        /// Map identifier (default: the configured map)
        map: Option<String>,

        /// Number of player seats (default: 2)
        #[arg(short, long, default_value = "2")]
        players: usize,

        /// Show the map as player N sees it
        #[arg(long)]
        viewer: Option<u8>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Color owned cells with ANSI escapes
        #[arg(long)]
        color: bool,
    },

    /// Generate many maps in parallel and report playability
    Validate {
        /// Map size as <W>x<H> (default: 20x20)
        #[arg(short = 'S', long, default_value = "20x20")]
        size: String,

        /// Number of maps to generate (default: 1000)
        #[arg(short = 'n', long, default_value = "1000")]
        count: u64,

        /// Starting seed (increments for each map)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Number of player seats (default: 2)
        #[arg(short, long, default_value = "2")]
        players: usize,

        /// Mountain density override
        #[arg(long)]
        mountains: Option<f64>,

        /// Castle density override
        #[arg(long)]
        castles: Option<f64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Show progress bar
        #[arg(long)]
        progress: bool,
    },

    /// Run a headless game between bots
    Run {
        /// Number of bots (2-8)
        #[arg(short, long, default_value = "2", value_parser = clap::value_parser!(u8).range(2..=8))]
        bots: u8,

        /// Bot strategy
        #[arg(long, default_value = "greedy")]
        strategy: cli::BotStrategy,

        /// Random seed for bots and the map (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Maximum turns (default: 1000)
        #[arg(short, long, default_value = "1000")]
        turns: u32,

        /// Game mode (default: the configured mode)
        #[arg(short, long)]
        mode: Option<String>,

        /// Map identifier (default: the configured map)
        #[arg(long)]
        map: Option<String>,

        /// Turn timer speed multiplier (default: the configured speed)
        #[arg(long)]
        speed: Option<f64>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Suppress turn-by-turn output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Interactive TUI to watch a bot game in real time
    Watch {
        /// Number of bots (2-8)
        #[arg(short, long, default_value = "2", value_parser = clap::value_parser!(u8).range(2..=8))]
        bots: u8,

        /// Bot strategy
        #[arg(long, default_value = "greedy")]
        strategy: cli::BotStrategy,

        /// Random seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Maximum turns (default: 1000)
        #[arg(short, long, default_value = "1000")]
        turns: u32,

        /// Game mode (default: the configured mode)
        #[arg(short, long)]
        mode: Option<String>,

        /// Map identifier (default: the configured map)
        #[arg(long)]
        map: Option<String>,

        /// Turn timer speed multiplier (default: the configured speed)
        #[arg(long)]
        speed: Option<f64>,

        /// View from player N's perspective (1-8, default: 1)
        #[arg(short, long, default_value = "1")]
        player: u8,
    },
}

fn init_tracing(log_level: &str, tui: bool) {
    // The TUI owns the terminal, so only RUST_LOG can turn logging on there.
    let fallback = if tui { "off" } else { log_level };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.log_level, matches!(args.command, Commands::Watch { .. }));

    let config = match cli::session::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match args.command {
        Commands::Generate {
            map,
            players,
            viewer,
            format,
            color,
        } => cli::generate::execute(&config, map, players, viewer, format, color),

        Commands::Validate {
            size,
            count,
            seed,
            players,
            mountains,
            castles,
            threads,
            format,
            progress,
        } => cli::validate::execute(
            &config,
            &cli::validate::ValidateArgs {
                size,
                count,
                seed,
                players,
                mountains,
                castles,
                threads,
                format,
                progress,
            },
        ),

        Commands::Run {
            bots,
            strategy,
            seed,
            turns,
            mode,
            map,
            speed,
            format,
            quiet,
        } => cli::run::execute(
            &config,
            &cli::session::GameArgs {
                bots: usize::from(bots),
                strategy,
                seed,
                turns,
                mode,
                map,
                speed,
            },
            format,
            quiet,
        ),

        Commands::Watch {
            bots,
            strategy,
            seed,
            turns,
            mode,
            map,
            speed,
            player,
        } => cli::watch::execute(
            &config,
            &cli::session::GameArgs {
                bots: usize::from(bots),
                strategy,
                seed,
                turns,
                mode,
                map,
                speed,
            },
            player,
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
