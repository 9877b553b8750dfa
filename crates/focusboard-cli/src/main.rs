use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focusboard", version, about = "Focus timer for markdown kanban boards")]
struct Cli {
    /// Markdown board file to load (repeatable; defaults to `boards` in config)
    #[arg(long = "board", global = true)]
    boards: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Session log queries
    Log {
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
    /// Board contents
    Board {
        #[command(subcommand)]
        action: commands::board::BoardAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("FOCUSBOARD_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(&cli.boards, action),
        Commands::Log { action } => commands::log::run(&cli.boards, action),
        Commands::Board { action } => commands::board::run(&cli.boards, action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
