mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{paginate, papers, replay, PaginateArgs, PapersArgs, ReplayArgs};
use tracing_subscriber::EnvFilter;

/// Folio - paginated rich-text engine
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log engine activity to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a document into pages and report the breakdown
    Paginate(PaginateArgs),

    /// Replay a timed edit script through the idle scheduler
    Replay(ReplayArgs),

    /// List paper presets and their page capacity
    Papers(PapersArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "folio_editor=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Paginate(args) => paginate(args, &cwd),
        Command::Replay(args) => replay(args, &cwd),
        Command::Papers(args) => papers(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
