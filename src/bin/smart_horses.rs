//! smart-horses CLI - play the two-knight capture game in a terminal
//!
//! Games run against the in-process decision service:
//! - `watch`: replay a machine-vs-machine match frame by frame
//! - `play`: play black against the machine, one `row col` per line
//! - `experiments`: run the difficulty matchup batch and print the matrix

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

use smart_horses::backend::{GameBackend, JsonBackend, LocalBackend, LocalConfig, LocalServer};
use smart_horses::core::{Cell, Difficulty, GameMode, SessionConfig};
use smart_horses::engine::{Outcome, TurnState};
use smart_horses::session::GameSession;

#[derive(Parser)]
#[command(name = "smart-horses")]
#[command(version, about = "Two-knight capture game against a decision service", long_about = None)]
struct Cli {
    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Options {
    /// Opponent strength (beginner, amateur, expert or 1-3)
    #[arg(long, global = true)]
    difficulty: Option<Difficulty>,

    /// Seed for board layouts and machine moves
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// JSON file with `session` and `local` sections
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Route every call through the JSON API instead of calling the service directly
    #[arg(long, global = true)]
    wire: bool,

    /// Do not wait between frames
    #[arg(long, global = true)]
    fast: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a machine-vs-machine match
    Watch,

    /// Play black against the machine
    Play,

    /// Run every difficulty pairing and print the results
    Experiments,
}

/// Contents of a `--config` file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct FileConfig {
    session: SessionConfig,
    local: LocalConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let options = &cli.options;

    let mut file = match &options.config {
        Some(path) => load_config(path)?,
        None => FileConfig::default(),
    };
    if let Some(difficulty) = options.difficulty {
        file.session.difficulty = difficulty;
    }
    if let Some(seed) = options.seed {
        file.local.seed = seed;
    }

    let backend: Box<dyn GameBackend> = if options.wire {
        Box::new(JsonBackend::new(LocalServer::new(file.local)))
    } else {
        Box::new(LocalBackend::new(file.local))
    };

    match cli.command {
        Commands::Watch => {
            let config = file.session.with_mode(GameMode::MachineVsMachine);
            watch(GameSession::new(backend, config), options.fast)
        }
        Commands::Play => {
            let config = file.session.with_mode(GameMode::HumanVsMachine);
            play(GameSession::new(backend, config), options.fast)
        }
        Commands::Experiments => {
            let config = file.session.with_mode(GameMode::Experiment);
            experiments(GameSession::new(backend, config))
        }
    }
}

fn load_config(path: &Path) -> Result<FileConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

// =============================================================================
// Commands
// =============================================================================

fn watch<B: GameBackend>(mut session: GameSession<B>, fast: bool) -> Result<()> {
    session.start().map_err(|d| anyhow::anyhow!("{}", d))?;

    let mut shown = None;
    while let Some(due) = session.next_due() {
        wait(due, fast);
        session.advance(due);
        report_diagnostics(&mut session);

        if session.board() != shown.as_ref() {
            shown = session.board().cloned();
            render(&session);
        }
    }

    print_outcomes(&mut session);
    Ok(())
}

fn play<B: GameBackend>(mut session: GameSession<B>, fast: bool) -> Result<()> {
    session.start().map_err(|d| anyhow::anyhow!("{}", d))?;
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        while let Some(due) = session.next_due() {
            wait(due, fast);
            session.advance(due);
            report_diagnostics(&mut session);
            if session.state().accepts_clicks() && !session.legal_moves().is_empty() {
                break;
            }
        }

        match session.turn() {
            TurnState::GameOver => break,
            TurnState::AwaitingHuman if session.state().accepts_clicks() => {}
            other => bail!("game stalled in {}", other),
        }

        render(&session);
        let moves: Vec<String> = session.legal_moves().sorted().iter().map(Cell::to_string).collect();
        print!("your move [{}]> ", moves.join(" "));
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            return Ok(());
        };
        let Some(cell) = parse_cell(&line?) else {
            println!("expected `row col`");
            continue;
        };
        if let Err(refused) = session.click(cell) {
            println!("{}", refused.message);
        }
        report_diagnostics(&mut session);
    }

    render(&session);
    print_outcomes(&mut session);
    Ok(())
}

fn experiments<B: GameBackend>(mut session: GameSession<B>) -> Result<()> {
    session.start().map_err(|d| anyhow::anyhow!("{}", d))?;
    report_diagnostics(&mut session);

    let matrix = session.take_outcomes().into_iter().find_map(|outcome| match outcome {
        Outcome::Experiments(matrix) => Some(matrix),
        _ => None,
    });
    match matrix {
        Some(matrix) => {
            println!("{}", matrix);
            Ok(())
        }
        None => bail!("the experiment batch produced no results"),
    }
}

// =============================================================================
// Terminal output
// =============================================================================

fn wait(due: Duration, fast: bool) {
    if !fast {
        std::thread::sleep(due);
    }
}

fn render<B: GameBackend>(session: &GameSession<B>) {
    if let Some(board) = session.board() {
        println!("{}", board);
    }
    println!("{}\n", session.score());
}

fn report_diagnostics<B: GameBackend>(session: &mut GameSession<B>) {
    for diagnostic in session.take_diagnostics() {
        eprintln!("warning: {}", diagnostic);
    }
}

fn print_outcomes<B: GameBackend>(session: &mut GameSession<B>) {
    for outcome in session.take_outcomes() {
        match outcome {
            Outcome::GameOver { score, winner } => match winner {
                Some(side) => println!("game over: {} wins ({})", side, score),
                None => println!("game over: draw ({})", score),
            },
            Outcome::MatchReport(report) => println!("report: {}", report),
            Outcome::Experiments(matrix) => println!("{}", matrix),
        }
    }
}

fn parse_cell(line: &str) -> Option<Cell> {
    let mut parts = line.split(|c: char| c.is_whitespace() || c == ',').filter(|p| !p.is_empty());
    let row = parts.next()?.parse().ok()?;
    let col = parts.next()?.parse().ok()?;
    match parts.next() {
        None => Some(Cell::new(row, col)),
        Some(_) => None,
    }
}
