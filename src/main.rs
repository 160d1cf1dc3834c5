use clap::Parser;
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;
use uno_engine::uno_game::{ConsoleUI, GameController, JsonFileStore, Player};

/// Console Uno whose progress survives restarts.
#[derive(Parser, Debug)]
#[command(name = "uno", version, about)]
struct Args {
    /// Human player (repeatable)
    #[arg(short, long = "player", value_name = "NAME")]
    players: Vec<String>,

    /// Computer player (repeatable)
    #[arg(long = "ai", value_name = "NAME")]
    ai: Vec<String>,

    /// Directory holding the saved game and move log
    #[arg(long, default_value = "uno_state")]
    state_dir: PathBuf,

    /// Number of rounds to play before exiting
    #[arg(long, default_value_t = 1)]
    rounds: u32,

    /// Seed for shuffling and computer decisions
    #[arg(long)]
    seed: Option<u64>,

    /// Start a new game even if a saved one exists
    #[arg(long)]
    fresh: bool,
}

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));
    let args = Args::parse();

    let store = match JsonFileStore::new(args.state_dir.clone()) {
        Ok(store) => store,
        Err(e) => {
            error!("Cannot use state directory {}: {}", args.state_dir.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let players = args
        .players
        .into_iter()
        .map(Player::human)
        .chain(args.ai.into_iter().map(Player::rule_based))
        .collect();

    let started =
        GameController::resume_or_new(players, store, ConsoleUI::new(), args.seed, args.fresh);
    let mut controller = match started {
        Ok(controller) => controller,
        Err(e) => {
            println!("Failed to start game: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match controller.run(args.rounds) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Game stopped: {}", e);
            println!("Game stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}
