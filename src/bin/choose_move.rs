use chess::{Board, ChessMove};
use chess_guardrail_engine::{EngineConfig, GameState, MoveSelector};
use clap::Parser;
use std::str::FromStr;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about = "Pick a move for the side to move", long_about = None)]
struct Args {
    /// Starting position in FEN
    #[arg(
        short,
        long,
        default_value = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    )]
    fen: String,

    /// Moves played from the starting position, in UCI notation (e2e4 e7e5 ...)
    #[arg(short, long, num_args = 0.., value_delimiter = ' ')]
    moves: Vec<String>,

    /// Time budget in milliseconds
    #[arg(short, long, default_value = "1000")]
    budget_ms: u64,

    /// Configuration preset: default, fast or strong
    #[arg(short, long, default_value = "default")]
    preset: String,

    /// JSON configuration file; overrides --preset
    #[arg(short, long)]
    config: Option<String>,

    /// Print every scored candidate
    #[arg(long)]
    candidates: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::preset(&args.preset)?,
    };

    let start = Board::from_str(&args.fen).map_err(|e| format!("invalid FEN '{}': {}", args.fen, e))?;
    let moves = args
        .moves
        .iter()
        .filter(|m| !m.is_empty())
        .map(|m| ChessMove::from_str(m).map_err(|e| format!("invalid move '{}': {}", m, e)))
        .collect::<Result<Vec<_>, _>>()?;
    let mut state = GameState::from_moves(start, &moves)?;

    let selector = MoveSelector::new(config);
    let selection = selector.select(&mut state, Duration::from_millis(args.budget_ms));

    if args.candidates {
        for candidate in &selection.candidates {
            println!(
                "{:>6} {:>7} captured={:<4} check={:<5} attackers={} repeats={:<5} allowed={}",
                candidate.chess_move.to_string(),
                candidate.score,
                candidate.captured_value,
                candidate.gives_check,
                candidate.attacker_count,
                candidate.causes_repetition,
                candidate.guardrail_allowed
            );
        }
        println!(
            "source={:?} nodes={} qnodes={} risk_nodes={} elapsed={:?}",
            selection.source,
            selection.stats.nodes,
            selection.stats.quiescence_nodes,
            selection.stats.risk_nodes,
            selection.elapsed
        );
    }

    match selection.best_move {
        Some(mv) => println!("{}", mv),
        None => println!("(none)"),
    }

    Ok(())
}
