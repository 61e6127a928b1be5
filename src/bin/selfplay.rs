//! Self-play binary
//!
//! Generates Ludo self-play games with parallel MCTS over the built-in
//! heuristic evaluator, persisting one trajectory and one game log per
//! game. The trained network replaces the heuristic behind the same
//! Evaluate boundary in the surrounding system.

use clap::Parser;
use ludozero::actor::Actor;
use ludozero::game::GameConfig;
use ludozero::mcts::Evaluate;
use ludozero::mcts::Heuristic;
use ludozero::mcts::Search;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(about = "generate Ludo self-play games")]
struct Args {
    /// how many games to play
    #[arg(long, default_value_t = 1)]
    games: usize,
    /// simulations per move decision
    #[arg(long, default_value_t = ludozero::SIMULATIONS)]
    simulations: usize,
    /// PUCT exploration constant
    #[arg(long, default_value_t = ludozero::C_PUCT)]
    c_puct: f32,
    /// virtual loss applied per in-flight selector
    #[arg(long, default_value_t = ludozero::N_VL)]
    n_vl: i32,
    /// evaluation queue ring length
    #[arg(long, default_value_t = ludozero::EQ_LENGTH)]
    queue: usize,
    /// experience store directory
    #[arg(long, default_value = "experience")]
    store: PathBuf,
    /// game log directory
    #[arg(long, default_value = "games")]
    logs: PathBuf,
    /// base seed for dice and sampling
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// simulation worker threads, physical cores by default
    #[arg(long)]
    workers: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    ludozero::init();
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.workers.unwrap_or_else(num_cpus::get_physical))
        .build_global()?;
    let actor = Actor {
        games: args.games,
        search: Search {
            simulations: args.simulations,
            c_puct: args.c_puct,
            n_vl: args.n_vl,
        },
        queue_length: args.queue,
        cap: ludozero::MOVE_CAP,
        store: args.store,
        logs: args.logs,
        seed: args.seed,
    };
    actor.play(|config: &GameConfig| -> Arc<dyn Evaluate> {
        Arc::new(Heuristic::from(config.clone()))
    })
}
