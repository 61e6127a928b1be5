use super::trajectory;
use super::trajectory::GameLog;
use super::trajectory::Ply;
use super::trajectory::Trajectory;
use crate::game::Encoding;
use crate::game::GameConfig;
use crate::game::Ludo;
use crate::mcts::Evaluate;
use crate::mcts::EvaluationQueue;
use crate::mcts::Search;
use crate::mcts::Tree;
use crate::mcts::evaluator;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::path::PathBuf;
use std::sync::Arc;

/// Actor generates self-play games: one tree and one evaluation queue
/// per player, search on the mover's tree, every tree advancing in
/// lockstep with the engine, trajectories persisted per game.
pub struct Actor {
    pub games: usize,
    pub search: Search,
    pub queue_length: usize,
    pub cap: u32,
    pub store: PathBuf,
    pub logs: PathBuf,
    pub seed: u64,
}

impl Default for Actor {
    fn default() -> Self {
        Self {
            games: 1,
            search: Search::default(),
            queue_length: crate::EQ_LENGTH,
            cap: crate::MOVE_CAP,
            store: PathBuf::from("experience"),
            logs: PathBuf::from("games"),
            seed: 0,
        }
    }
}

impl Actor {
    /// colour assignments shuffle between games, so the caller hands in
    /// a factory producing the network boundary for each game's config
    pub fn play<F>(&self, network: F) -> anyhow::Result<()>
    where
        F: Fn(&GameConfig) -> Arc<dyn Evaluate>,
    {
        let progress = crate::progress(self.games);
        for game in 0..self.games {
            log::info!("playing game {}", game);
            let (moves, winner) = self.game(game, &network)?;
            log::info!("game {} finished after {} moves (winner {:?})", game, moves, winner);
            progress.inc(1);
        }
        progress.finish();
        Ok(())
    }

    fn game<F>(&self, game: usize, network: &F) -> anyhow::Result<(u32, Option<usize>)>
    where
        F: Fn(&GameConfig) -> Arc<dyn Evaluate>,
    {
        let mut rng = SmallRng::seed_from_u64(self.seed.wrapping_add(game as u64));
        let config = GameConfig::shuffled(&mut rng);
        let network = network(&config);
        let mut engine = Ludo::new(config.clone(), rng.random());
        let model = engine.model().clone();
        let players = config.n_players();

        let mut trees = (0..players)
            .map(|player| Tree::new(engine.state(), player))
            .collect::<Vec<_>>();
        for tree in trees.iter_mut() {
            tree.expand_root(&model)?;
        }
        let queues = (0..players)
            .map(|_| Arc::new(EvaluationQueue::new(self.queue_length)))
            .collect::<Vec<_>>();
        let evaluators = queues
            .iter()
            .map(|queue| evaluator::spawn(queue.clone(), config.clone(), network.clone()))
            .collect::<Vec<_>>();

        let mut trajectory = Trajectory::default();
        let mut journal = GameLog::default();
        while !engine.state().game_over && engine.state().last_move_id < self.cap {
            let state = engine.state().clone();
            trajectory.states.push(Encoding::from((&state, &config)));
            for tree in trees.iter_mut() {
                tree.prune_root(state.dice_roll);
            }
            let player = state.current_player;
            let depth = self
                .search
                .rollout(&trees[player], &model, &queues[player]);
            let temperature = match state.last_move_id > crate::GREEDY_AFTER {
                true => 0.,
                false => 1.,
            };
            let (index, mv, candidates) = trees[player].select_move(temperature, &mut rng);
            log::debug!(
                "move {:>4} player {} depth {:>3} took {}",
                state.last_move_id,
                player,
                depth,
                mv
            );
            // enumeration order is deterministic, so the chosen absolute
            // index addresses the same move in every player's tree
            for tree in trees.iter_mut() {
                tree.advance(index, &model)?;
            }
            engine.turn(&mv, state.last_move_id + 1)?;
            journal.game.push(Ply {
                game_state: state.get(),
                move_id: state.last_move_id,
                r#move: serde_json::Value::from(&mv),
                top_moves: candidates,
            });
        }

        trajectory.states.push(Encoding::from((engine.state(), &config)));
        trajectory.player_won = engine.winner();
        journal.player_won = engine.winner();
        let name = trajectory::game_name();
        trajectory::save(&trajectory, &self.store, &name)?;
        trajectory::save(&journal, &self.logs, &name)?;

        for queue in queues.iter() {
            queue.set_stop();
        }
        for handle in evaluators {
            handle.join().ok();
        }
        let drops = queues.iter().map(|q| q.drops()).sum::<usize>();
        if drops > 0 {
            log::warn!("{} simulations lost to a full queue", drops);
        }
        Ok((engine.state().last_move_id, engine.winner()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcts::Constant;
    use serde_json::json;

    fn constant(_: &GameConfig) -> Arc<dyn Evaluate> {
        Arc::new(Constant(0.))
    }

    /// a few moves of the full loop. the engine rejects any move whose
    /// enumeration drifted from the trees', so surviving to the cap is
    /// the lockstep assertion.
    #[test]
    fn short_game_runs_to_the_cap() {
        let actor = Actor {
            games: 1,
            search: Search {
                simulations: 8,
                ..Search::default()
            },
            queue_length: 1024,
            cap: 5,
            store: std::env::temp_dir().join("ludozero-actor-store"),
            logs: std::env::temp_dir().join("ludozero-actor-logs"),
            seed: 11,
        };
        let (moves, _) = actor.game(0, &constant).unwrap();
        assert!(moves == 5);
    }

    #[test]
    fn persisted_games_are_readable() {
        let store = std::env::temp_dir().join("ludozero-actor-roundtrip");
        let actor = Actor {
            games: 1,
            search: Search {
                simulations: 4,
                ..Search::default()
            },
            queue_length: 1024,
            cap: 3,
            store: store.clone(),
            logs: store.clone(),
            seed: 23,
        };
        actor.game(0, &constant).unwrap();
        let entry = std::fs::read_dir(&store).unwrap().next().unwrap().unwrap();
        let text = std::fs::read_to_string(entry.path()).unwrap();
        let record: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(record != json!(null));
        std::fs::remove_dir_all(&store).unwrap();
    }
}
