use crate::Probability;
use crate::Value;
use crate::game::Ludo;
use crate::game::Move;
use crate::mcts::Evaluate;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::sync::Arc;

/// move-level agents that skip tree search entirely: pick a move
/// straight from the engine's enumeration for the actual roll
pub trait Agent {
    fn act(&mut self, engine: &Ludo) -> Move;
}

/// uniform random baseline
pub struct RandomAgent {
    rng: SmallRng,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn act(&mut self, engine: &Ludo) -> Move {
        match engine.available_moves() {
            [] => Move::pass(),
            moves => moves[self.rng.random_range(0..moves.len())].clone(),
        }
    }
}

/// one-ply greedy agent: evaluate every state reachable under the
/// actual roll from the mover's perspective and sample a move by a
/// softmax over the values. this is the cheap self-play path used when
/// full search is not worth its latency.
pub struct ValueAgent {
    network: Arc<dyn Evaluate>,
    temperature: f32,
    rng: SmallRng,
}

impl ValueAgent {
    pub fn new(network: Arc<dyn Evaluate>, temperature: f32, seed: u64) -> Self {
        Self {
            network,
            temperature,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn softmax(&self, values: &[Value]) -> Vec<Probability> {
        let temperature = self.temperature.max(0.001);
        let top = values.iter().copied().fold(Value::MIN, Value::max);
        let weights = values
            .iter()
            .map(|v| ((v - top) / temperature).exp())
            .collect::<Vec<_>>();
        let total = weights.iter().sum::<Probability>();
        weights.into_iter().map(|w| w / total).collect()
    }
}

impl Agent for ValueAgent {
    fn act(&mut self, engine: &Ludo) -> Move {
        let (encodings, moves) = match engine.model().next_states_and_moves(engine.state()) {
            Ok(pair) => pair,
            Err(error) => {
                log::warn!("enumeration failed, passing: {}", error);
                return Move::pass();
            }
        };
        if moves.is_empty() {
            return Move::pass();
        }
        let values = self.network.evaluate(&encodings);
        let densities = self.softmax(&values);
        let mut spin: Probability = self.rng.random();
        for (mv, density) in moves.iter().zip(densities.iter()) {
            spin -= density;
            if spin < 0. {
                return mv.clone();
            }
        }
        moves[0].clone()
    }
}
