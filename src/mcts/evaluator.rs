use super::queue::EvaluationQueue;
use crate::Value;
use crate::board::Position;
use crate::game::Encoding;
use crate::game::GameConfig;
use std::sync::Arc;

/// the neural-network side of the boundary: a batch of encoded states in,
/// one scalar in [-1, 1] per state out. the trained network lives outside
/// the core behind this trait.
pub trait Evaluate: Send + Sync {
    fn evaluate(&self, batch: &[Encoding]) -> Vec<Value>;
}

/// fixed-output evaluator for tests and calibration runs
pub struct Constant(pub Value);

impl Evaluate for Constant {
    fn evaluate(&self, batch: &[Encoding]) -> Vec<Value> {
        vec![self.0; batch.len()]
    }
}

/// network stand-in scoring raw pawn progress: the mover's advancement
/// minus the best opponent's, scaled into [-1, 1]. good enough to make
/// untrained self-play games finish.
pub struct Heuristic {
    config: GameConfig,
}

impl From<GameConfig> for Heuristic {
    fn from(config: GameConfig) -> Self {
        Self { config }
    }
}

impl Heuristic {
    /// a pawn's share of its 58-step journey, read off its encoding row
    fn advancement(colour: crate::board::Colour, row: usize) -> Value {
        match row {
            0 => 0.,
            r @ 1..=52 => {
                let cell = Position::from(16 + r as u8);
                match colour.index(cell) {
                    Some(i) => (i + 1) as Value / 58.,
                    None => 0.,
                }
            }
            r => (r - 53 + 51 + 1) as Value / 58.,
        }
    }

    fn progress(&self, encoding: &Encoding, player: usize) -> Value {
        let mut total = 0.;
        for (group, colour) in self.config.in_play().enumerate() {
            if self.config.owner(colour) != player {
                continue;
            }
            for pawn in 0..4 {
                for row in 0..encoding.rows() {
                    if encoding.at(row, 5 * group + pawn) > 0. {
                        total += Self::advancement(colour, row);
                    }
                }
            }
        }
        total
    }
}

impl Evaluate for Heuristic {
    fn evaluate(&self, batch: &[Encoding]) -> Vec<Value> {
        batch
            .iter()
            .map(|encoding| {
                let mover = encoding.at(0, encoding.cols() - 1) as usize;
                let mine = self.progress(encoding, mover);
                let theirs = (0..self.config.n_players())
                    .filter(|p| *p != mover)
                    .map(|p| self.progress(encoding, p))
                    .fold(0., Value::max);
                let pawns = self.config.pawns(mover).count() as Value;
                ((mine - theirs) / pawns).clamp(-1., 1.)
            })
            .collect()
    }
}

/// run the consumer loop on a dedicated thread: drain a batch of pending
/// slots, encode, evaluate, settle, until the stop flag falls. one such
/// thread serves each player's tree.
pub fn spawn(
    queue: Arc<EvaluationQueue>,
    config: GameConfig,
    network: Arc<dyn Evaluate>,
) -> std::thread::JoinHandle<usize> {
    std::thread::spawn(move || {
        let mut served = 0;
        loop {
            if queue.stopped() {
                break;
            }
            let pending = queue.drain(crate::EQ_BATCH);
            if pending.is_empty() {
                std::thread::sleep(std::time::Duration::from_micros(crate::EQ_POLL_MICROS));
                continue;
            }
            let encodings = pending
                .iter()
                .map(|(_, state)| Encoding::from((state, &config)))
                .collect::<Vec<_>>();
            let values = network.evaluate(&encodings);
            served += values.len();
            queue.resolve(
                pending
                    .iter()
                    .map(|(ticket, _)| *ticket)
                    .zip(values)
                    .collect(),
            );
        }
        log::debug!("evaluator served {} leaves", served);
        served
    })
}
