use super::config::GameConfig;
use super::error::TurnError;
use super::model::AllMoves;
use super::model::LudoModel;
use super::moves::Move;
use super::state::State;
use crate::board::Roll;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Ludo is the actual game engine: the model plus the live state, the
/// cached enumeration for the state, the dice, and the winner. turns are
/// atomic; a rejected turn leaves everything untouched.
pub struct Ludo {
    model: LudoModel,
    state: State,
    all_current_moves: AllMoves,
    winner: Option<usize>,
    rng: SmallRng,
}

impl Ludo {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let model = LudoModel::from(config);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut state = State::new(model.config());
        state.dice_roll = Roll::toss(&mut rng);
        let all_current_moves = model
            .all_possible_moves(&state)
            .expect("opening position enumerates");
        Self {
            model,
            state,
            all_current_moves,
            winner: None,
            rng,
        }
    }

    /// back to the opening position, keeping the rng where it is
    pub fn reset(&mut self) {
        self.state = State::new(self.model.config());
        self.state.dice_roll = Roll::toss(&mut self.rng);
        self.all_current_moves = self
            .model
            .all_possible_moves(&self.state)
            .expect("opening position enumerates");
        self.winner = None;
    }

    pub fn model(&self) -> &LudoModel {
        &self.model
    }
    pub fn state(&self) -> &State {
        &self.state
    }
    pub fn winner(&self) -> Option<usize> {
        self.winner
    }
    pub fn all_current_moves(&self) -> &AllMoves {
        &self.all_current_moves
    }
    /// the moves the actual roll admits; empty means the pass move
    pub fn available_moves(&self) -> &[Move] {
        self.all_current_moves.bucket(self.state.dice_roll.sum())
    }

    /// take one move. the move id must follow the engine's last move id,
    /// and the move must be among the enumerated moves for the actual
    /// roll; otherwise the turn is a no-op reporting the condition. on
    /// success the state advances, the enumeration is refreshed, and the
    /// dice are rolled again.
    pub fn turn(&mut self, mv: &Move, move_id: u32) -> Result<(), TurnError> {
        if move_id != self.state.last_move_id + 1 {
            return Err(TurnError::StaleMove {
                expected: self.state.last_move_id + 1,
                got: move_id,
            });
        }
        let available = self.available_moves();
        let legal = match available.is_empty() {
            true => mv.is_pass(),
            false => available.contains(mv),
        };
        if !legal {
            return Err(TurnError::IllegalMove);
        }
        self.state = self.model.generate_next_state(&self.state, mv)?;
        if self.state.game_over {
            self.winner = self.model.winner(&self.state);
            log::info!(
                "game over after move {} (winner {:?})",
                self.state.last_move_id,
                self.winner
            );
        } else {
            self.all_current_moves = self.model.all_possible_moves(&self.state)?;
            self.state.dice_roll = Roll::toss(&mut self.rng);
            log::trace!("{}", self.state);
        }
        Ok(())
    }
}
