use super::block::Block;
use super::config::GameConfig;
use super::error::TurnError;
use super::moves::Move;
use super::moves::Step;
use super::state::State;
use super::tensor::Encoding;
use crate::board::Aggregate;
use crate::board::Pawn;
use crate::board::Position;
use crate::board::Roll;
use crate::board::RollSum;
use serde_json::Value;
use serde_json::json;

/// every move a state admits, bucketed by roll sum. buckets at the
/// illegal sums stay empty and surface as the pass move downstream.
#[derive(Debug, Clone, Default)]
pub struct AllMoves {
    buckets: Vec<Vec<Move>>,
}

impl AllMoves {
    pub fn bucket(&self, sum: RollSum) -> &[Move] {
        &self.buckets[sum.index()]
    }
    /// flatten into the tree's move array: every bucket contributes its
    /// moves, or the single pass placeholder when it has none
    pub fn flatten(&self) -> (Vec<Move>, [u16; RollSum::COUNT]) {
        let mut moves = Vec::new();
        let mut partition = [0u16; RollSum::COUNT];
        for (sum, bucket) in self.buckets.iter().enumerate() {
            if bucket.is_empty() {
                partition[sum] = 1;
                moves.push(Move::pass());
            } else {
                partition[sum] = bucket.len() as u16;
                moves.extend(bucket.iter().cloned());
            }
        }
        (moves, partition)
    }
}

/// LudoModel is the rule engine: a pure function library over states.
/// it holds nothing but the colour partition and never mutates its
/// inputs, so search threads share one model with no synchronization.
#[derive(Debug, Clone)]
pub struct LudoModel {
    config: GameConfig,
}

impl From<GameConfig> for LudoModel {
    fn from(config: GameConfig) -> Self {
        Self { config }
    }
}

impl LudoModel {
    pub fn config(&self) -> &GameConfig {
        &self.config
    }
    fn owner(&self, pawns: Aggregate) -> usize {
        let first = pawns.iter().next().expect("non-empty aggregate");
        self.config.owner(first.colour())
    }
    fn opponent_block_at(&self, state: &State, player: usize, cell: Position) -> bool {
        state
            .blocks()
            .iter()
            .any(|b| b.pos == cell && self.owner(b.pawns) != player)
    }

    /// candidates for the next substep, before any dice are considered:
    /// standing singles off the finale cells, same-cell pairs of standing
    /// singles, whole blocks, and the members of loose or starred blocks.
    /// duplicates are harmless; the validator filters what dice allow.
    pub fn next_possible_pawns(&self, state: &State) -> Vec<(Aggregate, Position)> {
        let player = state.current_player;
        let mut candidates = Vec::new();
        for pos in (1..Position::COUNT as u8).map(Position::from) {
            if pos.is_finale() {
                continue;
            }
            let singles = state.singles_at(player, pos);
            for pawn in singles.iter() {
                candidates.push((Aggregate::from(pawn), pos));
            }
            let standing = singles.iter().collect::<Vec<_>>();
            for i in 0..standing.len() {
                for j in i + 1..standing.len() {
                    candidates.push((Aggregate::from((standing[i], standing[j])), pos));
                }
            }
        }
        for block in state.blocks() {
            if self.owner(block.pawns) != player {
                continue;
            }
            candidates.push((block.pawns, block.pos));
            if block.pos.is_star() || !block.rigid {
                for pawn in block.pawns.iter() {
                    candidates.push((Aggregate::from(pawn), block.pos));
                }
            }
        }
        candidates
    }

    /// whether one throw can move the candidate, and where it would land
    pub fn validate(
        &self,
        state: &State,
        roll: u8,
        from: Position,
        pawns: Aggregate,
    ) -> Option<Position> {
        let player = state.current_player;
        match pawns.single() {
            // single pawn
            Some(pawn) => {
                let colour = pawn.colour();
                if from.is_base() {
                    // only a six leaves the base, straight onto the entry
                    return if roll == 6 { Some(colour.track(0)) } else { None };
                }
                let index = colour.index(from)?;
                if index + roll as usize >= 57 {
                    return None;
                }
                // no jumping over opponent blocks, except across entry stars
                for i in index + 1..index + roll as usize {
                    let cell = colour.track(i);
                    if !cell.is_entry_star() && self.opponent_block_at(state, player, cell) {
                        return None;
                    }
                }
                let destination = colour.track(index + roll as usize);
                // a cell holding one of our blocks plus one of our singles is full
                if !destination.is_entry_star() && !destination.is_finale() {
                    let blocked = state
                        .blocks()
                        .iter()
                        .any(|b| b.pos == destination && self.owner(b.pawns) == player);
                    if blocked && !state.singles_at(player, destination).is_empty() {
                        return None;
                    }
                }
                Some(destination)
            }
            // two-pawn block
            None => {
                if roll % 2 != 0 {
                    return None;
                }
                let half = (roll / 2) as usize;
                let mut pair = pawns.iter();
                let lead = pair.next()?;
                let mate = pair.next()?;
                let li = lead.colour().index(from)?;
                let mi = mate.colour().index(from)?;
                if li + half >= 57 || mi + half >= 57 {
                    return None;
                }
                let destination = lead.colour().track(li + half);
                if destination != mate.colour().track(mi + half) {
                    return None;
                }
                for i in li + 1..li + half {
                    let cell = lead.colour().track(i);
                    if !cell.is_entry_star() && self.opponent_block_at(state, player, cell) {
                        return None;
                    }
                }
                // blocks stack only on the finale
                if !destination.is_finale()
                    && state
                        .blocks()
                        .iter()
                        .any(|b| b.pos == destination && self.owner(b.pawns) == player)
                {
                    return None;
                }
                Some(destination)
            }
        }
    }

    /// apply one validated substep in place, returning the extra throws
    /// it grants (captures, finale arrivals)
    fn apply(
        &self,
        state: &mut State,
        roll: u8,
        from: Position,
        pawns: Aggregate,
    ) -> Result<u16, TurnError> {
        match pawns.single() {
            Some(pawn) => self.apply_single(state, roll, from, pawn),
            None => self.apply_block(state, roll, from, pawns),
        }
    }

    fn apply_single(
        &self,
        state: &mut State,
        roll: u8,
        from: Position,
        pawn: Pawn,
    ) -> Result<u16, TurnError> {
        let player = state.current_player;
        let colour = pawn.colour();
        let mut grants = 0;
        let destination = if from.is_base() {
            colour.track(0)
        } else {
            let index = colour
                .index(from)
                .ok_or(TurnError::Corrupt("pawn off its track"))?;
            colour.track(index + roll as usize)
        };
        state.displace(player, pawn, from);
        state.place(player, pawn, destination);
        // a pawn walking out of its block dissolves it; the mate stays put
        if let Some(i) = state.block_of(pawn) {
            state.remove_block(i);
        }
        // pawns left sharing the vacated cell close ranks into a loose block
        if !from.is_entry_star() {
            let strays = state.singles_at(player, from);
            if strays.count() >= 2 {
                let pair = strays.iter().take(2).collect::<Aggregate>();
                state.push_block(Block::new(pair, from, false))?;
            }
        }
        // unprotected opponent singles off the stars go home
        if !destination.is_star() {
            for other in (0..state.n_players).filter(|p| *p != player) {
                if let Some(prey) = state.singles_at(other, destination).iter().next() {
                    state.displace(other, prey, destination);
                    state.place(other, prey, prey.base());
                    grants += 1;
                }
            }
        }
        // meeting one of our own singles forms a loose block on arrival
        if !destination.is_entry_star() && !destination.is_finale() {
            let strays = state.singles_at(player, destination);
            if strays.count() >= 2 {
                let mate = strays
                    .iter()
                    .find(|p| *p != pawn)
                    .ok_or(TurnError::Corrupt("pawn doubled in aggregate"))?;
                state.push_block(Block::new(Aggregate::from((pawn, mate)), destination, false))?;
            }
        }
        if destination.is_finale() && !state.completed(player) {
            grants += 1;
        }
        Ok(grants)
    }

    fn apply_block(
        &self,
        state: &mut State,
        roll: u8,
        from: Position,
        pawns: Aggregate,
    ) -> Result<u16, TurnError> {
        let player = state.current_player;
        let mut grants = 0;
        let lead = pawns.iter().next().expect("pair aggregate");
        let index = lead
            .colour()
            .index(from)
            .ok_or(TurnError::Corrupt("block off its track"))?;
        let destination = lead.colour().track(index + (roll / 2) as usize);
        // leaving an entry star mints the block; elsewhere find it, healing
        // the descriptor by pawn substitution if it has drifted
        if from.is_entry_star() {
            state.push_block(Block::new(pawns, destination, false))?;
        } else {
            let i = match state.block_by_pawns(pawns) {
                Some(i) => i,
                None => {
                    let i = state
                        .blocks()
                        .iter()
                        .position(|b| b.pos == from && self.owner(b.pawns) == player)
                        .ok_or(TurnError::Corrupt("block descriptor lost"))?;
                    state.blocks_mut()[i].pawns = pawns;
                    i
                }
            };
            state.blocks_mut()[i].pos = destination;
        }
        for pawn in pawns.iter() {
            state.displace(player, pawn, from);
            state.place(player, pawn, destination);
        }
        // an opponent block off the stars is crushed wholesale
        if !destination.is_star() {
            for other in (0..state.n_players).filter(|p| *p != player) {
                let hit = state
                    .blocks()
                    .iter()
                    .position(|b| b.pos == destination && self.owner(b.pawns) == other);
                if let Some(i) = hit {
                    let prey = state.blocks()[i].pawns;
                    state.remove_block(i);
                    for p in prey.iter() {
                        state.displace(other, p, destination);
                        state.place(other, p, p.base());
                    }
                    grants += 2;
                }
            }
        }
        let i = state
            .block_by_pawns(pawns)
            .ok_or(TurnError::Corrupt("block descriptor lost"))?;
        if destination.is_finale() || destination.is_entry_star() {
            state.remove_block(i);
        } else if destination.is_star() {
            state.blocks_mut()[i].rigid = false;
        } else {
            state.blocks_mut()[i].rigid = true;
        }
        if destination.is_finale() && !state.completed(player) {
            grants += 2;
        }
        Ok(grants)
    }

    /// depth-first enumeration of every sequence of validated substeps
    /// consuming the given throws in order. a prefix that leaves the
    /// mover with nothing off the finale is emitted as a complete move.
    fn descend(
        &self,
        state: &State,
        throws: &[u8],
        prefix: Vec<Step>,
    ) -> Result<Vec<Move>, TurnError> {
        let (roll, rest) = match throws.split_first() {
            None => return Ok(vec![Move::from(prefix)]),
            Some((roll, rest)) => (*roll, rest),
        };
        let mut moves = Vec::new();
        for (pawns, from) in self.next_possible_pawns(state) {
            if let Some(to) = self.validate(state, roll, from, pawns) {
                let mut child = state.clone();
                self.apply(&mut child, roll, from, pawns)?;
                let mut steps = prefix.clone();
                steps.push(Step { pawns, from, to });
                if child.completed(child.current_player) {
                    return Ok(vec![Move::from(steps)]);
                }
                moves.extend(self.descend(&child, rest, steps)?);
            }
        }
        Ok(moves)
    }

    /// every validated move sequence for one concrete roll
    pub fn moves_for(&self, state: &State, roll: Roll) -> Result<Vec<Move>, TurnError> {
        self.descend(state, &Vec::<u8>::from(roll), Vec::new())
    }

    /// every validated move sequence for all 15 legal rolls
    pub fn all_possible_moves(&self, state: &State) -> Result<AllMoves, TurnError> {
        let mut buckets = vec![Vec::new(); RollSum::COUNT];
        for roll in RollSum::rolls() {
            buckets[roll.sum().index()] = self.moves_for(state, roll)?;
        }
        Ok(AllMoves { buckets })
    }

    /// boundary form of the enumeration: the 15 legal rolls plus the
    /// explicit impossible triple six with no moves
    pub fn all_possible_moves_json(&self, state: &State) -> Result<Value, TurnError> {
        let mut rolls = RollSum::rolls().collect::<Vec<_>>();
        rolls.push(Roll::from([6, 6, 6].as_slice()));
        let entries = rolls
            .into_iter()
            .map(|roll| {
                let moves = match roll.sum().is_legal() {
                    true => self.moves_for(state, roll)?,
                    false => Vec::new(),
                };
                Ok(json!({
                    "roll": Vec::<u8>::from(roll),
                    "moves": moves.iter().map(Value::from).collect::<Vec<_>>(),
                }))
            })
            .collect::<Result<Vec<_>, TurnError>>()?;
        Ok(Value::Array(entries))
    }

    /// the whole-move transition: consume one pending extra throw, walk
    /// the substeps against the dice in throw order accumulating freshly
    /// granted throws, bump the move id, rotate the turn when nothing is
    /// pending, and refresh the terminal flag
    pub fn generate_next_state(&self, state: &State, mv: &Move) -> Result<State, TurnError> {
        let mut next = state.clone();
        if next.num_more_moves > 0 {
            next.num_more_moves -= 1;
        }
        if !mv.is_pass() {
            let throws = Vec::<u8>::from(next.dice_roll);
            let mut grants = 0;
            for (step, roll) in mv.steps().iter().zip(throws) {
                grants += self.apply(&mut next, roll, step.from, step.pawns)?;
            }
            next.num_more_moves += grants;
        }
        next.last_move_id += 1;
        if next.num_more_moves == 0 {
            next.current_player = (next.current_player + 1) % next.n_players;
        }
        next.game_over = (0..next.n_players)
            .filter(|p| *p != next.current_player)
            .all(|p| next.completed(p));
        Ok(next)
    }

    pub fn check_completed(&self, state: &State, player: usize) -> bool {
        state.completed(player)
    }
    pub fn winner(&self, state: &State) -> Option<usize> {
        (0..state.n_players).find(|p| state.completed(*p))
    }

    /// the greedy value-agent surface: encodings of every state reachable
    /// under the actual roll, seen from the mover's perspective, paired
    /// with the moves that reach them
    pub fn next_states_and_moves(
        &self,
        state: &State,
    ) -> Result<(Vec<Encoding>, Vec<Move>), TurnError> {
        let moves = self.moves_for(state, state.dice_roll)?;
        let encodings = moves
            .iter()
            .map(|mv| {
                let mut next = self.generate_next_state(state, mv)?;
                next.current_player = state.current_player;
                Ok(Encoding::from((&next, &self.config)))
            })
            .collect::<Result<Vec<_>, TurnError>>()?;
        Ok((encodings, moves))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pawn(name: &str) -> Pawn {
        Pawn::try_from(name).unwrap()
    }
    fn pos(name: &str) -> Position {
        Position::try_from(name).unwrap()
    }
    fn model() -> LudoModel {
        LudoModel::from(GameConfig::two_player())
    }
    /// march a pawn from wherever it stands to the given cell
    fn teleport(state: &mut State, player: usize, name: &str, to: &str) {
        let pawn = pawn(name);
        let from = state.whereabouts(player, pawn).unwrap();
        state.displace(player, pawn, from);
        state.place(player, pawn, pos(to));
    }

    #[test]
    fn six_opens_base() {
        let model = model();
        let state = State::new(model.config());
        let moves = model.moves_for(&state, Roll::from([6].as_slice())).unwrap();
        assert!(moves.len() == 8);
        for mv in &moves {
            let step = mv.steps()[0];
            assert!(step.from.is_base());
            let mover = step.pawns.single().unwrap();
            assert!(step.to == mover.colour().entry());
        }
    }

    #[test]
    fn small_rolls_admit_nothing_from_base() {
        let model = model();
        let state = State::new(model.config());
        for throw in 1..=5u8 {
            let moves = model
                .moves_for(&state, Roll::from([throw].as_slice()))
                .unwrap();
            assert!(moves.is_empty());
        }
    }

    #[test]
    fn auto_block_on_landing() {
        let model = model();
        let mut state = State::new(model.config());
        teleport(&mut state, 0, "R1", "P10");
        teleport(&mut state, 0, "R2", "P4");
        state.dice_roll = Roll::from([6].as_slice());
        let mv = Move::from(vec![Step {
            pawns: Aggregate::from(pawn("R2")),
            from: pos("P4"),
            to: pos("P10"),
        }]);
        let next = model.generate_next_state(&state, &mv).unwrap();
        assert!(next.blocks().len() == 1);
        let block = next.blocks()[0];
        assert!(block.pos == pos("P10"));
        assert!(!block.rigid);
        assert!(block.pawns == Aggregate::from((pawn("R1"), pawn("R2"))));
        assert!(next.singles_at(0, pos("P10")).is_empty());
    }

    #[test]
    fn capture_grants_extra_move() {
        let model = model();
        let mut state = State::new(model.config());
        teleport(&mut state, 0, "R1", "P20");
        teleport(&mut state, 1, "G1", "P23");
        // P23 is an intermediate star: safe, no capture
        state.dice_roll = Roll::from([3].as_slice());
        let safe = model
            .generate_next_state(
                &state,
                &Move::from(vec![Step {
                    pawns: Aggregate::from(pawn("R1")),
                    from: pos("P20"),
                    to: pos("P23"),
                }]),
            )
            .unwrap();
        assert!(safe.num_more_moves == 0);
        assert!(safe.at(1, pos("P23")).contains(pawn("G1")));
        // off the star the green pawn goes home and red rolls again
        teleport(&mut state, 1, "G1", "P24");
        state.dice_roll = Roll::from([4].as_slice());
        let next = model
            .generate_next_state(
                &state,
                &Move::from(vec![Step {
                    pawns: Aggregate::from(pawn("R1")),
                    from: pos("P20"),
                    to: pos("P24"),
                }]),
            )
            .unwrap();
        assert!(next.num_more_moves == 1);
        assert!(next.current_player == 0);
        assert!(next.at(1, pos("GB1")).contains(pawn("G1")));
        assert!(next.at(1, pos("P24")).is_empty());
    }

    #[test]
    fn rigid_block_moves_even_only() {
        let model = model();
        let mut state = State::new(model.config());
        teleport(&mut state, 0, "R1", "P16");
        teleport(&mut state, 0, "R2", "P16");
        state
            .push_block(Block::new(
                Aggregate::from((pawn("R1"), pawn("R2"))),
                pos("P16"),
                true,
            ))
            .unwrap();
        let odd = model.moves_for(&state, Roll::from([3].as_slice())).unwrap();
        assert!(odd.is_empty());
        let even = model.moves_for(&state, Roll::from([4].as_slice())).unwrap();
        assert!(even.len() == 1);
        assert!(even[0].steps()[0].is_block());
        assert!(even[0].steps()[0].to == pos("P18"));
    }

    #[test]
    fn loose_block_members_move_alone() {
        let model = model();
        let mut state = State::new(model.config());
        teleport(&mut state, 0, "R1", "P16");
        teleport(&mut state, 0, "R2", "P16");
        state
            .push_block(Block::new(
                Aggregate::from((pawn("R1"), pawn("R2"))),
                pos("P16"),
                false,
            ))
            .unwrap();
        let moves = model.moves_for(&state, Roll::from([3].as_slice())).unwrap();
        assert!(moves.len() == 2);
        assert!(moves.iter().all(|m| !m.steps()[0].is_block()));
    }

    #[test]
    fn finale_absorbs() {
        let model = model();
        let mut state = State::new(model.config());
        teleport(&mut state, 0, "R1", "RH5");
        state.dice_roll = Roll::from([1].as_slice());
        let to_finale = model.moves_for(&state, state.dice_roll).unwrap();
        assert!(to_finale.len() == 1);
        assert!(to_finale[0].steps()[0].to == pos("RH6"));
        let next = model.generate_next_state(&state, &to_finale[0]).unwrap();
        // other pawns remain outside the home stretch: one more throw
        assert!(next.num_more_moves == 1);
        // the finale pawn never moves again
        for roll in RollSum::rolls() {
            for mv in model.moves_for(&next, roll).unwrap() {
                for step in mv.steps() {
                    assert!(!step.pawns.contains(pawn("R1")));
                }
            }
        }
    }

    #[test]
    fn overrun_is_invalid() {
        let model = model();
        let mut state = State::new(model.config());
        teleport(&mut state, 0, "R1", "RH5");
        let moves = model.moves_for(&state, Roll::from([2].as_slice())).unwrap();
        assert!(moves.is_empty());
    }

    #[test]
    fn triple_six_wastes_turn() {
        let model = model();
        let state = State::new(model.config());
        let all = model.all_possible_moves(&state).unwrap();
        let triple = Roll::from([6, 6, 6].as_slice());
        assert!(all.bucket(triple.sum()).is_empty());
        let mut rolled = state.clone();
        rolled.dice_roll = triple;
        let next = model.generate_next_state(&rolled, &Move::pass()).unwrap();
        assert!(next.current_player == 1);
        assert!(next.census(0) == 8 && next.census(1) == 8);
        assert!(next.last_move_id == rolled.last_move_id + 1);
    }

    #[test]
    fn jump_over_blocked_by_opponent_block() {
        let model = model();
        let mut state = State::new(model.config());
        teleport(&mut state, 0, "R1", "P20");
        teleport(&mut state, 1, "G1", "P22");
        teleport(&mut state, 1, "G2", "P22");
        state
            .push_block(Block::new(
                Aggregate::from((pawn("G1"), pawn("G2"))),
                pos("P22"),
                true,
            ))
            .unwrap();
        // jumping over the block is out; landing short of it is fine
        assert!(
            model
                .validate(&state, 3, pos("P20"), Aggregate::from(pawn("R1")))
                .is_none()
        );
        assert!(
            model
                .validate(&state, 1, pos("P20"), Aggregate::from(pawn("R1")))
                .is_some()
        );
    }

    #[test]
    fn block_capture_grants_two() {
        let model = model();
        let mut state = State::new(model.config());
        for name in ["R1", "R2"] {
            teleport(&mut state, 0, name, "P20");
        }
        state
            .push_block(Block::new(
                Aggregate::from((pawn("R1"), pawn("R2"))),
                pos("P20"),
                true,
            ))
            .unwrap();
        for name in ["G1", "G2"] {
            teleport(&mut state, 1, name, "P22");
        }
        state
            .push_block(Block::new(
                Aggregate::from((pawn("G1"), pawn("G2"))),
                pos("P22"),
                true,
            ))
            .unwrap();
        state.dice_roll = Roll::from([4].as_slice());
        let mv = Move::from(vec![Step {
            pawns: Aggregate::from((pawn("R1"), pawn("R2"))),
            from: pos("P20"),
            to: pos("P22"),
        }]);
        let next = model.generate_next_state(&state, &mv).unwrap();
        assert!(next.num_more_moves == 2);
        assert!(next.current_player == 0);
        assert!(next.at(1, pos("GB1")).contains(pawn("G1")));
        assert!(next.at(1, pos("GB2")).contains(pawn("G2")));
        assert!(next.blocks().len() == 1);
        assert!(next.blocks()[0].pos == pos("P22"));
        assert!(next.blocks()[0].rigid);
    }

    #[test]
    fn block_loosens_on_intermediate_star() {
        let model = model();
        let mut state = State::new(model.config());
        for name in ["R1", "R2"] {
            teleport(&mut state, 0, name, "P20");
        }
        state
            .push_block(Block::new(
                Aggregate::from((pawn("R1"), pawn("R2"))),
                pos("P20"),
                true,
            ))
            .unwrap();
        state.dice_roll = Roll::from([6].as_slice());
        let mv = Move::from(vec![Step {
            pawns: Aggregate::from((pawn("R1"), pawn("R2"))),
            from: pos("P20"),
            to: pos("P23"),
        }]);
        let next = model.generate_next_state(&state, &mv).unwrap();
        // P23 is an intermediate star: the block survives but loosens
        assert!(next.blocks().len() == 1);
        assert!(!next.blocks()[0].rigid);
        assert!(next.blocks()[0].pos == pos("P23"));
    }

    #[test]
    fn every_enumerated_move_yields_a_sane_state() {
        let model = model();
        let mut state = State::new(model.config());
        teleport(&mut state, 0, "R1", "P5");
        teleport(&mut state, 0, "Y1", "P30");
        teleport(&mut state, 1, "G1", "P33");
        for roll in RollSum::rolls() {
            let mut rolled = state.clone();
            rolled.dice_roll = roll;
            for mv in model.moves_for(&state, roll).unwrap() {
                let next = model.generate_next_state(&rolled, &mv).unwrap();
                assert!(next.census(0) == 8);
                assert!(next.census(1) == 8);
                for block in next.blocks() {
                    for p in block.pawns.iter() {
                        assert!(next.at(model.config.owner(p.colour()), block.pos).contains(p));
                    }
                }
            }
        }
    }
}
