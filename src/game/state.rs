use super::block::Block;
use super::config::GameConfig;
use super::error::TurnError;
use crate::board::Aggregate;
use crate::board::Pawn;
use crate::board::Position;
use crate::board::Roll;
use serde_json::Value;
use serde_json::json;

/// the most blocks a legal position can carry
pub const MAX_BLOCKS: usize = 16;

/// State is the packed representation of a position in between moves.
/// every pawn, blocked or not, occupies exactly one digit of exactly one
/// per-cell aggregate; blocks are an overlay on top of the aggregates.
/// states are values: the rule engine derives children by deep copy.
#[derive(Debug, Clone)]
pub struct State {
    pub n_players: usize,
    pub game_over: bool,
    pub current_player: usize,
    pub num_more_moves: u16,
    pub dice_roll: Roll,
    pub last_move_id: u32,
    pawn_pos: Vec<Aggregate>,
    num_blocks: usize,
    blocks: [Block; MAX_BLOCKS],
}

impl State {
    /// the opening position: every pawn on its base slot
    pub fn new(config: &GameConfig) -> Self {
        let mut state = Self {
            n_players: config.n_players(),
            game_over: false,
            current_player: 0,
            num_more_moves: 0,
            dice_roll: Roll::default(),
            last_move_id: 0,
            pawn_pos: vec![Aggregate::EMPTY; config.n_players() * Position::COUNT],
            num_blocks: 0,
            blocks: [Block::default(); MAX_BLOCKS],
        };
        for player in 0..config.n_players() {
            for pawn in config.pawns(player) {
                state.place(player, pawn, pawn.base());
            }
        }
        state
    }

    /// the pawns a player has on a cell, blocked ones included
    pub fn at(&self, player: usize, pos: Position) -> Aggregate {
        self.pawn_pos[player * Position::COUNT + usize::from(pos)]
    }
    pub fn place(&mut self, player: usize, pawn: Pawn, pos: Position) {
        self.pawn_pos[player * Position::COUNT + usize::from(pos)].push(pawn);
    }
    pub fn displace(&mut self, player: usize, pawn: Pawn, pos: Position) {
        self.pawn_pos[player * Position::COUNT + usize::from(pos)].remove(pawn);
    }
    /// the cell a pawn currently occupies
    pub fn whereabouts(&self, player: usize, pawn: Pawn) -> Option<Position> {
        (1..Position::COUNT as u8)
            .map(Position::from)
            .find(|pos| self.at(player, *pos).contains(pawn))
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks[..self.num_blocks]
    }
    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks[..self.num_blocks]
    }
    pub fn push_block(&mut self, block: Block) -> Result<(), TurnError> {
        if self.num_blocks == MAX_BLOCKS {
            return Err(TurnError::Corrupt("more than 16 blocks"));
        }
        self.blocks[self.num_blocks] = block;
        self.num_blocks += 1;
        Ok(())
    }
    pub fn remove_block(&mut self, index: usize) {
        assert!(index < self.num_blocks);
        self.blocks.copy_within(index + 1..self.num_blocks, index);
        self.num_blocks -= 1;
        self.blocks[self.num_blocks] = Block::default();
    }
    /// the block a pawn is committed to, if any
    pub fn block_of(&self, pawn: Pawn) -> Option<usize> {
        self.blocks().iter().position(|b| b.contains(pawn))
    }
    pub fn block_by_pawns(&self, pawns: Aggregate) -> Option<usize> {
        self.blocks().iter().position(|b| b.pawns == pawns)
    }

    /// the player's individually standing pawns on a cell:
    /// the aggregate minus every pawn committed to a block there
    pub fn singles_at(&self, player: usize, pos: Position) -> Aggregate {
        self.at(player, pos)
            .iter()
            .filter(|p| {
                self.block_of(*p)
                    .is_none_or(|i| self.blocks[i].pos != pos)
            })
            .collect()
    }

    /// a player is done when every pawn of theirs rests on a finale cell.
    /// blocked pawns never rest on finale cells, so any surviving block
    /// keeps the player in the game.
    pub fn completed(&self, player: usize) -> bool {
        (1..Position::COUNT as u8)
            .map(Position::from)
            .filter(|pos| !pos.is_finale())
            .all(|pos| self.at(player, pos).is_empty())
    }

    /// total pawns a player has on the board, for invariant checks
    pub fn census(&self, player: usize) -> usize {
        (1..Position::COUNT as u8)
            .map(Position::from)
            .map(|pos| self.at(player, pos).count())
            .sum()
    }
}

/// the canonical dictionary boundary. stable keys per the engine surface:
/// n_players, game_over, current_player, num_more_moves, dice_roll,
/// last_move_id, "Player k" pawn->position mappings, all_blocks.
impl State {
    pub fn get(&self) -> Value {
        let mut dict = json!({
            "n_players": self.n_players,
            "game_over": self.game_over,
            "current_player": self.current_player,
            "num_more_moves": self.num_more_moves,
            "dice_roll": Vec::<u8>::from(self.dice_roll),
            "last_move_id": self.last_move_id,
            "all_blocks": self
                .blocks()
                .iter()
                .map(|b| json!({
                    "pawns": b.pawns.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
                    "pos": b.pos.to_string(),
                    "rigid": b.rigid,
                }))
                .collect::<Vec<_>>(),
        });
        for player in 0..self.n_players {
            let mut pawns = serde_json::Map::new();
            for pos in (1..Position::COUNT as u8).map(Position::from) {
                for pawn in self.at(player, pos).iter() {
                    pawns.insert(pawn.to_string(), json!(pos.to_string()));
                }
            }
            dict[format!("Player {}", player)] = Value::Object(pawns);
        }
        dict
    }

    pub fn set(dict: &Value) -> Result<Self, &'static str> {
        let n_players = dict["n_players"].as_u64().ok_or("n_players")? as usize;
        let throws = dict["dice_roll"]
            .as_array()
            .ok_or("dice_roll")?
            .iter()
            .map(|d| d.as_u64().map(|d| d as u8).ok_or("dice throw"))
            .collect::<Result<Vec<_>, _>>()?;
        if throws.len() > 3 || throws.iter().any(|d| !(1..=6).contains(d)) {
            return Err("dice roll out of range");
        }
        let mut state = Self {
            n_players,
            game_over: dict["game_over"].as_bool().ok_or("game_over")?,
            current_player: dict["current_player"].as_u64().ok_or("current_player")? as usize,
            num_more_moves: dict["num_more_moves"].as_u64().ok_or("num_more_moves")? as u16,
            dice_roll: Roll::from(throws.as_slice()),
            last_move_id: dict["last_move_id"].as_u64().ok_or("last_move_id")? as u32,
            pawn_pos: vec![Aggregate::EMPTY; n_players * Position::COUNT],
            num_blocks: 0,
            blocks: [Block::default(); MAX_BLOCKS],
        };
        for player in 0..n_players {
            let pawns = dict[format!("Player {}", player)]
                .as_object()
                .ok_or("player mapping")?;
            for (pawn, pos) in pawns {
                let pawn = Pawn::try_from(pawn.as_str())?;
                let pos = Position::try_from(pos.as_str().ok_or("position name")?)?;
                state.place(player, pawn, pos);
            }
        }
        for block in dict["all_blocks"].as_array().ok_or("all_blocks")? {
            let pawns = block["pawns"]
                .as_array()
                .ok_or("block pawns")?
                .iter()
                .map(|n| n.as_str().ok_or("pawn name"))
                .map(|n| Pawn::try_from(n?))
                .collect::<Result<Aggregate, _>>()?;
            let pos = Position::try_from(block["pos"].as_str().ok_or("block pos")?)?;
            let rigid = block["rigid"].as_bool().ok_or("block rigid")?;
            state
                .push_block(Block::new(pawns, pos, rigid))
                .map_err(|_| "more than 16 blocks")?;
        }
        Ok(state)
    }
}

/// structural equality up to aggregate digit order and block order
impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.n_players == other.n_players
            && self.game_over == other.game_over
            && self.current_player == other.current_player
            && self.num_more_moves == other.num_more_moves
            && self.dice_roll == other.dice_roll
            && self.last_move_id == other.last_move_id
            && self.pawn_pos == other.pawn_pos
            && self.num_blocks == other.num_blocks
            && self
                .blocks()
                .iter()
                .all(|b| other.blocks().contains(b))
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "P{} {} +{} #{}",
            self.current_player, self.dice_roll, self.num_more_moves, self.last_move_id
        )?;
        for player in 0..self.n_players {
            write!(f, " |")?;
            for pos in (1..Position::COUNT as u8).map(Position::from) {
                for pawn in self.at(player, pos).iter() {
                    write!(f, " {}@{}", pawn, pos)?;
                }
            }
        }
        Ok(())
    }
}
