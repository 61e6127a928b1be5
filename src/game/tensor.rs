use super::config::GameConfig;
use super::state::State;
use crate::board::Colour;
use crate::board::Position;

/// Encoding is the fixed-shape numeric view of a state handed to the
/// value network: 59 rows (base row, P1..P52, then the colour's own
/// H1..H6) by 5 columns per colour in play (4 pawn one-hots and a block
/// indicator) plus one current-player column. a pure function of state.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

pub const ENCODING_ROWS: usize = 59;

impl Encoding {
    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }
    fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row * self.cols + col] = value;
    }
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// a cell mapped into a colour's own 59-row geometry
    fn row(pos: Position, colour: Colour) -> usize {
        if pos.is_base() {
            0
        } else if pos.is_main() {
            u8::from(pos) as usize - 16
        } else {
            debug_assert!(pos.home_colour() == Some(colour));
            53 + u8::from(pos) as usize - u8::from(colour.home()) as usize
        }
    }
}

impl From<(&State, &GameConfig)> for Encoding {
    fn from((state, config): (&State, &GameConfig)) -> Self {
        let colours = config.in_play().collect::<Vec<_>>();
        let cols = 5 * colours.len() + 1;
        let mut encoding = Self {
            rows: ENCODING_ROWS,
            cols,
            data: vec![0.; ENCODING_ROWS * cols],
        };
        let group = |colour: Colour| {
            5 * colours
                .iter()
                .position(|c| *c == colour)
                .expect("colour in play")
        };
        for player in 0..state.n_players {
            for pos in (1..Position::COUNT as u8).map(Position::from) {
                for pawn in state.at(player, pos).iter() {
                    let col = group(pawn.colour()) + (u8::from(pawn) as usize - 1) % 4;
                    let row = Self::row(pos, pawn.colour());
                    encoding.set(row, col, 1.);
                }
            }
        }
        for block in state.blocks() {
            let grip = if block.rigid { 1. } else { 0.5 };
            for pawn in block.pawns.iter() {
                let col = group(pawn.colour()) + 4;
                let row = Self::row(block.pos, pawn.colour());
                encoding.set(row, col, grip);
            }
        }
        for row in 0..ENCODING_ROWS {
            encoding.set(row, cols - 1, state.current_player as f32);
        }
        encoding
    }
}

/// nested-list form for persisted trajectories
impl From<&Encoding> for Vec<Vec<f32>> {
    fn from(encoding: &Encoding) -> Self {
        (0..encoding.rows)
            .map(|r| (0..encoding.cols).map(|c| encoding.at(r, c)).collect())
            .collect()
    }
}

impl serde::Serialize for Encoding {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Vec::<Vec<f32>>::from(self).serialize(serializer)
    }
}
