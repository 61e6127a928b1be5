use crate::board::Colour;
use crate::board::ColourSet;
use crate::board::Pawn;

/// GameConfig records which player owns which colours. it is fixed for
/// the lifetime of an engine: 2 players own two colours each, 3 or 4
/// players own one colour each. no validation is applied beyond counts;
/// callers are expected to hand in a sane colour partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    players: Vec<ColourSet>,
    owners: [usize; Colour::COUNT],
}

impl GameConfig {
    pub fn new(choices: Vec<Vec<Colour>>) -> Self {
        assert!((2..=4).contains(&choices.len()), "2 to 4 players");
        let players = choices
            .iter()
            .map(|colours| colours.iter().copied().collect::<ColourSet>())
            .collect::<Vec<_>>();
        let mut owners = [0; Colour::COUNT];
        for (player, colours) in choices.iter().enumerate() {
            for colour in colours {
                owners[*colour as usize] = player;
            }
        }
        Self { players, owners }
    }

    /// the canonical two-player teaming
    pub fn two_player() -> Self {
        Self::new(vec![
            vec![Colour::Red, Colour::Yellow],
            vec![Colour::Green, Colour::Blue],
        ])
    }
    /// shuffle which player sits behind which colour pair,
    /// removing first-mover colour bias between self-play games
    pub fn shuffled<R: rand::Rng>(rng: &mut R) -> Self {
        use rand::seq::SliceRandom;
        let mut choices = vec![
            vec![Colour::Red, Colour::Yellow],
            vec![Colour::Green, Colour::Blue],
        ];
        choices.shuffle(rng);
        Self::new(choices)
    }

    pub fn n_players(&self) -> usize {
        self.players.len()
    }
    pub fn colours(&self, player: usize) -> ColourSet {
        self.players[player]
    }
    pub fn owner(&self, colour: Colour) -> usize {
        self.owners[colour as usize]
    }
    /// colours actually on the board, in fixed R, G, Y, B order
    pub fn in_play(&self) -> impl Iterator<Item = Colour> + '_ {
        Colour::all()
            .into_iter()
            .filter(|c| self.players.iter().any(|p| p.contains(*c)))
    }
    /// every pawn belonging to a player, in id order
    pub fn pawns(&self, player: usize) -> impl Iterator<Item = Pawn> + '_ {
        let colours = self.players[player];
        (1..=Pawn::COUNT as u8)
            .map(Pawn::from)
            .filter(move |p| colours.contains(p.colour()))
    }
}
