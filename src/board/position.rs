use super::colour::Colour;

/// Position is one of the 93 cells of the universal board encoding.
///
/// 0 is reserved, 1..=16 are the base slots (4 per colour in R, G, Y, B
/// order), 17..=68 are the shared main track P1..P52, and 69..=92 are the
/// four home stretches of 6 cells each, ending at the finale cells.
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position(u8);

impl Position {
    pub const NONE: Self = Self(0);
    pub const COUNT: usize = 93;

    /// star value: 2 at the four base-entry stars, 1 at the four
    /// intermediate stars, 0 everywhere else
    pub fn star(self) -> u8 {
        match self.0 {
            18 | 31 | 44 | 57 => 2,
            26 | 39 | 52 | 65 => 1,
            _ => 0,
        }
    }
    pub fn is_star(self) -> bool {
        self.star() > 0
    }
    pub fn is_entry_star(self) -> bool {
        self.star() == 2
    }
    pub fn is_finale(self) -> bool {
        matches!(self.0, 74 | 80 | 86 | 92)
    }
    pub fn is_base(self) -> bool {
        (1..=16).contains(&self.0)
    }
    pub fn is_main(self) -> bool {
        (17..=68).contains(&self.0)
    }
    pub fn is_home(self) -> bool {
        (69..=92).contains(&self.0)
    }
    /// which colour's home stretch this cell belongs to, if any
    pub fn home_colour(self) -> Option<Colour> {
        if self.is_home() {
            Some(Colour::from((self.0 - 69) / 6))
        } else {
            None
        }
    }
}

/// u8 isomorphism
impl From<u8> for Position {
    fn from(n: u8) -> Self {
        assert!(n < Self::COUNT as u8, "position out of range");
        Self(n)
    }
}
impl From<Position> for u8 {
    fn from(position: Position) -> Self {
        position.0
    }
}
impl From<Position> for usize {
    fn from(position: Position) -> Self {
        position.0 as usize
    }
}

/// boundary name isomorphism: RB1..BB4, P1..P52, RH1..BH6
impl TryFrom<&str> for Position {
    type Error = &'static str;
    fn try_from(name: &str) -> Result<Self, Self::Error> {
        if let Some(digits) = name.strip_prefix("P") {
            return match digits.parse::<u8>() {
                Ok(n) if (1..=52).contains(&n) => Ok(Self(16 + n)),
                _ => Err("main track index out of range"),
            };
        }
        let (prefix, digits) = name.split_at(2.min(name.len()));
        let index = digits.parse::<u8>().map_err(|_| "unparsable position index")?;
        let floor = match (prefix, index) {
            ("RB", 1..=4) => 0,
            ("GB", 1..=4) => 4,
            ("YB", 1..=4) => 8,
            ("BB", 1..=4) => 12,
            ("RH", 1..=6) => 68,
            ("GH", 1..=6) => 74,
            ("YH", 1..=6) => 80,
            ("BH", 1..=6) => 86,
            _ => return Err("unknown position name"),
        };
        Ok(Self(floor + index))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.0 {
            0 => write!(f, "--"),
            n @ 1..=16 => {
                let colour = Colour::from((n - 1) / 4);
                write!(f, "{}B{}", colour.letter(), (n - 1) % 4 + 1)
            }
            n @ 17..=68 => write!(f, "P{}", n - 16),
            n => {
                let colour = Colour::from((n - 69) / 6);
                write!(f, "{}H{}", colour.letter(), (n - 69) % 6 + 1)
            }
        }
    }
}
