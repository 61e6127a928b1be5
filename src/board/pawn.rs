use super::colour::Colour;
use super::position::Position;
use crate::Arbitrary;

/// Pawn is one of the 16 pieces, numbered 1..=16 in R, G, Y, B order.
/// a pawn's id doubles as its base slot in the universal encoding.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pawn(u8);

impl Pawn {
    pub const COUNT: usize = 16;

    pub fn colour(self) -> Colour {
        Colour::from((self.0 - 1) / 4)
    }
    /// the base slot this pawn starts on and gets captured back to
    pub fn base(self) -> Position {
        Position::from(self.0)
    }
}

/// u8 isomorphism
impl From<u8> for Pawn {
    fn from(n: u8) -> Self {
        assert!((1..=16).contains(&n), "pawn id out of range");
        Self(n)
    }
}
impl From<Pawn> for u8 {
    fn from(pawn: Pawn) -> Self {
        pawn.0
    }
}

/// boundary name isomorphism: R1..R4, G1..G4, Y1..Y4, B1..B4
impl TryFrom<&str> for Pawn {
    type Error = &'static str;
    fn try_from(name: &str) -> Result<Self, Self::Error> {
        let floor = match name.chars().next() {
            Some('R') => 0,
            Some('G') => 4,
            Some('Y') => 8,
            Some('B') => 12,
            _ => return Err("unknown pawn colour"),
        };
        match name[1..].parse::<u8>() {
            Ok(i) if (1..=4).contains(&i) => Ok(Self(floor + i)),
            _ => Err("pawn index out of range"),
        }
    }
}

impl std::fmt::Display for Pawn {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.colour().letter(), (self.0 - 1) % 4 + 1)
    }
}

impl Arbitrary for Pawn {
    fn random() -> Self {
        use rand::Rng;
        Self::from(rand::rng().random_range(1..=16u8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_roundtrip() {
        for n in 1..=16u8 {
            let pawn = Pawn::from(n);
            assert!(Pawn::try_from(pawn.to_string().as_str()).unwrap() == pawn);
        }
    }

    #[test]
    fn base_slots() {
        assert!(Pawn::try_from("R1").unwrap().base() == Position::try_from("RB1").unwrap());
        assert!(Pawn::try_from("G3").unwrap().base() == Position::try_from("GB3").unwrap());
        assert!(Pawn::try_from("B4").unwrap().base() == Position::try_from("BB4").unwrap());
    }
}
