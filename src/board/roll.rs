use crate::Arbitrary;
use crate::Probability;

/// Roll is a dice roll of 1..=3 throws packed in base 7,
/// least significant digit first: {6, 6, 3} -> 3*49 + 6*7 + 6 = 195.
/// the empty roll (dice yet to be thrown) packs to 0.
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq)]
pub struct Roll(u16);

impl Roll {
    /// the throws in the order they were made
    pub fn throws(&self) -> impl Iterator<Item = u8> {
        let mut word = self.0;
        std::iter::from_fn(move || {
            if word == 0 {
                None
            } else {
                let digit = (word % 7) as u8;
                word /= 7;
                Some(digit)
            }
        })
    }
    pub fn count(&self) -> usize {
        self.throws().count()
    }
    pub fn sum(&self) -> RollSum {
        RollSum::from(self.throws().map(usize::from).sum::<usize>())
    }

    /// roll the engine dice: up to three d6, stopping on anything but a six
    pub fn toss<R: rand::Rng>(rng: &mut R) -> Self {
        let mut throws = Vec::new();
        for _ in 0..3 {
            let throw = rng.random_range(1..=6u8);
            throws.push(throw);
            if throw != 6 {
                break;
            }
        }
        Self::from(throws.as_slice())
    }
}

/// throw-order slice isomorphism
impl From<&[u8]> for Roll {
    fn from(throws: &[u8]) -> Self {
        assert!(throws.len() <= 3, "at most three throws");
        assert!(throws.iter().all(|d| (1..=6).contains(d)), "d6 throws");
        Self(throws.iter().rev().fold(0, |word, d| word * 7 + *d as u16))
    }
}
impl From<Roll> for Vec<u8> {
    fn from(roll: Roll) -> Self {
        roll.throws().collect()
    }
}
impl From<u16> for Roll {
    fn from(word: u16) -> Self {
        Self(word)
    }
}
impl From<Roll> for u16 {
    fn from(roll: Roll) -> Self {
        roll.0
    }
}

impl std::fmt::Display for Roll {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let throws = self.throws().map(|d| d.to_string()).collect::<Vec<_>>();
        write!(f, "[{}]", throws.join(","))
    }
}

impl Arbitrary for Roll {
    fn random() -> Self {
        Self::toss(&mut rand::rng())
    }
}

/// RollSum is the sum form of a roll, a unique index into the 19-slot
/// move-bucket table. the 15 legal rolls occupy sums {1..5, 7..11, 13..17};
/// sum 12 absorbs the wasted triple six during selection, and a real
/// [6,6,6] throw lands on sum 18. both always hold the empty move.
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct RollSum(usize);

impl RollSum {
    pub const COUNT: usize = 19;

    pub const fn index(&self) -> usize {
        self.0
    }
    pub fn is_legal(&self) -> bool {
        matches!(self.0, 1..=5 | 7..=11 | 13..=17)
    }
    /// the 15 legal rolls in bucket order
    pub fn rolls() -> impl Iterator<Item = Roll> {
        (0..Self::COUNT).map(RollSum).filter(RollSum::is_legal).map(Roll::from)
    }

    /// sample a sum from the true roll distribution:
    /// 1/6 per plain throw, 1/36 per six-then, 1/216 per double-six-then,
    /// with the remaining 1/216 absorbed into the wasted triple six
    pub fn random<R: rand::Rng>(rng: &mut R) -> Self {
        let first = rng.random_range(1..=6usize);
        if first != 6 {
            return Self(first);
        }
        let second = rng.random_range(1..=6usize);
        if second != 6 {
            return Self(6 + second);
        }
        let third = rng.random_range(1..=6usize);
        if third != 6 {
            return Self(12 + third);
        }
        Self(12)
    }

    /// probability of this bucket being selected
    pub fn density(&self) -> Probability {
        match self.0 {
            1..=5 => 1. / 6.,
            7..=11 => 1. / 36.,
            13..=17 => 1. / 216.,
            12 => 1. / 216.,
            _ => 0.,
        }
    }
}

impl From<usize> for RollSum {
    fn from(sum: usize) -> Self {
        assert!(sum < Self::COUNT, "roll sum out of range");
        Self(sum)
    }
}

/// reconstruct the throws from the sum form. illegal sums map onto
/// placeholder rolls so dead buckets still carry a dice value.
impl From<RollSum> for Roll {
    fn from(sum: RollSum) -> Self {
        match sum.0 {
            0 => Roll::default(),
            s @ 1..=5 => Roll::from([s as u8].as_slice()),
            6 => Roll::from([6u8].as_slice()),
            s @ 7..=11 => Roll::from([6, (s - 6) as u8].as_slice()),
            12 => Roll::from([6, 6].as_slice()),
            s @ 13..=17 => Roll::from([6, 6, (s - 12) as u8].as_slice()),
            _ => Roll::from([6, 6, 6].as_slice()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing_is_least_significant_first() {
        let roll = Roll::from([6, 6, 3].as_slice());
        assert!(u16::from(roll) == 195);
        assert!(Vec::<u8>::from(roll) == vec![6, 6, 3]);
    }

    #[test]
    fn sums_are_bijective_over_legal_rolls() {
        for roll in RollSum::rolls() {
            assert!(roll.sum().is_legal());
            assert!(Roll::from(roll.sum()) == roll);
        }
        assert!(RollSum::rolls().count() == 15);
    }

    #[test]
    fn triple_six_sums_to_dead_bucket() {
        let roll = Roll::from([6, 6, 6].as_slice());
        assert!(roll.sum().index() == 18);
        assert!(!roll.sum().is_legal());
    }

    #[test]
    fn densities_cover_the_sample_space() {
        let total = (0..RollSum::COUNT)
            .map(RollSum)
            .map(|s| s.density())
            .sum::<Probability>();
        assert!((total - 1.).abs() < 1e-6);
    }

    #[test]
    fn toss_stops_without_six() {
        use rand::SeedableRng;
        let mut rng = rand::rngs::SmallRng::seed_from_u64(0);
        for _ in 0..100 {
            let roll = Roll::toss(&mut rng);
            let throws = Vec::<u8>::from(roll);
            assert!((1..=3).contains(&throws.len()));
            for d in &throws[..throws.len() - 1] {
                assert!(*d == 6);
            }
        }
    }
}
