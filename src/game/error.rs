/// everything that can go wrong while taking a turn.
/// rule engine calls are total: these are values, not panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnError {
    /// the move id does not follow the engine's last move id
    StaleMove { expected: u32, got: u32 },
    /// the move is not among the enumerated moves for the actual roll
    IllegalMove,
    /// the state violates an invariant the engine relies on
    Corrupt(&'static str),
}

impl std::fmt::Display for TurnError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::StaleMove { expected, got } => {
                write!(f, "stale move id {} (expected {})", got, expected)
            }
            Self::IllegalMove => write!(f, "move is not legal for the actual roll"),
            Self::Corrupt(what) => write!(f, "engine corruption: {}", what),
        }
    }
}

impl std::error::Error for TurnError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditions_read_plainly() {
        let stale = TurnError::StaleMove {
            expected: 5,
            got: 7,
        };
        assert!(stale.to_string() == "stale move id 7 (expected 5)");
        assert!(TurnError::IllegalMove.to_string() == "move is not legal for the actual roll");
        assert!(
            TurnError::Corrupt("more than 16 blocks").to_string()
                == "engine corruption: more than 16 blocks"
        );
    }

    #[test]
    fn conditions_compare_by_value() {
        assert!(
            TurnError::StaleMove {
                expected: 1,
                got: 2
            } == TurnError::StaleMove {
                expected: 1,
                got: 2
            }
        );
        assert!(TurnError::IllegalMove != TurnError::Corrupt("more than 16 blocks"));
    }
}
