use crate::board::Aggregate;
use crate::board::Pawn;
use crate::board::Position;
use serde_json::Value;
use serde_json::json;

/// Step moves one pawn, or one two-pawn block, from a cell to a cell.
/// block steps pack the pair into the aggregate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub pawns: Aggregate,
    pub from: Position,
    pub to: Position,
}

impl Step {
    pub fn is_block(&self) -> bool {
        self.pawns.is_pair()
    }
}

/// Move is an ordered sequence of up to three substeps consuming the
/// dice of one roll in throw order. the empty sequence is the pass move,
/// played when a roll admits nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Move(Vec<Step>);

impl Move {
    pub fn pass() -> Self {
        Self::default()
    }
    pub fn is_pass(&self) -> bool {
        self.0.is_empty()
    }
    pub fn push(&mut self, step: Step) {
        assert!(self.0.len() < 3, "at most three substeps");
        self.0.push(step);
    }
    pub fn steps(&self) -> &[Step] {
        &self.0
    }
}

impl From<Vec<Step>> for Move {
    fn from(steps: Vec<Step>) -> Self {
        Self(steps)
    }
}

/// boundary form: a pass is [[]], otherwise a list of
/// [pawn-or-pawn-pair, from-name, to-name] triples
impl From<&Move> for Value {
    fn from(mv: &Move) -> Self {
        if mv.is_pass() {
            return json!([[]]);
        }
        let steps = mv
            .0
            .iter()
            .map(|step| {
                let pawns = match step.pawns.single() {
                    Some(pawn) => json!(pawn.to_string()),
                    None => json!(
                        step.pawns
                            .iter()
                            .map(|p| p.to_string())
                            .collect::<Vec<_>>()
                    ),
                };
                json!([pawns, step.from.to_string(), step.to.to_string()])
            })
            .collect::<Vec<_>>();
        Value::Array(steps)
    }
}

impl TryFrom<&Value> for Move {
    type Error = &'static str;
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let steps = value.as_array().ok_or("move is a list of steps")?;
        if steps.len() == 1 && steps[0].as_array().is_some_and(|s| s.is_empty()) {
            return Ok(Self::pass());
        }
        let mut mv = Self::default();
        for step in steps {
            let step = step.as_array().ok_or("step is a triple")?;
            let (pawns, from, to) = match step.as_slice() {
                [pawns, from, to] => (pawns, from, to),
                _ => return Err("step is a triple"),
            };
            let pawns = match pawns {
                Value::String(name) => {
                    Aggregate::from(Pawn::try_from(name.as_str())?)
                }
                Value::Array(names) => names
                    .iter()
                    .map(|n| n.as_str().ok_or("pawn name"))
                    .map(|n| Pawn::try_from(n?))
                    .collect::<Result<Aggregate, _>>()?,
                _ => return Err("pawn field"),
            };
            let from = Position::try_from(from.as_str().ok_or("from name")?)?;
            let to = Position::try_from(to.as_str().ok_or("to name")?)?;
            mv.push(Step { pawns, from, to });
        }
        Ok(mv)
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.is_pass() {
            return write!(f, "pass");
        }
        let steps = self
            .0
            .iter()
            .map(|s| format!("{} {}>{}", s.pawns, s.from, s.to))
            .collect::<Vec<_>>();
        write!(f, "{}", steps.join(", "))
    }
}
