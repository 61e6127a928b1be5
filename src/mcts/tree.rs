use super::node::Node;
use crate::Probability;
use crate::Value;
use crate::Visits;
use crate::board::Roll;
use crate::game::LudoModel;
use crate::game::Move;
use crate::game::State;
use crate::game::TurnError;
use std::sync::Arc;
use std::sync::Weak;

/// one move option with its search statistics, as logged per real move
#[derive(Debug, Clone, serde::Serialize)]
pub struct Candidate {
    pub r#move: serde_json::Value,
    pub prob: Probability,
    pub n: Visits,
    pub w: Value,
    pub q: Value,
}

/// Tree is one player's view of the game: a search tree rooted at the
/// current position, owned by the player whose perspective values are
/// backed up in. the root only moves between turns, when no simulation
/// is in flight, which is what the &mut receivers enforce.
pub struct Tree {
    owner: usize,
    root: Arc<Node>,
}

impl Tree {
    pub fn new(state: &State, owner: usize) -> Self {
        Self {
            owner,
            root: Node::spawn(state.clone(), Weak::new()),
        }
    }

    pub fn owner(&self) -> usize {
        self.owner
    }
    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    /// roots are expanded eagerly so pruning and selection always have
    /// branches to work on. priors stay uniform; no evaluation happens.
    pub fn expand_root(&mut self, model: &LudoModel) -> Result<(), TurnError> {
        let root = self.root.clone();
        let mut guard = root.lock();
        match guard.is_none() {
            true => Node::expand(&root, &mut guard, model),
            false => Ok(()),
        }
    }

    /// after the real dice land, shrink the root window to the rolled
    /// bucket and release every sibling outside it
    pub fn prune_root(&mut self, roll: Roll) {
        let mut guard = self.root.lock();
        let branches = guard.as_mut().expect("prune an expanded root");
        let (start, end) = branches.bucket(roll.sum());
        branches.prune(start, end);
    }

    /// sample the real move from the visit counts of the active window.
    /// returns the absolute child index, the move, and the candidate
    /// table sorted best-first for logging.
    pub fn select_move<R: rand::Rng>(
        &self,
        temperature: f32,
        rng: &mut R,
    ) -> (usize, Move, Vec<Candidate>) {
        let guard = self.root.lock();
        let branches = guard.as_ref().expect("select on an expanded root");
        let (start, _) = branches.window();
        let densities = branches.densities(temperature);
        let mut spin: Probability = rng.random();
        let mut choice = 0;
        for (i, density) in densities.iter().enumerate() {
            spin -= density;
            if spin < 0. {
                choice = i;
                break;
            }
        }
        let index = start + choice;
        let mut candidates = densities
            .iter()
            .enumerate()
            .map(|(i, prob)| {
                let (n, w, q) = branches.tally(start + i);
                Candidate {
                    r#move: serde_json::Value::from(&branches.moves()[start + i]),
                    prob: *prob,
                    n,
                    w,
                    q,
                }
            })
            .collect::<Vec<_>>();
        candidates.sort_by(|a, b| b.prob.total_cmp(&a.prob));
        candidates.truncate(10);
        (index, branches.moves()[index].clone(), candidates)
    }

    /// advance the root to the child the real game took. the child is
    /// detached from its slot first so dropping the old root does not
    /// cascade into the new one.
    pub fn advance(&mut self, index: usize, model: &LudoModel) -> Result<(), TurnError> {
        let child = {
            let mut guard = self.root.lock();
            guard
                .as_mut()
                .expect("advance an expanded root")
                .take_child(index)
        };
        self.root = child;
        self.expand_root(model)
    }
}
