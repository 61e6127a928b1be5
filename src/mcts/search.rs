use super::node::Node;
use super::queue::EvaluationQueue;
use super::tree::Tree;
use crate::Value;
use crate::Visits;
use crate::board::RollSum;
use crate::game::LudoModel;
use std::sync::Arc;

/// Search drives simulations over a tree: each one walks selection,
/// expansion, evaluation, backup, all sharing the tree and the queue.
/// every simulation is independent work for the rayon pool.
#[derive(Debug, Clone, Copy)]
pub struct Search {
    pub simulations: usize,
    pub c_puct: Value,
    pub n_vl: Visits,
}

impl Default for Search {
    fn default() -> Self {
        Self {
            simulations: crate::SIMULATIONS,
            c_puct: crate::C_PUCT,
            n_vl: crate::N_VL,
        }
    }
}

impl Search {
    /// run the configured number of simulations in parallel and report
    /// the deepest selection walk, for observability
    pub fn rollout(&self, tree: &Tree, model: &LudoModel, eq: &EvaluationQueue) -> usize {
        use rayon::iter::IntoParallelIterator;
        use rayon::iter::ParallelIterator;
        (0..self.simulations)
            .into_par_iter()
            .map(|i| {
                let mut rng = self.rng(tree, i);
                simulate(tree, model, eq, self.c_puct, self.n_vl, &mut rng)
            })
            .max()
            .unwrap_or(0)
    }

    /// one deterministic rng per simulation, keyed on the tree and turn
    fn rng(&self, tree: &Tree, i: usize) -> rand::rngs::SmallRng {
        use rand::SeedableRng;
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hash;
        use std::hash::Hasher;
        let ref mut hasher = DefaultHasher::new();
        tree.owner().hash(hasher);
        tree.root().state().last_move_id.hash(hasher);
        i.hash(hasher);
        rand::rngs::SmallRng::seed_from_u64(hasher.finish())
    }
}

/// one full simulation: descend by PUCT under sampled rolls, racing the
/// other threads with virtual losses, expand the frontier node, have the
/// queue evaluate it from the owner's perspective, and back the value up
/// the walked path. returns the depth reached, or 0 for a simulation
/// discarded on a full queue.
pub fn simulate<R: rand::Rng>(
    tree: &Tree,
    model: &LudoModel,
    eq: &EvaluationQueue,
    c_puct: Value,
    n_vl: Visits,
    rng: &mut R,
) -> usize {
    let owner = tree.owner();
    let mut node = tree.root().clone();
    let mut path: Vec<(Arc<Node>, usize)> = Vec::with_capacity(crate::MAX_DEPTH);
    let mut skip_initial_node = true;

    // SELECTION and EXPANSION, racing other selectors
    let value = loop {
        if node.state().game_over {
            // terminal leaves never reach the queue
            break match model.check_completed(node.state(), owner) {
                true => 1.,
                false => -1.,
            };
        }
        if node.is_expanded() {
            let mut guard = node.lock();
            let branches = guard.as_mut().expect("expanded nodes have branches");
            let (start, end) = match skip_initial_node {
                // the pruned root window already reflects the real roll
                true => branches.window(),
                false => branches.bucket(RollSum::random(rng)),
            };
            skip_initial_node = false;
            let index = branches.select(c_puct, start, end);
            branches.visit(index, n_vl);
            let child = branches.child(index);
            drop(guard);
            path.push((node, index));
            node = child;
            continue;
        }
        let mut guard = node.lock();
        if guard.is_some() {
            // another thread expanded while we waited: resume selection
            continue;
        }
        if let Err(error) = Node::expand(&node, &mut guard, model) {
            log::warn!("simulation abandoned: {}", error);
            drop(guard);
            unwind(&path, n_vl);
            return 0;
        }
        // the node's own state, seen from the owner's perspective.
        // the guard stays held across the wait so the priors are settled
        // before any other selector reads this node's statistics.
        let mut leaf = node.state().clone();
        leaf.current_player = owner;
        match eq.submit(leaf) {
            Some(ticket) => {
                let value = eq.wait(ticket);
                drop(guard);
                break value;
            }
            None => {
                drop(guard);
                unwind(&path, n_vl);
                return 0;
            }
        }
    };

    // BACKUP
    let depth = path.len();
    for (parent, index) in path.iter().rev() {
        let multiplier = match parent.state().current_player == owner {
            true => 1.,
            false => -1.,
        };
        let mut guard = parent.lock();
        guard
            .as_mut()
            .expect("path nodes are expanded")
            .reward(*index, n_vl, multiplier * value);
    }
    depth
}

/// back out the virtual losses of a discarded simulation
fn unwind(path: &[(Arc<Node>, usize)], n_vl: Visits) {
    for (parent, index) in path.iter().rev() {
        let mut guard = parent.lock();
        guard
            .as_mut()
            .expect("path nodes are expanded")
            .unvisit(*index, n_vl);
    }
}
