use crate::Prior;
use crate::Probability;
use crate::Value;
use crate::Visits;
use crate::board::Roll;
use crate::board::RollSum;
use crate::game::LudoModel;
use crate::game::Move;
use crate::game::State;
use crate::game::TurnError;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::Weak;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// Node is one position in the search tree. it starts bare and grows its
/// Branches under its own lock on first visit. ownership flows strictly
/// parent to child through the branch slots; the parent link is a weak
/// back-reference walked during backup.
pub struct Node {
    state: State,
    parent: Weak<Node>,
    expanded: AtomicBool,
    branches: Mutex<Option<Branches>>,
}

/// Branches is everything a node knows about its children: the flat move
/// array partitioned into the 19 roll buckets, one child per move (dead
/// buckets carry the pass placeholder), per-child search statistics, and
/// the active window the root gets pruned down to. the arrays are laid
/// out once at expansion and only the statistics and the window move
/// afterwards.
pub struct Branches {
    moves: Vec<Move>,
    partition: [u16; RollSum::COUNT],
    children: Vec<Option<Arc<Node>>>,
    p: Vec<Prior>,
    n: Vec<Visits>,
    w: Vec<Value>,
    q: Vec<Value>,
    start: usize,
    end: usize,
}

impl Node {
    pub fn spawn(state: State, parent: Weak<Node>) -> Arc<Self> {
        Arc::new(Self {
            state,
            parent,
            expanded: AtomicBool::new(false),
            branches: Mutex::new(None),
        })
    }

    pub fn state(&self) -> &State {
        &self.state
    }
    pub fn parent(&self) -> Option<Arc<Node>> {
        self.parent.upgrade()
    }
    pub fn is_expanded(&self) -> bool {
        self.expanded.load(Ordering::Acquire)
    }
    pub fn lock(&self) -> MutexGuard<'_, Option<Branches>> {
        self.branches.lock().expect("node lock poisoned")
    }

    /// materialize every child under the caller's guard: enumerate all
    /// moves, pad dead rolls with the pass placeholder, spawn one
    /// unexpanded child per move, and zero the statistics with uniform
    /// priors. the expanded flag flips before the guard is released, and
    /// the caller keeps holding the guard until the priors are settled,
    /// so late selectors never read half-built branches.
    pub fn expand(
        node: &Arc<Self>,
        guard: &mut Option<Branches>,
        model: &LudoModel,
    ) -> Result<(), TurnError> {
        debug_assert!(guard.is_none());
        let (moves, partition) = model.all_possible_moves(&node.state)?.flatten();
        let total = moves.len();
        let mut children = Vec::with_capacity(total);
        let mut flat = 0;
        for sum in 0..RollSum::COUNT {
            let mut rolled = node.state.clone();
            rolled.dice_roll = Roll::from(RollSum::from(sum));
            for _ in 0..partition[sum] {
                let child = model.generate_next_state(&rolled, &moves[flat])?;
                children.push(Some(Node::spawn(child, Arc::downgrade(node))));
                flat += 1;
            }
        }
        *guard = Some(Branches {
            moves,
            partition,
            children,
            p: vec![1.; total],
            n: vec![0; total],
            w: vec![0.; total],
            q: vec![0.; total],
            start: 0,
            end: total,
        });
        node.expanded.store(true, Ordering::Release);
        Ok(())
    }
}

impl Branches {
    pub fn window(&self) -> (usize, usize) {
        (self.start, self.end)
    }
    /// the slice of the flat arrays belonging to one roll bucket
    pub fn bucket(&self, sum: RollSum) -> (usize, usize) {
        let start = self.partition[..sum.index()]
            .iter()
            .map(|n| *n as usize)
            .sum::<usize>();
        (start, start + self.partition[sum.index()] as usize)
    }
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }
    pub fn child(&self, index: usize) -> Arc<Node> {
        self.children[index]
            .as_ref()
            .expect("child inside the active window")
            .clone()
    }
    pub fn visits(&self, index: usize) -> Visits {
        self.n[index]
    }

    /// PUCT over one slice: argmax of Q + c * P * sqrt(sum N) / (1 + N),
    /// ties broken by the first index
    pub fn select(&self, c_puct: Value, start: usize, end: usize) -> usize {
        let basis = self.n[start..end]
            .iter()
            .map(|n| *n as Value)
            .sum::<Value>()
            .sqrt();
        let mut best = start;
        let mut top = Value::MIN;
        for i in start..end {
            let u = c_puct * self.p[i] * basis / (1. + self.n[i] as Value);
            if self.q[i] + u > top {
                top = self.q[i] + u;
                best = i;
            }
        }
        best
    }

    /// virtual loss: deter the other selectors from piling on this edge
    pub fn visit(&mut self, index: usize, n_vl: Visits) {
        self.n[index] += n_vl;
        self.w[index] -= n_vl as Value;
    }
    /// back out a virtual loss without contributing a backup
    pub fn unvisit(&mut self, index: usize, n_vl: Visits) {
        self.n[index] -= n_vl;
        self.w[index] += n_vl as Value;
    }
    /// reverse the virtual loss and settle the evaluated value
    pub fn reward(&mut self, index: usize, n_vl: Visits, value: Value) {
        self.n[index] += 1 - n_vl;
        self.w[index] += value + n_vl as Value;
        self.q[index] = self.w[index] / self.n[index] as Value;
    }

    /// visit-count densities over the active window. temperature 0 is
    /// argmax; otherwise counts are raised to 1/temperature first.
    pub fn densities(&self, temperature: f32) -> Vec<Probability> {
        let counts = self.n[self.start..self.end]
            .iter()
            .map(|n| (*n).max(0) as Probability)
            .collect::<Vec<_>>();
        if temperature == 0. {
            let top = counts
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap_or(0);
            let mut densities = vec![0.; counts.len()];
            densities[top] = 1.;
            return densities;
        }
        let weights = counts
            .iter()
            .map(|n| n.powf(1. / temperature))
            .collect::<Vec<_>>();
        let total = weights.iter().sum::<Probability>();
        match total > 0. {
            true => weights.into_iter().map(|w| w / total).collect(),
            false => vec![1. / weights.len() as Probability; weights.len()],
        }
    }

    /// shrink the active window to one roll bucket, releasing every
    /// child outside it while the arrays stay intact
    pub fn prune(&mut self, start: usize, end: usize) {
        for slot in &mut self.children[self.start..start] {
            *slot = None;
        }
        for slot in &mut self.children[end..self.end] {
            *slot = None;
        }
        self.start = start;
        self.end = end;
    }

    /// detach one child so the rest of the tree can be dropped without
    /// cascading into it
    pub fn take_child(&mut self, index: usize) -> Arc<Node> {
        self.children[index]
            .take()
            .expect("child inside the active window")
    }

    /// per-child statistics of the active window, for move selection logs
    pub fn tally(&self, index: usize) -> (Visits, Value, Value) {
        (self.n[index], self.w[index], self.q[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;

    fn expanded() -> (LudoModel, Arc<Node>) {
        let model = LudoModel::from(GameConfig::two_player());
        let state = State::new(model.config());
        let node = Node::spawn(state, Weak::new());
        let mut guard = node.lock();
        Node::expand(&node, &mut guard, &model).unwrap();
        drop(guard);
        (model, node)
    }

    #[test]
    fn expansion_pads_every_bucket() {
        let (_, node) = expanded();
        assert!(node.is_expanded());
        let guard = node.lock();
        let branches = guard.as_ref().unwrap();
        // opening position: rolls without a six admit nothing but the
        // pass placeholder, six-then rolls admit one exit-and-march per
        // pawn, double sixes fan out further
        for sum in 0..RollSum::COUNT {
            let (start, end) = branches.bucket(RollSum::from(sum));
            let width = end - start;
            match sum {
                7..=11 => assert!(width == 8),
                13..=17 => assert!(width > 8),
                _ => assert!(width == 1),
            }
        }
        let (_, total) = branches.window();
        assert!(total == branches.moves().len());
    }

    #[test]
    fn virtual_loss_reverses_exactly() {
        let (_, node) = expanded();
        let mut guard = node.lock();
        let branches = guard.as_mut().unwrap();
        branches.visit(3, 3);
        assert!(branches.n[3] == 3);
        assert!(branches.w[3] == -3.);
        branches.reward(3, 3, 1.);
        assert!(branches.n[3] == 1);
        assert!(branches.w[3] == 1.);
        assert!(branches.q[3] == 1.);
        branches.visit(3, 3);
        branches.unvisit(3, 3);
        assert!(branches.n[3] == 1);
        assert!(branches.w[3] == 1.);
    }

    #[test]
    fn puct_prefers_unvisited_then_value() {
        let (_, node) = expanded();
        let mut guard = node.lock();
        let branches = guard.as_mut().unwrap();
        let (start, end) = branches.bucket(RollSum::from(7));
        // ties break to the first index
        assert!(branches.select(2., start, end) == start);
        branches.reward(start, 0, -1.);
        let next = branches.select(2., start, end);
        assert!(next == start + 1);
    }

    #[test]
    fn pruning_releases_the_other_buckets() {
        let (_, node) = expanded();
        let mut guard = node.lock();
        let branches = guard.as_mut().unwrap();
        let (start, end) = branches.bucket(RollSum::from(8));
        branches.prune(start, end);
        assert!(branches.window() == (start, end));
        for i in start..end {
            assert!(branches.children[i].is_some());
        }
        assert!(branches.children[..start].iter().all(|c| c.is_none()));
        assert!(branches.children[end..].iter().all(|c| c.is_none()));
    }
}
