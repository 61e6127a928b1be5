use crate::Value;
use crate::game::State;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

/// one pending leaf evaluation. the producer publishes the state and
/// raises pending; the evaluator stores the result bits and only then
/// clears pending, so a searcher that observes pending fall always reads
/// a settled result.
struct Slot {
    state: Mutex<Option<State>>,
    pending: AtomicBool,
    result: AtomicU32,
}

/// EvaluationQueue is the bounded ring multiplexing every search thread's
/// leaf onto the batching evaluator. the only shared mutation under the
/// insertion lock is the rear pointer plus the slot being published; the
/// front pointer belongs to the evaluator alone.
pub struct EvaluationQueue {
    slots: Vec<Slot>,
    front: AtomicUsize,
    rear: AtomicUsize,
    gate: Mutex<()>,
    stop: AtomicBool,
    drops: AtomicUsize,
}

impl EvaluationQueue {
    pub fn new(length: usize) -> Self {
        assert!(length >= 2, "ring needs room for one slot and a gap");
        Self {
            slots: (0..length)
                .map(|_| Slot {
                    state: Mutex::new(None),
                    pending: AtomicBool::new(false),
                    result: AtomicU32::new(0),
                })
                .collect(),
            front: AtomicUsize::new(0),
            rear: AtomicUsize::new(0),
            gate: Mutex::new(()),
            stop: AtomicBool::new(false),
            drops: AtomicUsize::new(0),
        }
    }

    pub fn length(&self) -> usize {
        self.slots.len()
    }
    /// rejected insertions since construction
    pub fn drops(&self) -> usize {
        self.drops.load(Ordering::Relaxed)
    }

    /// producer side: publish a leaf for evaluation, returning its slot
    /// ticket, or None when the ring is full and the simulation is lost
    pub fn submit(&self, state: State) -> Option<usize> {
        let _gate = self.gate.lock().expect("insertion lock poisoned");
        let rear = self.rear.load(Ordering::Relaxed);
        if (rear + 1) % self.length() == self.front.load(Ordering::Acquire) {
            self.drops.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        let slot = &self.slots[rear];
        *slot.state.lock().expect("slot lock poisoned") = Some(state);
        slot.result.store(0, Ordering::Relaxed);
        slot.pending.store(true, Ordering::Release);
        self.rear.store((rear + 1) % self.length(), Ordering::Release);
        Some(rear)
    }

    /// producer side: spin on the ticket until the evaluator settles it
    pub fn wait(&self, ticket: usize) -> Value {
        let slot = &self.slots[ticket];
        while slot.pending.load(Ordering::Acquire) {
            std::thread::sleep(std::time::Duration::from_micros(crate::EQ_POLL_MICROS));
        }
        Value::from_bits(slot.result.load(Ordering::Acquire))
    }

    /// consumer side: copy out up to `batch` still-pending slots between
    /// front and rear, oldest first
    pub fn drain(&self, batch: usize) -> Vec<(usize, State)> {
        let mut pending = Vec::new();
        let rear = self.rear.load(Ordering::Acquire);
        let mut i = self.front.load(Ordering::Relaxed);
        while i != rear && pending.len() < batch {
            let slot = &self.slots[i];
            if slot.pending.load(Ordering::Acquire) {
                let state = slot
                    .state
                    .lock()
                    .expect("slot lock poisoned")
                    .clone()
                    .expect("published slot holds a state");
                pending.push((i, state));
            }
            i = (i + 1) % self.length();
        }
        pending
    }

    /// consumer side: settle the batch and advance front past every
    /// contiguous cleared slot, releasing its state
    pub fn resolve(&self, results: Vec<(usize, Value)>) {
        for (ticket, value) in results {
            let slot = &self.slots[ticket];
            slot.result.store(value.to_bits(), Ordering::Release);
            slot.pending.store(false, Ordering::Release);
        }
        let rear = self.rear.load(Ordering::Acquire);
        let mut front = self.front.load(Ordering::Relaxed);
        while front != rear && !self.slots[front].pending.load(Ordering::Acquire) {
            self.slots[front]
                .state
                .lock()
                .expect("slot lock poisoned")
                .take();
            front = (front + 1) % self.length();
        }
        self.front.store(front, Ordering::Release);
    }

    /// cooperative shutdown: the evaluator exits after its current batch
    pub fn set_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }
    pub fn stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;

    fn state() -> State {
        State::new(&GameConfig::two_player())
    }

    #[test]
    fn submit_drain_resolve_wait() {
        let queue = EvaluationQueue::new(8);
        let a = queue.submit(state()).unwrap();
        let b = queue.submit(state()).unwrap();
        assert!(a != b);
        let pending = queue.drain(crate::EQ_BATCH);
        assert!(pending.len() == 2);
        queue.resolve(vec![(a, 0.25), (b, -0.5)]);
        assert!(queue.wait(a) == 0.25);
        assert!(queue.wait(b) == -0.5);
        assert!(queue.drain(crate::EQ_BATCH).is_empty());
    }

    #[test]
    fn full_ring_rejects_with_sentinel() {
        let queue = EvaluationQueue::new(4);
        assert!(queue.submit(state()).is_some());
        assert!(queue.submit(state()).is_some());
        assert!(queue.submit(state()).is_some());
        assert!(queue.submit(state()).is_none());
        assert!(queue.drops() == 1);
    }

    #[test]
    fn resolving_frees_the_ring() {
        let queue = EvaluationQueue::new(4);
        for _ in 0..10 {
            let ticket = queue.submit(state()).unwrap();
            let pending = queue.drain(1);
            assert!(pending.len() == 1);
            queue.resolve(vec![(ticket, 0.)]);
            assert!(queue.wait(ticket) == 0.);
        }
        assert!(queue.drops() == 0);
    }

    #[test]
    fn partial_batches_hold_the_front() {
        let queue = EvaluationQueue::new(8);
        let a = queue.submit(state()).unwrap();
        let b = queue.submit(state()).unwrap();
        // settle the later slot first: front must wait on the earlier one
        queue.resolve(vec![(b, 1.)]);
        assert!(queue.front.load(Ordering::Relaxed) == a);
        queue.resolve(vec![(a, 1.)]);
        assert!(queue.front.load(Ordering::Relaxed) == (b + 1) % queue.length());
    }

    #[test]
    fn stop_flag_is_sticky() {
        let queue = EvaluationQueue::new(4);
        assert!(!queue.stopped());
        queue.set_stop();
        assert!(queue.stopped());
    }
}
