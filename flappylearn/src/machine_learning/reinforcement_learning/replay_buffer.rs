use super::environment::{Knowledge, RLAction, RLState};
use rand::{seq::IteratorRandom, Rng};
use std::collections::VecDeque;

/// Bounded FIFO memory. Once full, every new entry evicts the oldest one.
pub struct ReplayBuffer<S: RLState, A: RLAction> {
    memory: VecDeque<Knowledge<S, A>>,
    max_size: usize,
}

impl<S: RLState, A: RLAction> ReplayBuffer<S, A> {
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            memory: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    pub fn add(&mut self, knowledge: Knowledge<S, A>) {
        if self.memory.len() >= self.max_size {
            self.memory.pop_front();
        }
        self.memory.push_back(knowledge);
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn iter(&self) -> impl Iterator<Item = &Knowledge<S, A>> {
        self.memory.iter()
    }

    /// Uniform sample without replacement, `None` when the memory holds fewer than `amount`
    /// entries.
    pub fn get<R: Rng>(&self, amount: usize, rng: &mut R) -> Option<Vec<&Knowledge<S, A>>> {
        if self.memory.len() < amount {
            return None;
        }
        let (front, back) = self.memory.as_slices();
        Some(
            front
                .iter()
                .chain(back.iter())
                .choose_multiple(rng, amount),
        )
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    use super::super::environment::test_support::{TestAction, TestState};
    use super::*;

    fn knowledge(reward: f32) -> Knowledge<TestState, TestAction> {
        Knowledge::new(
            TestState::new(vec![reward], true),
            TestAction::Stay,
            reward,
            None,
        )
    }

    #[test]
    fn test_oldest_is_evicted() {
        let mut buffer = ReplayBuffer::new(3);
        for i in 0..5 {
            buffer.add(knowledge(i as f32));
        }
        assert_eq!(buffer.len(), 3);
        let rewards = buffer.iter().map(|k| k.reward()).collect::<Vec<_>>();
        assert_eq!(rewards, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_underrun_returns_none() {
        let mut buffer = ReplayBuffer::new(10);
        buffer.add(knowledge(1.0));
        let mut rng = XorShiftRng::seed_from_u64(0);
        assert!(buffer.get(2, &mut rng).is_none());
    }

    #[test]
    fn test_sample_without_replacement() {
        let mut buffer = ReplayBuffer::new(10);
        for i in 0..10 {
            buffer.add(knowledge(i as f32));
        }
        let mut rng = XorShiftRng::seed_from_u64(42);
        let batch = buffer.get(10, &mut rng).unwrap();
        let mut rewards = batch.iter().map(|k| k.reward() as i32).collect::<Vec<_>>();
        rewards.sort();
        assert_eq!(rewards, (0..10).collect::<Vec<_>>());
    }
}
