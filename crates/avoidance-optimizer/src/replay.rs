//! Bounded FIFO replay buffer
//!
//! Decorrelates estimator updates from the most recent trajectory by
//! sampling random batches of past transitions. Oldest transitions are
//! evicted first once the buffer reaches capacity.

use crate::action::AvoidanceAction;
use crate::STATE_SIZE;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One optimization step, immutable once recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeTransition {
    pub state: [f64; STATE_SIZE],
    pub action: AvoidanceAction,
    pub reward: f64,
    pub next_state: [f64; STATE_SIZE],
    pub terminal: bool,
}

pub struct ReplayBuffer {
    transitions: VecDeque<EpisodeTransition>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn push(&mut self, transition: EpisodeTransition) {
        if self.transitions.len() == self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Random batch without replacement. `batch_size` must not exceed `len`.
    pub fn sample(&self, rng: &mut impl Rng, batch_size: usize) -> Vec<&EpisodeTransition> {
        rand::seq::index::sample(rng, self.transitions.len(), batch_size)
            .into_iter()
            .map(|i| &self.transitions[i])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn transition(reward: f64) -> EpisodeTransition {
        EpisodeTransition {
            state: [0.0; STATE_SIZE],
            action: AvoidanceAction::Hold,
            reward,
            next_state: [0.0; STATE_SIZE],
            terminal: false,
        }
    }

    #[test]
    fn test_evicts_oldest_at_capacity() {
        let mut buffer = ReplayBuffer::new(3);
        for i in 0..5 {
            buffer.push(transition(i as f64));
        }
        assert_eq!(buffer.len(), 3);
        // 0 and 1 evicted
        let rewards: Vec<f64> = buffer.transitions.iter().map(|t| t.reward).collect();
        assert_eq!(rewards, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_sample_returns_requested_size() {
        let mut buffer = ReplayBuffer::new(100);
        for i in 0..50 {
            buffer.push(transition(i as f64));
        }
        let mut rng = StdRng::seed_from_u64(42);
        let batch = buffer.sample(&mut rng, 32);
        assert_eq!(batch.len(), 32);

        // Without replacement: all sampled rewards distinct
        let mut rewards: Vec<f64> = batch.iter().map(|t| t.reward).collect();
        rewards.sort_by(|a, b| a.partial_cmp(b).unwrap());
        rewards.dedup();
        assert_eq!(rewards.len(), 32);
    }
}
