//! Trajectory Optimization Loop
//!
//! Treats collision avoidance as a sequential decision process: across a
//! fixed budget of episodes, sample velocity perturbations (explore vs.
//! exploit via a value estimator), rescan the perturbed trajectory for close
//! approaches, and learn from a replay buffer of past transitions. The loop
//! commits a perturbation only when it strictly improves on the best event
//! count seen in that episode, so unlucky exploration can never discard
//! progress, and it always returns the best trajectory found when the budget
//! runs out.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod action;
pub mod estimator;
pub mod optimizer;
pub mod replay;

pub use action::{AvoidanceAction, ACTION_COUNT};
pub use estimator::{ValueEstimator, ValueNetwork};
pub use optimizer::{OptimizationOutcome, TrajectoryOptimizer};
pub use replay::{EpisodeTransition, ReplayBuffer};

/// Rocket position plus nearest debris position, meters
pub const STATE_SIZE: usize = 6;

#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("checkpoint parse error: {0}")]
    CheckpointParse(#[from] serde_json::Error),
    #[error("checkpoint shape mismatch: {0}")]
    CheckpointShape(String),
}

pub type Result<T> = std::result::Result<T, OptimizerError>;

/// Search hyperparameters and budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub episodes: usize,
    pub max_steps: usize,
    pub learning_rate: f64,
    pub discount_factor: f64,
    pub exploration_rate: f64,
    pub exploration_decay: f64,
    pub exploration_floor: f64,
    pub replay_capacity: usize,
    pub batch_size: usize,
    /// Sync the target estimator from the live one every N episodes
    pub target_sync_interval: usize,
    /// Optional wall-clock cutoff; the loop returns its best-so-far when hit
    pub wall_clock_budget_s: Option<f64>,
    /// Seed for exploration and batch sampling
    pub seed: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            episodes: 50,
            max_steps: 100,
            learning_rate: 0.001,
            discount_factor: 0.95,
            exploration_rate: 1.0,
            exploration_decay: 0.995,
            exploration_floor: 0.1,
            replay_capacity: 10_000,
            batch_size: 32,
            target_sync_interval: 10,
            wall_clock_budget_s: None,
            seed: 0,
        }
    }
}
