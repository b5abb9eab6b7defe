//! The episodic avoidance search loop

use crate::action::AvoidanceAction;
use crate::estimator::{ValueEstimator, ValueNetwork};
use crate::replay::{EpisodeTransition, ReplayBuffer};
use crate::{OptimizerConfig, ACTION_COUNT, STATE_SIZE};
use chrono::{DateTime, Utc};
use debris_propagation::DebrisSource;
use proximity_scan::{scan, ProximityEvent, ScanConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};
use trajectory_model::{FlightPath, TrajectoryModel};

/// Result of an optimization session.
///
/// `cleared == false` is the convergence-shortfall outcome, not an error:
/// the episode budget ran out with close approaches remaining, and the
/// caller decides what that means.
pub struct OptimizationOutcome {
    pub trajectory: TrajectoryModel,
    pub events: Vec<ProximityEvent>,
    pub episodes_run: usize,
    pub cleared: bool,
}

/// Episodic search over trajectory perturbations.
///
/// Owns its replay buffer and both estimators; a session is single-writer
/// state and is never shared between concurrent optimizations.
pub struct TrajectoryOptimizer<E: ValueEstimator + Clone> {
    config: OptimizerConfig,
    live: E,
    target: E,
    replay: ReplayBuffer,
    exploration_rate: f64,
    rng: StdRng,
}

impl TrajectoryOptimizer<ValueNetwork> {
    /// Fresh network estimator
    pub fn new(config: OptimizerConfig) -> Self {
        let network = ValueNetwork::new(config.learning_rate, config.seed);
        Self::with_estimator(config, network)
    }

    /// Load the estimator from a checkpoint file if one is usable,
    /// otherwise start fresh.
    pub fn with_checkpoint(config: OptimizerConfig, checkpoint: &Path) -> Self {
        let network = ValueNetwork::load_or_fresh(checkpoint, config.learning_rate, config.seed);
        Self::with_estimator(config, network)
    }

    pub fn save_checkpoint(&self, checkpoint: &Path) -> crate::Result<()> {
        self.live.save(checkpoint)
    }
}

impl<E: ValueEstimator + Clone> TrajectoryOptimizer<E> {
    pub fn with_estimator(config: OptimizerConfig, estimator: E) -> Self {
        let target = estimator.clone();
        let replay = ReplayBuffer::new(config.replay_capacity);
        let exploration_rate = config.exploration_rate;
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            live: estimator,
            target,
            replay,
            exploration_rate,
            rng,
        }
    }

    pub fn live_estimator(&self) -> &E {
        &self.live
    }

    /// Search for a trajectory with fewer close approaches.
    ///
    /// With zero initial events the search is a no-op: the input comes back
    /// unchanged and no episodes run. Otherwise the loop runs until the
    /// trajectory clears, the episode budget is exhausted, or the wall-clock
    /// budget is hit, and returns the best trajectory seen (lowest event
    /// count across all episodes, ties to the most recent).
    pub fn optimize(
        &mut self,
        trajectory: &TrajectoryModel,
        source: &impl DebrisSource,
        epoch: DateTime<Utc>,
        scan_config: &ScanConfig,
        initial_events: &[ProximityEvent],
    ) -> proximity_scan::Result<OptimizationOutcome> {
        if initial_events.is_empty() {
            info!("no close approaches detected, optimization skipped");
            return Ok(OptimizationOutcome {
                trajectory: trajectory.clone(),
                events: Vec::new(),
                episodes_run: 0,
                cleared: true,
            });
        }

        let t_total = trajectory.t_total_s();
        let started = Instant::now();
        let mut best_trajectory = trajectory.clone();
        let mut best_events = initial_events.to_vec();
        let mut episodes_run = 0;

        info!(
            initial_events = initial_events.len(),
            episodes = self.config.episodes,
            "optimizing trajectory"
        );

        'episodes: for episode in 0..self.config.episodes {
            // Each episode restarts the search from the unmodified input
            let mut current = trajectory.clone();
            let mut episode_best = initial_events.len();
            let mut state = self.observe(&current, source, epoch, 0.0);
            let mut total_reward = 0.0;

            for step in 0..self.config.max_steps {
                if self.budget_exhausted(&started) {
                    info!(episode, step, "wall-clock budget reached, keeping best so far");
                    break 'episodes;
                }

                let t = step as f64 * (t_total / self.config.max_steps as f64);
                let action = self.select_action(&state);
                let candidate = action.apply(&current);
                let events = scan(&candidate, source, epoch, t_total, scan_config)?;
                let event_count = events.len();

                let reward = if event_count == 0 {
                    -100.0 * event_count as f64 + 10.0
                } else {
                    -100.0 * event_count as f64
                };
                let terminal = step == self.config.max_steps - 1 || event_count == 0;
                let next_state = self.observe(&candidate, source, epoch, t);

                self.replay.push(EpisodeTransition {
                    state,
                    action,
                    reward,
                    next_state,
                    terminal,
                });
                if self.replay.len() > self.config.batch_size {
                    self.replay_update();
                }

                // Commit only strict improvements on this episode's best
                if event_count < episode_best {
                    episode_best = event_count;
                    current = candidate;
                    if event_count <= best_events.len() {
                        best_trajectory = current.clone();
                        best_events = events;
                    }
                }

                state = next_state;
                total_reward += reward;
                if terminal {
                    break;
                }
            }

            episodes_run = episode + 1;
            self.exploration_rate =
                (self.exploration_rate * self.config.exploration_decay)
                    .max(self.config.exploration_floor);
            if episodes_run % self.config.target_sync_interval == 0 {
                self.target = self.live.clone();
            }

            info!(
                episode = episodes_run,
                total_reward,
                best_event_count = best_events.len(),
                exploration_rate = self.exploration_rate,
                "episode complete"
            );

            if best_events.is_empty() {
                break;
            }
        }

        let cleared = best_events.is_empty();
        info!(
            episodes_run,
            remaining_events = best_events.len(),
            cleared,
            "optimization finished"
        );

        Ok(OptimizationOutcome {
            trajectory: best_trajectory,
            events: best_events,
            episodes_run,
            cleared,
        })
    }

    fn budget_exhausted(&self, started: &Instant) -> bool {
        self.config
            .wall_clock_budget_s
            .is_some_and(|budget| started.elapsed().as_secs_f64() > budget)
    }

    fn select_action(&mut self, state: &[f64; STATE_SIZE]) -> AvoidanceAction {
        if self.rng.gen::<f64>() < self.exploration_rate {
            let index = self.rng.gen_range(0..ACTION_COUNT);
            AvoidanceAction::from_index(index).unwrap_or(AvoidanceAction::Hold)
        } else {
            let values = self.live.predict(state);
            AvoidanceAction::from_index(argmax(&values)).unwrap_or(AvoidanceAction::Hold)
        }
    }

    /// Rocket position and nearest debris position at the step's time offset
    fn observe(
        &self,
        trajectory: &TrajectoryModel,
        source: &impl DebrisSource,
        epoch: DateTime<Utc>,
        t_offset_s: f64,
    ) -> [f64; STATE_SIZE] {
        let rocket = trajectory.position_at(t_offset_s);
        let nearest = source.nearest_to(&rocket, epoch, t_offset_s);
        [
            rocket.x, rocket.y, rocket.z, nearest.x, nearest.y, nearest.z,
        ]
    }

    fn replay_update(&mut self) {
        let batch: Vec<EpisodeTransition> = self
            .replay
            .sample(&mut self.rng, self.config.batch_size)
            .into_iter()
            .cloned()
            .collect();

        let mut states = Vec::with_capacity(batch.len());
        let mut targets = Vec::with_capacity(batch.len());
        for transition in &batch {
            let mut values = self.live.predict(&transition.state);
            let bootstrap = if transition.terminal {
                0.0
            } else {
                let next_values = self.target.predict(&transition.next_state);
                self.config.discount_factor
                    * next_values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            };
            values[transition.action.index()] = transition.reward + bootstrap;
            states.push(transition.state);
            targets.push(values);
        }
        self.live.fit(&states, &targets);
        debug!(batch = batch.len(), "estimator updated from replay batch");
    }
}

fn argmax(values: &[f64; ACTION_COUNT]) -> usize {
    let mut best = 0;
    for (index, value) in values.iter().enumerate() {
        if *value > values[best] {
            best = index;
        }
    }
    best
}
