//! Trajectory perturbation actions

use serde::{Deserialize, Serialize};
use trajectory_model::{Axis, TrajectoryModel};

pub const ACTION_COUNT: usize = 5;

/// Velocity scale applied by the increase/decrease actions
const VELOCITY_SCALE_UP: f64 = 1.1;
const VELOCITY_SCALE_DOWN: f64 = 0.9;

/// The fixed action set of the avoidance search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvoidanceAction {
    Hold,
    IncreaseXVelocity,
    DecreaseXVelocity,
    IncreaseYVelocity,
    DecreaseYVelocity,
}

impl AvoidanceAction {
    pub const ALL: [AvoidanceAction; ACTION_COUNT] = [
        AvoidanceAction::Hold,
        AvoidanceAction::IncreaseXVelocity,
        AvoidanceAction::DecreaseXVelocity,
        AvoidanceAction::IncreaseYVelocity,
        AvoidanceAction::DecreaseYVelocity,
    ];

    pub fn index(self) -> usize {
        match self {
            AvoidanceAction::Hold => 0,
            AvoidanceAction::IncreaseXVelocity => 1,
            AvoidanceAction::DecreaseXVelocity => 2,
            AvoidanceAction::IncreaseYVelocity => 3,
            AvoidanceAction::DecreaseYVelocity => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<AvoidanceAction> {
        Self::ALL.get(index).copied()
    }

    /// Perturbed copy of the trajectory; the input is never mutated.
    pub fn apply(self, trajectory: &TrajectoryModel) -> TrajectoryModel {
        match self {
            AvoidanceAction::Hold => trajectory.perturb(Axis::X, 1.0),
            AvoidanceAction::IncreaseXVelocity => trajectory.perturb(Axis::X, VELOCITY_SCALE_UP),
            AvoidanceAction::DecreaseXVelocity => trajectory.perturb(Axis::X, VELOCITY_SCALE_DOWN),
            AvoidanceAction::IncreaseYVelocity => trajectory.perturb(Axis::Y, VELOCITY_SCALE_UP),
            AvoidanceAction::DecreaseYVelocity => trajectory.perturb(Axis::Y, VELOCITY_SCALE_DOWN),
        }
    }
}
