//! Proximity Scanner
//!
//! Screens a flight path against a debris field at discrete time steps and
//! records every pair whose separation drops below the threshold distance.
//! One batched adapter call per step amortizes the propagation cost, so a
//! scan is O(steps x debris_count) with the per-step field query dominating.

use chrono::{DateTime, Utc};
use debris_propagation::DebrisSource;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use trajectory_model::FlightPath;

/// Separation below which a close approach is flagged, km
pub const DEFAULT_THRESHOLD_KM: f64 = 1.0;

/// Scan time resolution, seconds
pub const DEFAULT_STEP_S: f64 = 10.0;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid scan configuration {name}: {value}")]
    InvalidConfig { name: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// Scanner configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScanConfig {
    pub threshold_km: f64,
    pub step_s: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threshold_km: DEFAULT_THRESHOLD_KM,
            step_s: DEFAULT_STEP_S,
        }
    }
}

impl ScanConfig {
    fn validate(&self) -> Result<()> {
        if !self.threshold_km.is_finite() || self.threshold_km <= 0.0 {
            return Err(ScanError::InvalidConfig {
                name: "threshold_km",
                value: self.threshold_km,
            });
        }
        if !self.step_s.is_finite() || self.step_s <= 0.0 {
            return Err(ScanError::InvalidConfig {
                name: "step_s",
                value: self.step_s,
            });
        }
        Ok(())
    }
}

/// One detected close approach. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityEvent {
    pub time_offset_s: f64,
    pub debris_position_m: Vector3<f64>,
    pub distance_km: f64,
}

/// Screen the flight path over `[0, t_total_s)` at the configured step.
///
/// Events come back sorted by non-decreasing time offset. A duration that
/// produces no steps, or an empty debris field, yields an empty list.
pub fn scan(
    path: &impl FlightPath,
    source: &impl DebrisSource,
    epoch: DateTime<Utc>,
    t_total_s: f64,
    config: &ScanConfig,
) -> Result<Vec<ProximityEvent>> {
    config.validate()?;

    let mut events = Vec::new();
    let mut steps = 0usize;
    let mut t = 0.0;
    while t < t_total_s {
        let rocket_m = path.position_at(t);
        for debris_m in source.positions_at(epoch, t) {
            let distance_km = (rocket_m - debris_m).norm() / 1000.0;
            if distance_km < config.threshold_km {
                events.push(ProximityEvent {
                    time_offset_s: t,
                    debris_position_m: debris_m,
                    distance_km,
                });
            }
        }
        steps += 1;
        t = steps as f64 * config.step_s;
    }

    // Step order already ascends, but the contract is a time-sorted list no
    // matter how the per-step work was scheduled.
    events.sort_by(|a, b| {
        a.time_offset_s
            .partial_cmp(&b.time_offset_s)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    debug!(
        steps,
        events = events.len(),
        threshold_km = config.threshold_km,
        "proximity scan complete"
    );

    Ok(events)
}
