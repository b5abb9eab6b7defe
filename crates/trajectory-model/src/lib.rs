//! Ascent Trajectory Model
//!
//! Rocket position as a closed-form function of elapsed time since launch,
//! piecewise over a powered burn phase and an unpowered coast phase.
//! Formulas are a small tagged sum type evaluated by structural recursion,
//! never interpreted text, and perturbation always produces a new model.

use nalgebra::Vector3;
use thiserror::Error;

pub mod ascent;
pub mod curve;
pub mod orbit;

pub use ascent::{AscentParams, LaunchSite, RocketParams, TrajectoryModel};
pub use curve::AxisCurve;
pub use orbit::OrbitClass;

/// Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6.371e6;

/// Earth gravitational parameter (m^3/s^2)
pub const GM_EARTH: f64 = 3.986e14;

/// Sea-level gravity (m/s^2)
pub const G0: f64 = 9.81;

#[derive(Error, Debug)]
pub enum TrajectoryError {
    #[error("non-finite trajectory parameter: {0}")]
    NonFinite(&'static str),
    #[error("invalid trajectory parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("thrust {thrust_n:.0} N cannot lift initial mass {mass_kg:.0} kg")]
    InsufficientThrust { thrust_n: f64, mass_kg: f64 },
    #[error("burn-out velocity too low to coast to target altitude {0:.0} km")]
    UnreachableAltitude(f64),
    #[error("target altitude {altitude_km:.0} km outside {orbit:?} range {min_km:.0}-{max_km:.0} km")]
    AltitudeOutsideOrbitRange {
        orbit: OrbitClass,
        altitude_km: f64,
        min_km: f64,
        max_km: f64,
    },
    #[error("unknown orbit class: {0}")]
    UnknownOrbitClass(String),
}

pub type Result<T> = std::result::Result<T, TrajectoryError>;

/// Trajectory axis selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Anything that maps elapsed seconds since launch to a 3D position in meters.
///
/// The proximity scanner and the avoidance optimizer only need this view of a
/// trajectory, which keeps them testable against synthetic paths.
pub trait FlightPath {
    fn position_at(&self, t_s: f64) -> Vector3<f64>;
}
