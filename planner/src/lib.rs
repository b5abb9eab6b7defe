//! Ascent Planner
//!
//! Orchestration layer over the core crates: loads the vehicle catalog and
//! debris element sets, builds the ascent trajectory, screens it for close
//! approaches, runs the avoidance optimizer when needed, and writes a
//! mission report. Consumes the core's outputs as opaque data.

use thiserror::Error;

pub mod catalog;
pub mod report;

pub use catalog::RocketCatalog;
pub use report::MissionReport;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("vehicle catalog {0} has no entries")]
    EmptyCatalog(String),
    #[error("unknown rocket type: {0}")]
    UnknownRocket(String),
    #[error("no rocket in the catalog supports {orbit} at {altitude_km:.0} km")]
    NoSuitableRocket { orbit: String, altitude_km: f64 },
    #[error("invalid launch timestamp {0}: expected RFC 3339")]
    InvalidTimestamp(String),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
