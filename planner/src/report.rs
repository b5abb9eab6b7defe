//! Mission report generation
//!
//! Summarizes a planning run — vehicle, trajectory before and after
//! optimization, detected close approaches — as a JSON document for
//! downstream reporting and visualization.

use crate::Result;
use chrono::{DateTime, Utc};
use proximity_scan::ProximityEvent;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;
use trajectory_model::{FlightPath, RocketParams, TrajectoryModel};
use uuid::Uuid;

/// Sample count for path-length integration
const PATH_SAMPLES: usize = 1000;

#[derive(Debug, Serialize)]
pub struct MissionReport {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub overview: MissionOverview,
    pub rocket: RocketSummary,
    pub initial_trajectory: TrajectorySummary,
    pub optimized_trajectory: Option<TrajectorySummary>,
    pub initial_events: Vec<EventSummary>,
    pub remaining_events: Vec<EventSummary>,
    pub episodes_run: usize,
    pub success_rate_pct: f64,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MissionOverview {
    pub rocket_type: String,
    pub launch_site: String,
    pub orbit_type: String,
    pub target_altitude_km: f64,
    pub launch_timestamp: DateTime<Utc>,
    pub total_journey_time_s: f64,
}

#[derive(Debug, Serialize)]
pub struct RocketSummary {
    pub thrust_kn: f64,
    pub initial_mass_kg: f64,
    pub burn_time_s: f64,
}

#[derive(Debug, Serialize)]
pub struct TrajectorySummary {
    pub formulas: [String; 3],
    pub initial_position_km: [f64; 3],
    pub final_position_km: [f64; 3],
    pub time_to_climb_s: f64,
    pub path_length_km: f64,
    pub orbital_velocity_km_s: f64,
}

impl TrajectorySummary {
    pub fn from_model(model: &TrajectoryModel) -> Self {
        let start = model.position_at(0.0) / 1000.0;
        let end = model.position_at(model.t_total_s()) / 1000.0;
        Self {
            formulas: model.formulas(),
            initial_position_km: [start.x, start.y, start.z],
            final_position_km: [end.x, end.y, end.z],
            time_to_climb_s: model.t_total_s(),
            path_length_km: model.path_length_km(PATH_SAMPLES),
            orbital_velocity_km_s: model.orbital_velocity_mps() / 1000.0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventSummary {
    pub time_offset_s: f64,
    pub debris_position_km: [f64; 3],
    pub distance_km: f64,
}

impl EventSummary {
    fn from_event(event: &ProximityEvent) -> Self {
        let position_km = event.debris_position_m / 1000.0;
        Self {
            time_offset_s: event.time_offset_s,
            debris_position_km: [position_km.x, position_km.y, position_km.z],
            distance_km: event.distance_km,
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn generate(
    rocket: &RocketParams,
    orbit_type: &str,
    target_altitude_km: f64,
    launch_timestamp: DateTime<Utc>,
    initial_trajectory: &TrajectoryModel,
    initial_events: &[ProximityEvent],
    optimized_trajectory: Option<&TrajectoryModel>,
    remaining_events: &[ProximityEvent],
    episodes_run: usize,
) -> MissionReport {
    let journey = optimized_trajectory
        .unwrap_or(initial_trajectory)
        .t_total_s();

    let success_rate_pct = if remaining_events.is_empty() {
        100.0
    } else {
        (100.0 - 10.0 * remaining_events.len() as f64).max(0.0)
    };
    let status = if success_rate_pct > 90.0 {
        "Success"
    } else if success_rate_pct > 50.0 {
        "Partial Success"
    } else {
        "Failure"
    };

    MissionReport {
        report_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        overview: MissionOverview {
            rocket_type: rocket.rocket_type.clone(),
            launch_site: rocket.launch_site_name.clone(),
            orbit_type: orbit_type.to_string(),
            target_altitude_km,
            launch_timestamp,
            total_journey_time_s: journey,
        },
        rocket: RocketSummary {
            thrust_kn: rocket.thrust_n / 1000.0,
            initial_mass_kg: rocket.initial_mass_kg,
            burn_time_s: rocket.burn_time_s,
        },
        initial_trajectory: TrajectorySummary::from_model(initial_trajectory),
        optimized_trajectory: optimized_trajectory.map(TrajectorySummary::from_model),
        initial_events: initial_events.iter().map(EventSummary::from_event).collect(),
        remaining_events: remaining_events
            .iter()
            .map(EventSummary::from_event)
            .collect(),
        episodes_run,
        success_rate_pct,
        status,
    }
}

impl MissionReport {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        info!(path = %path.display(), "mission report saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use nalgebra::Vector3;
    use trajectory_model::{AxisCurve, LaunchSite, OrbitClass};

    fn sample_rocket() -> RocketParams {
        RocketParams {
            rocket_type: "Corvid-9".to_string(),
            launch_site_name: "Cape Canaveral".to_string(),
            site: LaunchSite {
                latitude_deg: 28.5,
                longitude_deg: -80.5,
                altitude_m: 0.0,
            },
            thrust_n: 3.7e6,
            initial_mass_kg: 17_000.0,
            burn_time_s: 214.0,
            max_altitude_km: 2_000.0,
            orbit_classes: vec![OrbitClass::Leo],
        }
    }

    fn sample_model() -> TrajectoryModel {
        TrajectoryModel::from_curves(
            AxisCurve::Linear {
                intercept: 0.0,
                slope: 10_000.0,
            },
            AxisCurve::Constant(0.0),
            AxisCurve::Constant(0.0),
            5.0,
            10.0,
        )
    }

    fn sample_event() -> ProximityEvent {
        ProximityEvent {
            time_offset_s: 5.0,
            debris_position_m: Vector3::new(50_000.0, 0.0, 0.0),
            distance_km: 0.4,
        }
    }

    #[test]
    fn test_clear_mission_reports_success() {
        let model = sample_model();
        let report = generate(
            &sample_rocket(),
            "Low Earth Orbit (LEO)",
            500.0,
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            &model,
            &[sample_event()],
            Some(&model),
            &[],
            3,
        );
        assert_eq!(report.success_rate_pct, 100.0);
        assert_eq!(report.status, "Success");
        assert_eq!(report.initial_events.len(), 1);
        assert!(report.remaining_events.is_empty());
    }

    #[test]
    fn test_remaining_events_degrade_success_rate() {
        let model = sample_model();
        let events = vec![sample_event(), sample_event(), sample_event()];
        let report = generate(
            &sample_rocket(),
            "Low Earth Orbit (LEO)",
            500.0,
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            &model,
            &events,
            Some(&model),
            &events,
            50,
        );
        assert_eq!(report.success_rate_pct, 70.0);
        assert_eq!(report.status, "Partial Success");
    }

    #[test]
    fn test_report_serializes_to_json() {
        let model = sample_model();
        let report = generate(
            &sample_rocket(),
            "Low Earth Orbit (LEO)",
            500.0,
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            &model,
            &[],
            None,
            &[],
            0,
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["overview"]["rocket_type"], "Corvid-9");
        assert_eq!(json["episodes_run"], 0);
        assert!(json["optimized_trajectory"].is_null());
        // Formulas render the curve structure, not opaque text
        let formula = json["initial_trajectory"]["formulas"][0].as_str().unwrap();
        assert!(formula.contains("10000.00*t"));
    }

    #[test]
    fn test_report_saves_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let model = sample_model();
        let report = generate(
            &sample_rocket(),
            "Low Earth Orbit (LEO)",
            500.0,
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            &model,
            &[],
            None,
            &[],
            0,
        );
        report.save(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"status\": \"Success\""));
    }
}
