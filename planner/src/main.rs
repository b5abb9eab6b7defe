//! Ascent Planning CLI
//!
//! Screens a planned ascent trajectory against tracked orbital debris and,
//! when close approaches are found, searches for an adjusted trajectory
//! that clears them.
//!
//! Usage:
//!   plan-ascent --tle-file data/tle_data.txt --orbit leo --altitude-km 500 \
//!               --report-out mission_report.json

use anyhow::Result;
use ascent_planner::{catalog::RocketCatalog, report, PlannerError};
use avoidance_optimizer::{OptimizerConfig, TrajectoryOptimizer};
use chrono::{DateTime, Utc};
use clap::Parser;
use debris_propagation::{synth, DebrisCatalog, DebrisRecord};
use proximity_scan::{scan, ScanConfig};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use trajectory_model::{AscentParams, FlightPath, OrbitClass, TrajectoryModel};

#[derive(Parser, Debug)]
#[command(
    name = "plan-ascent",
    about = "Debris screening and avoidance optimization for ascent trajectories"
)]
struct Args {
    /// Two-line element file with tracked debris
    #[arg(short, long, default_value = "data/tle_data.txt")]
    tle_file: PathBuf,

    /// Vehicle catalog JSON
    #[arg(long, default_value = "data/rockets.json")]
    catalog: PathBuf,

    /// Target orbit class: leo, meo, geo or heo
    #[arg(short, long, default_value = "leo")]
    orbit: String,

    /// Target altitude in km
    #[arg(short, long, default_value_t = 500.0)]
    altitude_km: f64,

    /// Rocket type (default: first catalog entry able to fly the mission)
    #[arg(short, long)]
    rocket: Option<String>,

    /// Launch timestamp, RFC 3339 (default: start of the TLE validity window)
    #[arg(short, long)]
    launch_time: Option<String>,

    /// Close-approach threshold in km
    #[arg(long, default_value_t = proximity_scan::DEFAULT_THRESHOLD_KM)]
    threshold_km: f64,

    /// Scan time step in seconds
    #[arg(long, default_value_t = proximity_scan::DEFAULT_STEP_S)]
    step_s: f64,

    /// Optimization episode budget
    #[arg(long, default_value_t = 50)]
    episodes: usize,

    /// Steps per optimization episode
    #[arg(long, default_value_t = 100)]
    max_steps: usize,

    /// Wall-clock budget for the optimization loop, seconds
    #[arg(long)]
    budget_s: Option<f64>,

    /// Estimator checkpoint (loaded when present, saved after optimization)
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Mission report output path
    #[arg(long, default_value = "mission_report.json")]
    report_out: PathBuf,

    /// Inject N synthetic conjunction objects onto the planned path
    #[arg(long, default_value_t = 0)]
    inject_conjunctions: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{}", "=".repeat(60));
    info!("Ascent Planner");
    info!("{}", "=".repeat(60));

    // Mission selection
    let orbit: OrbitClass = args.orbit.parse()?;
    orbit.validate_altitude_km(args.altitude_km)?;
    let catalog = RocketCatalog::load(&args.catalog)?;
    let rocket = catalog.select(args.rocket.as_deref(), orbit, args.altitude_km)?;
    info!(
        "Vehicle: {} from {}",
        rocket.rocket_type, rocket.launch_site_name
    );

    // Debris catalog and launch window
    let mut debris = DebrisCatalog::load(&args.tle_file)?;
    let (window_start, window_end) = debris.epoch_window()?;
    info!(
        "TLE validity window: {} to {}",
        window_start.to_rfc3339(),
        window_end.to_rfc3339()
    );
    let launch: DateTime<Utc> = match &args.launch_time {
        Some(text) => DateTime::parse_from_rfc3339(text)
            .map_err(|_| PlannerError::InvalidTimestamp(text.clone()))?
            .with_timezone(&Utc),
        None => window_start,
    };
    debris.validate_launch_time(launch)?;
    info!("Launch: {}", launch.to_rfc3339());

    // Initial trajectory
    let params = AscentParams::from_rocket(rocket, args.altitude_km);
    let trajectory = TrajectoryModel::plan(&params)?;
    info!(
        "Planned ascent: burn {:.1} s, climb {:.1} s",
        trajectory.burn_time_s(),
        trajectory.t_total_s()
    );

    // Optional synthetic conjunctions for demo runs
    if args.inject_conjunctions > 0 {
        let count = args.inject_conjunctions;
        let points: Vec<(f64, nalgebra::Vector3<f64>)> = (0..count)
            .map(|i| {
                let t = trajectory.t_total_s() * (i + 1) as f64 / (count + 1) as f64;
                (t, trajectory.position_at(t))
            })
            .collect();
        for tle in synth::conjunction_tles(launch, &points) {
            match DebrisRecord::from_tle(None, &tle.line1, &tle.line2) {
                Ok(record) => debris.push(record),
                Err(err) => warn!(%err, norad_id = tle.norad_id, "synthetic object rejected"),
            }
        }
        info!("Injected {} synthetic conjunction objects", count);
    }
    info!("Tracked objects: {}", debris.len());

    // Screen the planned trajectory
    let scan_config = ScanConfig {
        threshold_km: args.threshold_km,
        step_s: args.step_s,
    };
    let initial_events = scan(
        &trajectory,
        &debris,
        launch,
        trajectory.t_total_s(),
        &scan_config,
    )?;
    info!("Close approaches detected: {}", initial_events.len());
    for event in &initial_events {
        info!(
            "  t={:.1}s distance={:.3}km",
            event.time_offset_s, event.distance_km
        );
    }

    // Optimize when the path is blocked
    let outcome = if initial_events.is_empty() {
        info!("No optimization needed");
        None
    } else {
        let config = OptimizerConfig {
            episodes: args.episodes,
            max_steps: args.max_steps,
            wall_clock_budget_s: args.budget_s,
            ..OptimizerConfig::default()
        };
        let mut optimizer = match &args.checkpoint {
            Some(path) => TrajectoryOptimizer::with_checkpoint(config, path),
            None => TrajectoryOptimizer::new(config),
        };
        let outcome = optimizer.optimize(
            &trajectory,
            &debris,
            launch,
            &scan_config,
            &initial_events,
        )?;
        if let Some(path) = &args.checkpoint {
            optimizer.save_checkpoint(path)?;
        }
        info!(
            "Optimization: {} episodes, {} close approaches remaining",
            outcome.episodes_run,
            outcome.events.len()
        );
        Some(outcome)
    };

    // Report
    let (optimized, remaining, episodes_run) = match &outcome {
        Some(outcome) => (
            Some(&outcome.trajectory),
            outcome.events.as_slice(),
            outcome.episodes_run,
        ),
        None => (None, initial_events.as_slice(), 0),
    };
    let mission_report = report::generate(
        rocket,
        orbit.name(),
        args.altitude_km,
        launch,
        &trajectory,
        &initial_events,
        optimized,
        remaining,
        episodes_run,
    );
    mission_report.save(&args.report_out)?;

    info!("{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Status: {}", mission_report.status);
    info!("Success rate: {:.1}%", mission_report.success_rate_pct);
    info!("Report: {}", args.report_out.display());

    Ok(())
}
