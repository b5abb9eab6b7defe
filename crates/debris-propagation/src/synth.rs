//! Synthetic conjunction element sets
//!
//! Builds checksummed TLE line pairs for near-circular orbits that pass
//! through chosen points of a flight path at chosen times, for demo runs and
//! screening tests. Each generated object's element epoch is the launch time
//! plus its conjunction offset, with the mean anomaly placed so the object
//! sits at the requested point at that epoch.

use chrono::{DateTime, Datelike, Timelike, Utc};
use nalgebra::Vector3;

/// Earth gravitational parameter (m^3/s^2)
const GM_EARTH: f64 = 3.986e14;

/// First synthetic NORAD id, clear of the public catalog
const SYNTH_NORAD_BASE: u64 = 70_000;

/// Generated TLE pair with its driving geometry
#[derive(Debug, Clone)]
pub struct GeneratedTle {
    pub norad_id: u64,
    pub line1: String,
    pub line2: String,
    pub conjunction_offset_s: f64,
}

/// Generate one TLE pair per `(t_offset_s, position_m)` conjunction point.
pub fn conjunction_tles(
    launch: DateTime<Utc>,
    points: &[(f64, Vector3<f64>)],
) -> Vec<GeneratedTle> {
    points
        .iter()
        .enumerate()
        .map(|(index, (t_offset_s, position_m))| {
            let norad_id = SYNTH_NORAD_BASE + index as u64;
            let epoch = launch + chrono::Duration::milliseconds((t_offset_s * 1000.0) as i64);
            let (line1, line2) = tle_lines(norad_id, position_m, epoch);
            GeneratedTle {
                norad_id,
                line1,
                line2,
                conjunction_offset_s: *t_offset_s,
            }
        })
        .collect()
}

/// Render the element set as a TLE pair for a circular orbit through
/// `position_m` at `epoch`.
fn tle_lines(norad_id: u64, position_m: &Vector3<f64>, epoch: DateTime<Utc>) -> (String, String) {
    let r_m = position_m.norm();
    let r_km = r_m / 1000.0;

    // Circular orbit at that radius
    let mean_motion_rev_day =
        (GM_EARTH / (r_m * r_m * r_m)).sqrt() * 86_400.0 / (2.0 * std::f64::consts::PI);

    // Place the object at its extreme-latitude point (argument of latitude
    // 90 or 270 degrees), which pins inclination and node to the target.
    let sin_lat = (position_m.z / r_m).clamp(-1.0, 1.0);
    let (mean_anomaly_deg, inclination_deg, raan_rad) = if position_m.z >= 0.0 {
        (
            90.0,
            sin_lat.asin().to_degrees(),
            (-position_m.x).atan2(position_m.y),
        )
    } else {
        (
            270.0,
            (-sin_lat).asin().to_degrees(),
            position_m.x.atan2(-position_m.y),
        )
    };
    let inclination_deg = inclination_deg.clamp(0.1, 179.9);
    let raan_deg = raan_rad.to_degrees().rem_euclid(360.0);

    // Epoch as YYDDD.DDDDDDDD
    let year = epoch.year() % 100;
    let day_of_year = epoch.ordinal() as f64
        + (epoch.hour() as f64 / 24.0)
        + (epoch.minute() as f64 / 1440.0)
        + (epoch.second() as f64 / 86_400.0);

    let line1_base = format!(
        "1 {norad_id:05}U 25001A   {year:02}{day_of_year:012.8} -.00000000  00000-0  10000-3 0  999"
    );
    let line1 = format!("{line1_base}{}", checksum_digit(&line1_base));

    // Near-circular, perigee placement irrelevant
    let eccentricity_field = format!("{:07}", (0.0001_f64 * 10_000_000.0) as u32);
    let line2_base = format!(
        "2 {norad_id:05} {inclination_deg:8.4} {raan_deg:8.4} {eccentricity_field} {:8.4} {mean_anomaly_deg:8.4} {mean_motion_rev_day:11.8}{:05}",
        0.0, 1
    );
    let line2 = format!("{line2_base}{}", checksum_digit(&line2_base));

    (line1, line2)
}

/// TLE modulo-10 checksum: digits count as themselves, minus signs as 1
fn checksum_digit(line: &str) -> u32 {
    let sum: u32 = line
        .chars()
        .map(|c| match c {
            '0'..='9' => c.to_digit(10).unwrap(),
            '-' => 1,
            _ => 0,
        })
        .sum();
    sum % 10
}
