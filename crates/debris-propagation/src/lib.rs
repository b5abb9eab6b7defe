//! Debris Propagation Adapter
//!
//! Loads two-line element sets into an immutable catalog and answers one
//! question for the proximity scanner: where is every propagable debris
//! object at `epoch + t_offset`? A single bad element set never aborts a
//! scan; objects that fail to propagate are logged and excluded from that
//! call's result set.

use chrono::{DateTime, Duration, Utc};
use nalgebra::Vector3;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

pub mod synth;

/// TLE catalog validity window after the earliest element epoch
pub const EPOCH_WINDOW_DAYS: i64 = 7;

#[derive(Error, Debug)]
pub enum DebrisError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid element set: {0}")]
    InvalidElements(String),
    #[error("propagation failed for object {norad_id}: {reason}")]
    PropagationFailed { norad_id: u64, reason: String },
    #[error("no usable element sets in {0}")]
    NoUsableElements(String),
    #[error("element collection is empty")]
    EmptyCatalog,
    #[error("launch timestamp {requested} outside validity window {start} to {end}")]
    TimestampOutsideWindow {
        requested: DateTime<Utc>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

pub type Result<T> = std::result::Result<T, DebrisError>;

/// Anything that yields debris positions for a scan time step.
///
/// One call returns the full field for that step, so the per-step
/// propagation cost is amortized behind a single batched call.
pub trait DebrisSource {
    /// Positions in meters of every object that propagates at
    /// `epoch + t_offset_s`. Failed objects are excluded, never an error.
    fn positions_at(&self, epoch: DateTime<Utc>, t_offset_s: f64) -> Vec<Vector3<f64>>;

    /// Position of the object closest to `reference_m` at the given offset,
    /// or the zero vector when nothing propagates.
    fn nearest_to(
        &self,
        reference_m: &Vector3<f64>,
        epoch: DateTime<Utc>,
        t_offset_s: f64,
    ) -> Vector3<f64> {
        self.positions_at(epoch, t_offset_s)
            .into_iter()
            .min_by(|a, b| {
                let da = (a - reference_m).norm_squared();
                let db = (b - reference_m).norm_squared();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or_else(Vector3::zeros)
    }
}

/// One orbital element set, immutable after load.
///
/// Wraps the parsed elements together with the derived SGP4 constants so
/// repeated position queries never re-parse.
pub struct DebrisRecord {
    elements: sgp4::Elements,
    constants: sgp4::Constants,
    epoch_utc: DateTime<Utc>,
}

impl DebrisRecord {
    pub fn from_tle(name: Option<String>, line1: &str, line2: &str) -> Result<Self> {
        let elements = sgp4::Elements::from_tle(name, line1.as_bytes(), line2.as_bytes())
            .map_err(|e| DebrisError::InvalidElements(format!("{e:?}")))?;
        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| DebrisError::InvalidElements(format!("{e:?}")))?;
        let epoch_utc = DateTime::<Utc>::from_naive_utc_and_offset(elements.datetime, Utc);
        Ok(Self {
            elements,
            constants,
            epoch_utc,
        })
    }

    pub fn norad_id(&self) -> u64 {
        self.elements.norad_id
    }

    pub fn epoch_utc(&self) -> DateTime<Utc> {
        self.epoch_utc
    }

    pub fn eccentricity(&self) -> f64 {
        self.elements.eccentricity
    }

    pub fn inclination_deg(&self) -> f64 {
        self.elements.inclination
    }

    pub fn right_ascension_deg(&self) -> f64 {
        self.elements.right_ascension
    }

    pub fn argument_of_perigee_deg(&self) -> f64 {
        self.elements.argument_of_perigee
    }

    pub fn mean_anomaly_deg(&self) -> f64 {
        self.elements.mean_anomaly
    }

    pub fn mean_motion_rev_day(&self) -> f64 {
        self.elements.mean_motion
    }

    pub fn drag_term(&self) -> f64 {
        self.elements.drag_term
    }

    /// TEME position in meters at an absolute time
    pub fn position_at(&self, at: DateTime<Utc>) -> Result<Vector3<f64>> {
        let minutes_since_epoch = (at - self.epoch_utc).num_milliseconds() as f64 / 60_000.0;
        let prediction = self
            .constants
            .propagate(minutes_since_epoch)
            .map_err(|e| DebrisError::PropagationFailed {
                norad_id: self.norad_id(),
                reason: format!("{e:?}"),
            })?;
        // sgp4 yields km; the scanner works in meters
        Ok(Vector3::new(
            prediction.position[0],
            prediction.position[1],
            prediction.position[2],
        ) * 1000.0)
    }
}

/// Immutable debris catalog for one scan session
pub struct DebrisCatalog {
    records: Vec<DebrisRecord>,
}

impl DebrisCatalog {
    pub fn from_records(records: Vec<DebrisRecord>) -> Self {
        Self { records }
    }

    /// Load a catalog from a two-line element text file.
    ///
    /// Malformed pairs are logged and skipped; a file with no usable pair at
    /// all is fatal to the load.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let catalog = Self::parse(&text)?;
        if catalog.is_empty() {
            return Err(DebrisError::NoUsableElements(path.display().to_string()));
        }
        debug!(count = catalog.len(), path = %path.display(), "loaded debris catalog");
        Ok(catalog)
    }

    /// Parse two-line element text, tolerating name lines and comments.
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect();

        let mut records = Vec::new();
        let mut pending_name: Option<String> = None;
        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            if line.starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
                match DebrisRecord::from_tle(pending_name.take(), line, lines[i + 1]) {
                    Ok(record) => records.push(record),
                    Err(err) => warn!(%err, "skipping invalid element set"),
                }
                i += 2;
            } else {
                // Anything else names the pair that follows
                pending_name = Some(line.to_string());
                i += 1;
            }
        }
        Ok(Self { records })
    }

    /// Add a record while the catalog is being assembled, before any scan
    /// session reads it.
    pub fn push(&mut self, record: DebrisRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[DebrisRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validity window: earliest element epoch through +7 days
    pub fn epoch_window(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self
            .records
            .iter()
            .map(DebrisRecord::epoch_utc)
            .min()
            .ok_or(DebrisError::EmptyCatalog)?;
        Ok((start, start + Duration::days(EPOCH_WINDOW_DAYS)))
    }

    /// Reject launch timestamps outside the catalog's validity window
    pub fn validate_launch_time(&self, requested: DateTime<Utc>) -> Result<()> {
        let (start, end) = self.epoch_window()?;
        if requested < start || requested > end {
            return Err(DebrisError::TimestampOutsideWindow {
                requested,
                start,
                end,
            });
        }
        Ok(())
    }
}

impl DebrisSource for DebrisCatalog {
    fn positions_at(&self, epoch: DateTime<Utc>, t_offset_s: f64) -> Vec<Vector3<f64>> {
        let at = epoch + Duration::milliseconds((t_offset_s * 1000.0).round() as i64);
        self.records
            .iter()
            .filter_map(|record| match record.position_at(at) {
                Ok(position) => Some(position),
                Err(err) => {
                    warn!(norad_id = record.norad_id(), %err, "excluding object for this step");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // Reference element set (Vallado's ISS test case, checksums valid)
    const ISS_LINE1: &str =
        "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    const ISS_LINE2: &str =
        "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    #[test]
    fn test_record_from_tle() {
        let record = DebrisRecord::from_tle(None, ISS_LINE1, ISS_LINE2).unwrap();
        assert_eq!(record.norad_id(), 25544);
        assert!((record.inclination_deg() - 51.6416).abs() < 1e-4);
        assert!((record.mean_motion_rev_day() - 15.72125391).abs() < 1e-6);
        assert_eq!(record.epoch_utc().date_naive().to_string(), "2008-09-20");
    }

    #[test]
    fn test_position_at_epoch_is_orbital_radius() {
        let record = DebrisRecord::from_tle(None, ISS_LINE1, ISS_LINE2).unwrap();
        let position = record.position_at(record.epoch_utc()).unwrap();
        // ISS orbital radius ~6,780 km, returned in meters
        let radius_km = position.norm() / 1000.0;
        assert!(radius_km > 6_500.0 && radius_km < 7_100.0, "radius {radius_km}");
    }

    #[test]
    fn test_positions_at_deterministic() {
        let catalog =
            DebrisCatalog::parse(&format!("{ISS_LINE1}\n{ISS_LINE2}\n")).unwrap();
        let epoch = Utc.with_ymd_and_hms(2008, 9, 20, 12, 25, 40).unwrap();
        let first = catalog.positions_at(epoch, 120.0);
        let second = catalog.positions_at(epoch, 120.0);
        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_skips_malformed_pairs() {
        let text = format!(
            "# comment line\n\
             ISS (ZARYA)\n\
             {ISS_LINE1}\n\
             {ISS_LINE2}\n\
             1 9999XU BROKEN\n\
             2 99999 not a real line\n"
        );
        let catalog = DebrisCatalog::parse(&text).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.records()[0].norad_id(), 25544);
    }

    #[test]
    fn test_load_rejects_unusable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.txt");
        fs::write(&path, "not a TLE\nnothing here\n").unwrap();
        assert!(matches!(
            DebrisCatalog::load(&path),
            Err(DebrisError::NoUsableElements(_))
        ));
    }

    #[test]
    fn test_epoch_window_and_validation() {
        let catalog =
            DebrisCatalog::parse(&format!("{ISS_LINE1}\n{ISS_LINE2}\n")).unwrap();
        let (start, end) = catalog.epoch_window().unwrap();
        assert_eq!(end - start, Duration::days(EPOCH_WINDOW_DAYS));

        assert!(catalog.validate_launch_time(start).is_ok());
        assert!(catalog
            .validate_launch_time(start + Duration::days(3))
            .is_ok());
        assert!(matches!(
            catalog.validate_launch_time(start - Duration::hours(1)),
            Err(DebrisError::TimestampOutsideWindow { .. })
        ));
        assert!(catalog
            .validate_launch_time(end + Duration::seconds(1))
            .is_err());
    }

    #[test]
    fn test_nearest_to_empty_field_is_origin() {
        let catalog = DebrisCatalog::from_records(Vec::new());
        let epoch = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let nearest = catalog.nearest_to(&Vector3::new(1.0, 2.0, 3.0), epoch, 0.0);
        assert_eq!(nearest, Vector3::zeros());
    }
}
