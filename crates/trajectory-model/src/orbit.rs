//! Target orbit classes and altitude validation

use crate::{Result, TrajectoryError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Target orbit regime for an ascent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrbitClass {
    Leo,
    Meo,
    Geo,
    Heo,
}

impl OrbitClass {
    /// Valid target altitude range in km (inclusive). GEO is a fixed slot.
    pub fn altitude_range_km(&self) -> (f64, f64) {
        match self {
            OrbitClass::Leo => (200.0, 2_000.0),
            OrbitClass::Meo => (2_000.0, 35_786.0),
            OrbitClass::Geo => (35_786.0, 35_786.0),
            OrbitClass::Heo => (35_787.0, 50_000.0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OrbitClass::Leo => "Low Earth Orbit (LEO)",
            OrbitClass::Meo => "Medium Earth Orbit (MEO)",
            OrbitClass::Geo => "Geostationary Orbit (GEO)",
            OrbitClass::Heo => "High Earth Orbit (HEO)",
        }
    }

    /// Check a target altitude against this orbit's range
    pub fn validate_altitude_km(&self, altitude_km: f64) -> Result<()> {
        if !altitude_km.is_finite() {
            return Err(TrajectoryError::NonFinite("target_altitude_km"));
        }
        let (min_km, max_km) = self.altitude_range_km();
        if altitude_km < min_km || altitude_km > max_km {
            return Err(TrajectoryError::AltitudeOutsideOrbitRange {
                orbit: *self,
                altitude_km,
                min_km,
                max_km,
            });
        }
        Ok(())
    }
}

impl FromStr for OrbitClass {
    type Err = TrajectoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "leo" => Ok(OrbitClass::Leo),
            "meo" => Ok(OrbitClass::Meo),
            "geo" => Ok(OrbitClass::Geo),
            "heo" => Ok(OrbitClass::Heo),
            other => Err(TrajectoryError::UnknownOrbitClass(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_altitude_within_range() {
        assert!(OrbitClass::Leo.validate_altitude_km(500.0).is_ok());
        assert!(OrbitClass::Meo.validate_altitude_km(20_000.0).is_ok());
        assert!(OrbitClass::Geo.validate_altitude_km(35_786.0).is_ok());
    }

    #[test]
    fn test_altitude_outside_range() {
        assert!(OrbitClass::Leo.validate_altitude_km(5_000.0).is_err());
        assert!(OrbitClass::Geo.validate_altitude_km(36_000.0).is_err());
        assert!(OrbitClass::Heo.validate_altitude_km(f64::NAN).is_err());
    }

    #[test]
    fn test_parse_orbit_class() {
        assert_eq!("LEO".parse::<OrbitClass>().unwrap(), OrbitClass::Leo);
        assert_eq!("geo".parse::<OrbitClass>().unwrap(), OrbitClass::Geo);
        assert!("sso".parse::<OrbitClass>().is_err());
    }
}
