//! Vehicle catalog loading from JSON

use crate::{PlannerError, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};
use trajectory_model::{LaunchSite, OrbitClass, RocketParams};

/// Raw catalog entry as stored on disk
#[derive(Debug, Deserialize)]
struct RawRocket {
    rocket_type: Option<String>,
    launch_site: Option<String>,
    latitude_deg: Option<f64>,
    longitude_deg: Option<f64>,
    altitude_m: Option<f64>,
    thrust_n: Option<f64>,
    initial_mass_kg: Option<f64>,
    burn_time_s: Option<f64>,
    max_altitude_km: Option<f64>,
    orbit_classes: Option<Vec<String>>,
}

impl RawRocket {
    fn into_params(self) -> Option<RocketParams> {
        let rocket_type = self.rocket_type?;
        let numbers = [
            self.latitude_deg?,
            self.longitude_deg?,
            self.thrust_n?,
            self.initial_mass_kg?,
            self.burn_time_s?,
            self.max_altitude_km?,
        ];
        if numbers.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let orbit_classes: Vec<OrbitClass> = self
            .orbit_classes?
            .iter()
            .filter_map(|name| name.parse().ok())
            .collect();
        if orbit_classes.is_empty() {
            return None;
        }
        Some(RocketParams {
            rocket_type,
            launch_site_name: self.launch_site.unwrap_or_else(|| "unknown".to_string()),
            site: LaunchSite {
                latitude_deg: numbers[0],
                longitude_deg: numbers[1],
                altitude_m: self.altitude_m.unwrap_or(0.0),
            },
            thrust_n: numbers[2],
            initial_mass_kg: numbers[3],
            burn_time_s: numbers[4],
            max_altitude_km: numbers[5],
            orbit_classes,
        })
    }
}

/// Available launch vehicles
#[derive(Debug)]
pub struct RocketCatalog {
    rockets: Vec<RocketParams>,
}

impl RocketCatalog {
    pub fn from_rockets(rockets: Vec<RocketParams>) -> Self {
        Self { rockets }
    }

    /// Load a catalog file, skipping malformed entries.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let raw: Vec<RawRocket> = serde_json::from_reader(reader)?;
        let total = raw.len();

        let rockets: Vec<RocketParams> = raw
            .into_iter()
            .filter_map(|entry| {
                let parsed = entry.into_params();
                if parsed.is_none() {
                    warn!("skipping malformed vehicle catalog entry");
                }
                parsed
            })
            .collect();

        if rockets.is_empty() {
            return Err(PlannerError::EmptyCatalog(path.display().to_string()));
        }
        info!(
            loaded = rockets.len(),
            total, "loaded vehicle catalog"
        );
        Ok(Self { rockets })
    }

    pub fn rockets(&self) -> &[RocketParams] {
        &self.rockets
    }

    /// Vehicles able to fly the requested mission
    pub fn candidates(&self, orbit: OrbitClass, altitude_km: f64) -> Vec<&RocketParams> {
        self.rockets
            .iter()
            .filter(|rocket| rocket.supports(orbit, altitude_km))
            .collect()
    }

    /// Pick a vehicle by name, or the first one able to fly the mission.
    pub fn select(
        &self,
        rocket_type: Option<&str>,
        orbit: OrbitClass,
        altitude_km: f64,
    ) -> Result<&RocketParams> {
        match rocket_type {
            Some(name) => self
                .rockets
                .iter()
                .find(|rocket| rocket.rocket_type.eq_ignore_ascii_case(name))
                .ok_or_else(|| PlannerError::UnknownRocket(name.to_string())),
            None => self
                .candidates(orbit, altitude_km)
                .into_iter()
                .next()
                .ok_or_else(|| PlannerError::NoSuitableRocket {
                    orbit: orbit.name().to_string(),
                    altitude_km,
                }),
        }
    }
}
