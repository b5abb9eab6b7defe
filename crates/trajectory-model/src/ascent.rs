//! Ascent profile construction and the perturbable trajectory model
//!
//! The burn phase is a constant-acceleration quadratic from the launch pad;
//! the coast phase continues with the burn-out velocity plus a constant
//! gravitational deceleration on the radial axis, and the radial axis holds
//! at the target radius once the climb completes. Position and velocity are
//! continuous at the burn cutover by construction.

use crate::curve::AxisCurve;
use crate::orbit::OrbitClass;
use crate::{Axis, FlightPath, Result, TrajectoryError, EARTH_RADIUS_M, G0, GM_EARTH};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Geodetic launch site
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LaunchSite {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl LaunchSite {
    /// Launch pad position in meters from Earth center
    pub fn position_m(&self) -> Vector3<f64> {
        let theta = self.latitude_deg.to_radians();
        let phi = self.longitude_deg.to_radians();
        let r0 = EARTH_RADIUS_M + self.altitude_m;
        Vector3::new(
            r0 * theta.cos() * phi.cos(),
            r0 * theta.cos() * phi.sin(),
            r0 * theta.sin(),
        )
    }
}

/// One rocket from the vehicle catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocketParams {
    pub rocket_type: String,
    pub launch_site_name: String,
    pub site: LaunchSite,
    pub thrust_n: f64,
    pub initial_mass_kg: f64,
    pub burn_time_s: f64,
    pub max_altitude_km: f64,
    pub orbit_classes: Vec<OrbitClass>,
}

impl RocketParams {
    /// Can this vehicle fly the requested mission?
    pub fn supports(&self, orbit: OrbitClass, altitude_km: f64) -> bool {
        self.max_altitude_km >= altitude_km && self.orbit_classes.contains(&orbit)
    }
}

/// Inputs to the ascent profile builder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AscentParams {
    pub site: LaunchSite,
    pub target_altitude_km: f64,
    pub thrust_n: f64,
    pub initial_mass_kg: f64,
    pub burn_time_s: f64,
    /// Pitch above the horizontal plane, degrees
    pub pitch_deg: f64,
}

impl AscentParams {
    pub fn from_rocket(rocket: &RocketParams, target_altitude_km: f64) -> Self {
        Self {
            site: rocket.site,
            target_altitude_km,
            thrust_n: rocket.thrust_n,
            initial_mass_kg: rocket.initial_mass_kg,
            burn_time_s: rocket.burn_time_s,
            pitch_deg: 45.0,
        }
    }

    fn validate(&self) -> Result<()> {
        let checks: [(&'static str, f64); 6] = [
            ("latitude_deg", self.site.latitude_deg),
            ("longitude_deg", self.site.longitude_deg),
            ("target_altitude_km", self.target_altitude_km),
            ("thrust_n", self.thrust_n),
            ("initial_mass_kg", self.initial_mass_kg),
            ("burn_time_s", self.burn_time_s),
        ];
        for (name, value) in checks {
            if !value.is_finite() {
                return Err(TrajectoryError::NonFinite(name));
            }
        }
        for (name, value) in [
            ("thrust_n", self.thrust_n),
            ("initial_mass_kg", self.initial_mass_kg),
            ("burn_time_s", self.burn_time_s),
            ("target_altitude_km", self.target_altitude_km),
        ] {
            if value <= 0.0 {
                return Err(TrajectoryError::InvalidParameter { name, value });
            }
        }
        if !self.pitch_deg.is_finite() || self.pitch_deg <= 0.0 || self.pitch_deg > 90.0 {
            return Err(TrajectoryError::InvalidParameter {
                name: "pitch_deg",
                value: self.pitch_deg,
            });
        }
        Ok(())
    }
}

/// Piecewise burn/coast trajectory, one curve per axis, position in meters.
///
/// Perturbation returns an independent copy; the receiver is never mutated,
/// so a search step can always roll back to the best-known trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryModel {
    x: AxisCurve,
    y: AxisCurve,
    z: AxisCurve,
    burn_time_s: f64,
    t_total_s: f64,
    orbital_velocity_mps: f64,
}

impl TrajectoryModel {
    /// Build the ascent profile for the given parameters.
    ///
    /// The climb completes when the radial axis reaches the target radius;
    /// the total duration is that climb time.
    pub fn plan(params: &AscentParams) -> Result<TrajectoryModel> {
        params.validate()?;

        let origin = params.site.position_m();
        let phi = params.site.longitude_deg.to_radians();
        let pitch = params.pitch_deg.to_radians();
        let burn_time = params.burn_time_s;

        let net_accel = params.thrust_n / params.initial_mass_kg - G0;
        if net_accel <= 0.0 {
            return Err(TrajectoryError::InsufficientThrust {
                thrust_n: params.thrust_n,
                mass_kg: params.initial_mass_kg,
            });
        }

        let accel = Vector3::new(
            net_accel * pitch.cos() * phi.cos(),
            net_accel * pitch.cos() * phi.sin(),
            net_accel * pitch.sin(),
        );
        let burn_out = origin + accel * (0.5 * burn_time * burn_time);
        let velocity = accel * burn_time;

        let r_target = EARTH_RADIUS_M + params.target_altitude_km * 1000.0;
        let orbital_velocity_mps = (GM_EARTH / r_target).sqrt();

        // Gravitational correction during coast: constant deceleration at the
        // target radius acting on the radial axis.
        let coast_gravity = GM_EARTH / (r_target * r_target);
        let climb_gap = r_target - burn_out.z;
        let coast_s = if climb_gap <= 0.0 {
            0.0
        } else {
            let disc = velocity.z * velocity.z - 2.0 * coast_gravity * climb_gap;
            if velocity.z <= 0.0 || disc < 0.0 {
                return Err(TrajectoryError::UnreachableAltitude(
                    params.target_altitude_km,
                ));
            }
            (velocity.z - disc.sqrt()) / coast_gravity
        };
        let t_total_s = burn_time + coast_s;

        let burn_axis = |origin: f64, accel: f64| AxisCurve::Quadratic {
            intercept: origin,
            slope: 0.0,
            accel,
        };

        let x = AxisCurve::Piecewise {
            cutover_s: burn_time,
            before: Box::new(burn_axis(origin.x, accel.x)),
            after: Box::new(AxisCurve::Linear {
                intercept: burn_out.x,
                slope: velocity.x,
            }),
        };
        let y = AxisCurve::Piecewise {
            cutover_s: burn_time,
            before: Box::new(burn_axis(origin.y, accel.y)),
            after: Box::new(AxisCurve::Linear {
                intercept: burn_out.y,
                slope: velocity.y,
            }),
        };
        // Radial axis: burn, gravity-corrected coast, then hold at target.
        let z_ascent = AxisCurve::Piecewise {
            cutover_s: burn_time,
            before: Box::new(burn_axis(origin.z, accel.z)),
            after: Box::new(AxisCurve::Quadratic {
                intercept: burn_out.z,
                slope: velocity.z,
                accel: -coast_gravity,
            }),
        };
        let z = AxisCurve::Piecewise {
            cutover_s: t_total_s,
            before: Box::new(z_ascent),
            after: Box::new(AxisCurve::Constant(r_target)),
        };

        debug!(
            burn_time_s = burn_time,
            t_total_s, orbital_velocity_mps, "planned ascent profile"
        );

        Ok(TrajectoryModel {
            x,
            y,
            z,
            burn_time_s: burn_time,
            t_total_s,
            orbital_velocity_mps,
        })
    }

    /// Assemble a model directly from per-axis curves.
    pub fn from_curves(
        x: AxisCurve,
        y: AxisCurve,
        z: AxisCurve,
        burn_time_s: f64,
        t_total_s: f64,
    ) -> TrajectoryModel {
        TrajectoryModel {
            x,
            y,
            z,
            burn_time_s,
            t_total_s,
            orbital_velocity_mps: 0.0,
        }
    }

    /// Position along one axis at elapsed seconds since launch
    pub fn evaluate(&self, axis: Axis, t_s: f64) -> f64 {
        self.curve(axis).eval(t_s)
    }

    pub fn curve(&self, axis: Axis) -> &AxisCurve {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    /// Independent copy with one axis's velocity-like coefficients scaled.
    pub fn perturb(&self, axis: Axis, scale_factor: f64) -> TrajectoryModel {
        let mut perturbed = self.clone();
        match axis {
            Axis::X => perturbed.x = self.x.scale_velocity(scale_factor),
            Axis::Y => perturbed.y = self.y.scale_velocity(scale_factor),
            Axis::Z => perturbed.z = self.z.scale_velocity(scale_factor),
        }
        perturbed
    }

    pub fn burn_time_s(&self) -> f64 {
        self.burn_time_s
    }

    pub fn t_total_s(&self) -> f64 {
        self.t_total_s
    }

    /// Circular orbit speed at the target radius, m/s (zero for synthetic
    /// models assembled from raw curves)
    pub fn orbital_velocity_mps(&self) -> f64 {
        self.orbital_velocity_mps
    }

    /// Rendered per-axis formulas for reporting
    pub fn formulas(&self) -> [String; 3] {
        [
            self.x.to_string(),
            self.y.to_string(),
            self.z.to_string(),
        ]
    }

    /// Polyline length of the flight path over its duration, in km
    pub fn path_length_km(&self, samples: usize) -> f64 {
        if samples < 2 || self.t_total_s <= 0.0 {
            return 0.0;
        }
        let dt = self.t_total_s / (samples - 1) as f64;
        let mut length_m = 0.0;
        let mut previous = self.position_at(0.0);
        for i in 1..samples {
            let current = self.position_at(dt * i as f64);
            length_m += (current - previous).norm();
            previous = current;
        }
        length_m / 1000.0
    }
}

impl FlightPath for TrajectoryModel {
    fn position_at(&self, t_s: f64) -> Vector3<f64> {
        Vector3::new(self.x.eval(t_s), self.y.eval(t_s), self.z.eval(t_s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cape_canaveral() -> LaunchSite {
        LaunchSite {
            latitude_deg: 28.5,
            longitude_deg: -80.5,
            altitude_m: 0.0,
        }
    }

    fn heavy_lifter() -> AscentParams {
        AscentParams {
            site: cape_canaveral(),
            target_altitude_km: 500.0,
            thrust_n: 3.7e6,
            initial_mass_kg: 17_000.0,
            burn_time_s: 214.0,
            pitch_deg: 45.0,
        }
    }

    #[test]
    fn test_plan_continuous_at_burn_cutover() {
        let model = TrajectoryModel::plan(&heavy_lifter()).unwrap();
        let burn_time = model.burn_time_s();
        let before = model.position_at(burn_time);
        let after = model.position_at(burn_time + 1e-9);
        assert!((before - after).norm() < 1e-2);
    }

    #[test]
    fn test_plan_reaches_target_radius() {
        let params = heavy_lifter();
        let model = TrajectoryModel::plan(&params).unwrap();
        let r_target = EARTH_RADIUS_M + params.target_altitude_km * 1000.0;
        let z_final = model.evaluate(Axis::Z, model.t_total_s());
        assert!((z_final - r_target).abs() < 1.0);
        // Holds at the target radius afterwards
        assert!((model.evaluate(Axis::Z, model.t_total_s() + 500.0) - r_target).abs() < 1e-6);
    }

    #[test]
    fn test_plan_starts_from_launch_pad() {
        let params = heavy_lifter();
        let model = TrajectoryModel::plan(&params).unwrap();
        let origin = params.site.position_m();
        assert!((model.position_at(0.0) - origin).norm() < 1e-6);
    }

    #[test]
    fn test_perturb_never_mutates_receiver() {
        let model = TrajectoryModel::plan(&heavy_lifter()).unwrap();
        let samples: Vec<Vector3<f64>> = (0..10)
            .map(|i| model.position_at(i as f64 * 20.0))
            .collect();

        let perturbed = model.perturb(Axis::X, 1.1);

        for (i, expected) in samples.iter().enumerate() {
            let again = model.position_at(i as f64 * 20.0);
            assert_eq!(again, *expected);
        }
        // And the copy actually differs on the scaled axis
        let t = model.burn_time_s() / 2.0;
        assert!(perturbed.evaluate(Axis::X, t) != model.evaluate(Axis::X, t));
        assert_eq!(perturbed.evaluate(Axis::Z, t), model.evaluate(Axis::Z, t));
    }

    #[test]
    fn test_insufficient_thrust_rejected() {
        let mut params = heavy_lifter();
        params.thrust_n = 1.0e5; // well under weight
        assert!(matches!(
            TrajectoryModel::plan(&params),
            Err(TrajectoryError::InsufficientThrust { .. })
        ));
    }

    #[test]
    fn test_non_finite_parameter_rejected() {
        let mut params = heavy_lifter();
        params.thrust_n = f64::NAN;
        assert!(matches!(
            TrajectoryModel::plan(&params),
            Err(TrajectoryError::NonFinite("thrust_n"))
        ));
    }

    #[test]
    fn test_unreachable_altitude_rejected() {
        let mut params = heavy_lifter();
        // Short burn leaves far too little coast velocity for 500 km
        params.burn_time_s = 5.0;
        assert!(matches!(
            TrajectoryModel::plan(&params),
            Err(TrajectoryError::UnreachableAltitude(_))
        ));
    }

    #[test]
    fn test_path_length_positive() {
        let model = TrajectoryModel::plan(&heavy_lifter()).unwrap();
        let length = model.path_length_km(1000);
        assert!(length > 0.0);
        // Never shorter than the straight line between endpoints
        let chord_km =
            (model.position_at(model.t_total_s()) - model.position_at(0.0)).norm() / 1000.0;
        assert!(length >= chord_km * 0.999);
    }
}
