//! Closed-form axis curves
//!
//! One axis of a trajectory is a small sum type of phase kinds, evaluated by
//! structural recursion. `Piecewise` evaluates its `after` arm in
//! time-since-cutover, so a segment whose `after` intercept equals
//! `before(cutover)` is continuous at the cutover by construction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position along one axis as a closed-form function of elapsed seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AxisCurve {
    /// Fixed position
    Constant(f64),
    /// `intercept + slope * t`
    Linear { intercept: f64, slope: f64 },
    /// `intercept + slope * t + 0.5 * accel * t^2`
    Quadratic {
        intercept: f64,
        slope: f64,
        accel: f64,
    },
    /// `before(t)` up to the cutover, then `after(t - cutover_s)`
    Piecewise {
        cutover_s: f64,
        before: Box<AxisCurve>,
        after: Box<AxisCurve>,
    },
}

impl AxisCurve {
    /// Position at elapsed time `t` seconds
    pub fn eval(&self, t: f64) -> f64 {
        match self {
            AxisCurve::Constant(value) => *value,
            AxisCurve::Linear { intercept, slope } => intercept + slope * t,
            AxisCurve::Quadratic {
                intercept,
                slope,
                accel,
            } => intercept + slope * t + 0.5 * accel * t * t,
            AxisCurve::Piecewise {
                cutover_s,
                before,
                after,
            } => {
                if t <= *cutover_s {
                    before.eval(t)
                } else {
                    after.eval(t - cutover_s)
                }
            }
        }
    }

    /// First derivative (velocity) at elapsed time `t` seconds
    pub fn velocity(&self, t: f64) -> f64 {
        match self {
            AxisCurve::Constant(_) => 0.0,
            AxisCurve::Linear { slope, .. } => *slope,
            AxisCurve::Quadratic { slope, accel, .. } => slope + accel * t,
            AxisCurve::Piecewise {
                cutover_s,
                before,
                after,
            } => {
                if t <= *cutover_s {
                    before.velocity(t)
                } else {
                    after.velocity(t - cutover_s)
                }
            }
        }
    }

    /// Copy of this curve with every velocity-like coefficient scaled.
    ///
    /// Piecewise arms are re-anchored so the curve stays continuous at each
    /// cutover after scaling. The receiver is untouched.
    pub fn scale_velocity(&self, factor: f64) -> AxisCurve {
        match self {
            AxisCurve::Constant(value) => AxisCurve::Constant(*value),
            AxisCurve::Linear { intercept, slope } => AxisCurve::Linear {
                intercept: *intercept,
                slope: slope * factor,
            },
            AxisCurve::Quadratic {
                intercept,
                slope,
                accel,
            } => AxisCurve::Quadratic {
                intercept: *intercept,
                slope: slope * factor,
                accel: accel * factor,
            },
            AxisCurve::Piecewise {
                cutover_s,
                before,
                after,
            } => {
                let scaled_before = before.scale_velocity(factor);
                let scaled_after = after
                    .scale_velocity(factor)
                    .with_intercept(scaled_before.eval(*cutover_s));
                AxisCurve::Piecewise {
                    cutover_s: *cutover_s,
                    before: Box::new(scaled_before),
                    after: Box::new(scaled_after),
                }
            }
        }
    }

    /// Copy of this curve with its leading intercept replaced.
    fn with_intercept(self, new_intercept: f64) -> AxisCurve {
        match self {
            AxisCurve::Constant(_) => AxisCurve::Constant(new_intercept),
            AxisCurve::Linear { slope, .. } => AxisCurve::Linear {
                intercept: new_intercept,
                slope,
            },
            AxisCurve::Quadratic { slope, accel, .. } => AxisCurve::Quadratic {
                intercept: new_intercept,
                slope,
                accel,
            },
            AxisCurve::Piecewise {
                cutover_s,
                before,
                after,
            } => {
                let before = before.with_intercept(new_intercept);
                let after = after.with_intercept(before.eval(cutover_s));
                AxisCurve::Piecewise {
                    cutover_s,
                    before: Box::new(before),
                    after: Box::new(after),
                }
            }
        }
    }
}

impl fmt::Display for AxisCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisCurve::Constant(value) => write!(f, "{value:.2}"),
            AxisCurve::Linear { intercept, slope } => {
                write!(f, "{intercept:.2} + {slope:.2}*t")
            }
            AxisCurve::Quadratic {
                intercept,
                slope,
                accel,
            } => {
                if *slope == 0.0 {
                    write!(f, "{intercept:.2} + {:.2}*t^2", 0.5 * accel)
                } else {
                    write!(f, "{intercept:.2} + {slope:.2}*t + {:.2}*t^2", 0.5 * accel)
                }
            }
            AxisCurve::Piecewise {
                cutover_s,
                before,
                after,
            } => {
                write!(f, "{before} if t <= {cutover_s:.2}s else {after} at t-{cutover_s:.2}s")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burn_coast() -> AxisCurve {
        // Quadratic burn for 10 s at 2 m/s^2, then linear coast at 20 m/s
        AxisCurve::Piecewise {
            cutover_s: 10.0,
            before: Box::new(AxisCurve::Quadratic {
                intercept: 100.0,
                slope: 0.0,
                accel: 2.0,
            }),
            after: Box::new(AxisCurve::Linear {
                intercept: 200.0,
                slope: 20.0,
            }),
        }
    }

    #[test]
    fn test_quadratic_eval() {
        let curve = AxisCurve::Quadratic {
            intercept: 1.0,
            slope: 2.0,
            accel: 4.0,
        };
        assert_eq!(curve.eval(0.0), 1.0);
        assert_eq!(curve.eval(3.0), 1.0 + 6.0 + 18.0);
        assert_eq!(curve.velocity(3.0), 2.0 + 12.0);
    }

    #[test]
    fn test_piecewise_continuous_at_cutover() {
        let curve = burn_coast();
        let before = curve.eval(10.0);
        let after = curve.eval(10.0 + 1e-9);
        assert!((before - after).abs() < 1e-3);
        // Velocity also matches across the boundary
        assert!((curve.velocity(10.0) - 20.0).abs() < 1e-9);
        assert!((curve.velocity(10.1) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_scale_velocity_preserves_continuity() {
        let scaled = burn_coast().scale_velocity(1.1);
        let at_cutover = scaled.eval(10.0);
        let just_after = scaled.eval(10.0 + 1e-9);
        assert!((at_cutover - just_after).abs() < 1e-3);
        // Burn-phase velocity scaled: 2.0 * 1.1 m/s^2 for 10 s => 22 m/s
        assert!((scaled.velocity(10.0) - 22.0).abs() < 1e-9);
        // Coast slope scaled too
        assert!((scaled.velocity(15.0) - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_scale_velocity_leaves_receiver_unchanged() {
        let original = burn_coast();
        let snapshot = original.clone();
        let _scaled = original.scale_velocity(0.9);
        assert_eq!(original, snapshot);
    }

    #[test]
    fn test_hold_after_climb() {
        // Nested piecewise: ascent then hold at 500.0
        let curve = AxisCurve::Piecewise {
            cutover_s: 20.0,
            before: Box::new(burn_coast()),
            after: Box::new(AxisCurve::Constant(500.0)),
        };
        assert_eq!(curve.eval(25.0), 500.0);
        assert_eq!(curve.eval(1000.0), 500.0);
    }

    #[test]
    fn test_display_renders_formula() {
        let formula = format!(
            "{}",
            AxisCurve::Linear {
                intercept: -39.26,
                slope: 5649.37
            }
        );
        assert_eq!(formula, "-39.26 + 5649.37*t");
    }
}
