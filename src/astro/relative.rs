//! Closed-form Clohessy-Wiltshire relative motion.
//!
//! Linearized motion of a chase vehicle about a circular reference orbit,
//! expressed in the Hill frame. The transition matrix is shared between
//! the relative propagator and the estimator's prediction step.

use nalgebra::Matrix6;

use super::frames::{HillState, MU_EARTH};
use crate::error::{Error, Result};

/// Mean motion of a circular orbit with semi-major axis `sma` km (rad/s).
pub fn mean_motion(sma: f64) -> f64 {
    (MU_EARTH / sma.powi(3)).sqrt()
}

/// Clohessy-Wiltshire state transition matrix over `dt` seconds.
///
/// State ordering is `[x, y, z, vx, vy, vz]` with x radial, y in-track,
/// z cross-track.
pub fn cw_transition(n: f64, dt: f64) -> Matrix6<f64> {
    let nt = n * dt;
    let (s, c) = nt.sin_cos();
    let mut m = Matrix6::zeros();

    m[(0, 0)] = 4.0 - 3.0 * c;
    m[(0, 3)] = s / n;
    m[(0, 4)] = 2.0 * (1.0 - c) / n;

    m[(1, 0)] = 6.0 * (s - nt);
    m[(1, 1)] = 1.0;
    m[(1, 3)] = 2.0 * (c - 1.0) / n;
    m[(1, 4)] = (4.0 * s - 3.0 * nt) / n;

    m[(2, 2)] = c;
    m[(2, 5)] = s / n;

    m[(3, 0)] = 3.0 * n * s;
    m[(3, 3)] = c;
    m[(3, 4)] = 2.0 * s;

    m[(4, 0)] = 6.0 * n * (c - 1.0);
    m[(4, 3)] = -2.0 * s;
    m[(4, 4)] = 4.0 * c - 3.0;

    m[(5, 2)] = -n * s;
    m[(5, 5)] = c;

    m
}

/// Closed-form relative-motion propagator about a circular reference orbit.
#[derive(Debug, Clone)]
pub struct HillPropagator {
    state: HillState,
    n: f64,
}

impl HillPropagator {
    /// Rejects non-physical reference orbits (sma must be positive).
    pub fn new(state: HillState, sma: f64) -> Result<Self> {
        if !(sma > 0.0) || !sma.is_finite() {
            return Err(Error::DegenerateOrbit { sma });
        }
        Ok(Self {
            state,
            n: mean_motion(sma),
        })
    }

    pub fn state(&self) -> &HillState {
        &self.state
    }

    /// Advance by `seconds` (negative rewinds); exact for any step size.
    pub fn step_by_seconds(&mut self, seconds: f64) {
        let v = cw_transition(self.n, seconds) * self.state.to_vector();
        self.state = HillState::from_vector(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Vector3, Vector6};
    use std::f64::consts::TAU;

    const GEO_SMA: f64 = 42_164.0;

    #[test]
    fn test_zero_state_stays_zero() {
        let mut prop = HillPropagator::new(HillState::from_vector(Vector6::zeros()), GEO_SMA).unwrap();
        prop.step_by_seconds(3600.0);
        assert!(prop.state().position.norm() < 1e-12);
        assert!(prop.state().velocity.norm() < 1e-12);
    }

    #[test]
    fn test_one_period_returns_to_start() {
        let start = HillState::new(Vector3::new(-5.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.001));
        let mut prop = HillPropagator::new(start, GEO_SMA).unwrap();
        let period = TAU / mean_motion(GEO_SMA);
        prop.step_by_seconds(period);
        assert!((prop.state().position - start.position).norm() < 1e-6);
        assert!((prop.state().velocity - start.velocity).norm() < 1e-9);
    }

    #[test]
    fn test_forward_backward_roundtrip() {
        let start = HillState::new(Vector3::new(-5.0, 3.0, 1.0), Vector3::new(0.0002, 0.0, 0.001));
        let mut prop = HillPropagator::new(start, GEO_SMA).unwrap();
        prop.step_by_seconds(43_200.0);
        prop.step_by_seconds(-43_200.0);
        assert!((prop.state().position - start.position).norm() < 1e-9);
    }

    #[test]
    fn test_degenerate_sma_rejected() {
        let state = HillState::from_vector(Vector6::zeros());
        assert!(HillPropagator::new(state, 0.0).is_err());
        assert!(HillPropagator::new(state, -7000.0).is_err());
        assert!(HillPropagator::new(state, f64::NAN).is_err());
    }

    #[test]
    fn test_transition_at_zero_dt_is_identity() {
        let m = cw_transition(mean_motion(GEO_SMA), 0.0);
        assert!((m - Matrix6::identity()).norm() < 1e-12);
    }
}
