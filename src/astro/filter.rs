//! Relative-state estimation.
//!
//! A 6-state Kalman filter in the Hill frame of the estimated target: the
//! state is the host vehicle's position and velocity relative to the
//! target, predicted with the Clohessy-Wiltshire transition and corrected
//! with one position observation per simulation step. Note the sign
//! convention: the filter stores the host-relative-to-target state, so the
//! target as seen from the host is the negated filter state.

use nalgebra::{Matrix3, Matrix6, SMatrix, Vector3, Vector6};

use super::frames::{eci_to_hill, EciState, HillState};
use super::relative::{cw_transition, mean_motion};
use crate::error::{Error, Result};

/// Initial position variance per axis (km^2).
const INITIAL_POSITION_VAR: f64 = 1.0;
/// Initial velocity variance per axis ((km/s)^2).
const INITIAL_VELOCITY_VAR: f64 = 1.0e-6;
/// Process noise added to the covariance diagonal each prediction.
const PROCESS_NOISE: f64 = 1.0e-12;
/// Observation variance per axis (km^2).
const MEASUREMENT_VAR: f64 = 1.0e-6;

/// Sequential estimator of a host vehicle's state relative to a target.
#[derive(Debug, Clone)]
pub struct RelativeFilter {
    state: Vector6<f64>,
    covariance: Matrix6<f64>,
    n: f64,
}

impl RelativeFilter {
    /// Seed the filter from the host state and a guess of the target state.
    ///
    /// The guess also fixes the reference mean motion; a guess on a
    /// non-elliptical orbit is rejected.
    pub fn acquire(host: &EciState, guess: &EciState) -> Result<Self> {
        let sma = guess.semi_major_axis();
        if !(sma > 0.0) || !sma.is_finite() {
            return Err(Error::DegenerateOrbit { sma });
        }
        let relative = eci_to_hill(host, guess);
        let mut covariance = Matrix6::zeros();
        for i in 0..3 {
            covariance[(i, i)] = INITIAL_POSITION_VAR;
            covariance[(i + 3, i + 3)] = INITIAL_VELOCITY_VAR;
        }
        Ok(Self {
            state: relative.to_vector(),
            covariance,
            n: mean_motion(sma),
        })
    }

    /// Propagate the estimate by `dt` seconds.
    pub fn predict(&mut self, dt: f64) {
        let stm = cw_transition(self.n, dt);
        self.state = stm * self.state;
        self.covariance =
            stm * self.covariance * stm.transpose() + Matrix6::identity() * PROCESS_NOISE;
    }

    /// Fold in one position observation of the host relative to the truth
    /// target. Fails if the filter has diverged.
    pub fn update(&mut self, observed: &HillState) -> Result<()> {
        let mut h = SMatrix::<f64, 3, 6>::zeros();
        for i in 0..3 {
            h[(i, i)] = 1.0;
        }
        let r = Matrix3::identity() * MEASUREMENT_VAR;

        let innovation_cov = h * self.covariance * h.transpose() + r;
        let inverse = innovation_cov
            .try_inverse()
            .ok_or(Error::EstimatorDiverged)?;
        let gain = self.covariance * h.transpose() * inverse;

        let innovation = observed.position - Vector3::new(self.state[0], self.state[1], self.state[2]);
        self.state += gain * innovation;
        self.covariance = (Matrix6::identity() - gain * h) * self.covariance;

        if self.state.iter().any(|v| !v.is_finite()) {
            return Err(Error::EstimatorDiverged);
        }
        Ok(())
    }

    /// Internally propagated relative state (host relative to target).
    pub fn relative_state(&self) -> HillState {
        HillState::from_vector(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astro::epoch::Epoch;
    use crate::astro::frames::hill_to_eci;

    fn geo_target() -> EciState {
        let epoch = Epoch::from_gregorian(2023, 1, 26, 12, 30, 0.0).unwrap();
        EciState::new(
            Vector3::new(42_164.0, 0.0, 0.0),
            Vector3::new(0.0, 3.074, 0.0),
            epoch,
        )
    }

    #[test]
    fn test_acquire_recovers_relative_state() {
        let target = geo_target();
        let hill = HillState::new(Vector3::new(-5.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.001));
        let host = hill_to_eci(&hill, &target);
        let filter = RelativeFilter::acquire(&host, &target).unwrap();
        assert!((filter.relative_state().position - hill.position).norm() < 1e-9);
    }

    #[test]
    fn test_update_pulls_toward_observation() {
        let target = geo_target();
        let hill = HillState::new(Vector3::new(-5.0, 0.0, 0.0), Vector3::zeros());
        let host = hill_to_eci(&hill, &target);

        // Seed from a perturbed guess, then observe the true offset.
        let guess = EciState::new(
            target.position + Vector3::new(0.5, 0.5, 0.5),
            target.velocity,
            target.epoch,
        );
        let mut filter = RelativeFilter::acquire(&host, &guess).unwrap();
        let before = (filter.relative_state().position - hill.position).norm();

        filter.update(&eci_to_hill(&host, &target)).unwrap();
        let after = (filter.relative_state().position - hill.position).norm();
        assert!(after < before);
    }

    #[test]
    fn test_acquire_rejects_degenerate_guess() {
        let target = geo_target();
        let host = target;
        let guess = EciState::new(
            Vector3::new(42_164.0, 0.0, 0.0),
            Vector3::new(0.0, 30.0, 0.0), // hyperbolic
            target.epoch,
        );
        assert!(RelativeFilter::acquire(&host, &guess).is_err());
    }
}
