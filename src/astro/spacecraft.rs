//! Stateful propagating vehicles.
//!
//! A `Spacecraft` advances its inertial state by a fixed intrinsic step
//! and can carry a relative-state estimator: `acquire` seeds it from a
//! guess object, `process_wfov` feeds it one wide-field-of-view
//! observation of a truth object per step.

use nalgebra::Vector3;

use super::epoch::Epoch;
use super::filter::RelativeFilter;
use super::frames::{eci_to_hill, EciState, HillState};
use super::twobody;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Spacecraft {
    state: EciState,
    step_seconds: f64,
    filter: Option<RelativeFilter>,
}

impl Spacecraft {
    pub fn new(state: EciState, step_seconds: f64) -> Result<Self> {
        if !(step_seconds > 0.0) {
            return Err(Error::InvalidStepSize(step_seconds));
        }
        Ok(Self {
            state,
            step_seconds,
            filter: None,
        })
    }

    pub fn current_state(&self) -> &EciState {
        &self.state
    }

    pub fn current_epoch(&self) -> Epoch {
        self.state.epoch
    }

    pub fn position(&self) -> Vector3<f64> {
        self.state.position
    }

    pub fn velocity(&self) -> Vector3<f64> {
        self.state.velocity
    }

    /// Advance by one intrinsic step.
    pub fn step(&mut self) {
        self.advance(self.step_seconds);
    }

    /// Advance by `seconds`, negative values stepping backward. The total
    /// is split into intrinsic-step pieces plus one remainder piece so the
    /// integration error stays bounded by the configured step size.
    pub fn step_by_seconds(&mut self, seconds: f64) {
        let direction = if seconds < 0.0 { -1.0 } else { 1.0 };
        let mut remaining = seconds.abs();
        while remaining > 0.0 {
            let piece = remaining.min(self.step_seconds);
            self.advance(piece * direction);
            remaining -= piece;
        }
    }

    /// Advance (or rewind) to an absolute epoch.
    pub fn step_to_epoch(&mut self, target: Epoch) {
        let delta = target.seconds_since(&self.state.epoch);
        self.step_by_seconds(delta);
    }

    fn advance(&mut self, dt: f64) {
        self.state = twobody::rk4_step(&self.state, dt);
        if let Some(filter) = &mut self.filter {
            filter.predict(dt);
        }
    }

    /// Position of `self` in `observer`'s Hill frame.
    pub fn hill_position(&self, observer: &Spacecraft) -> Vector3<f64> {
        eci_to_hill(&self.state, observer.current_state()).position
    }

    /// Seed the onboard estimator from a guess object.
    pub fn acquire(&mut self, seed: &Spacecraft) -> Result<()> {
        self.filter = Some(RelativeFilter::acquire(&self.state, seed.current_state())?);
        Ok(())
    }

    /// Feed the estimator one observation of the truth object.
    pub fn process_wfov(&mut self, truth: &Spacecraft) -> Result<()> {
        let observed = eci_to_hill(&self.state, truth.current_state());
        let filter = self.filter.as_mut().ok_or(Error::EstimatorNotAcquired)?;
        filter.update(&observed)
    }

    /// The estimator's internally propagated relative state, if acquired.
    pub fn estimated_relative(&self) -> Option<HillState> {
        self.filter.as_ref().map(|f| f.relative_state())
    }
}
