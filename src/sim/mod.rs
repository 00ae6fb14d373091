//! Fixed-step trajectory simulation.
//!
//! Two modes drive the plot pages: free propagation (relative-frame and
//! inertial lock-step) and estimation tracking. Every loop is bounded by
//! an index count derived from the window length and the fixed step, so a
//! positive step size guarantees termination, and timestamps are computed
//! from the window start rather than accumulated.

use nalgebra::Vector3;

use crate::astro::{
    Epoch, EciState, HillPropagator, HillState, Spacecraft, SECONDS_IN_DAY,
};
use crate::error::{Error, Result};

/// Simulation configuration shared by every run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Fixed propagation step (seconds).
    pub step_seconds: f64,
    /// Half-width of the relative and estimation windows (days).
    pub half_window_days: f64,
    /// Length of the inertial window (days).
    pub inertial_window_days: f64,
    /// Perturbation added to each inertial position component of the
    /// estimator seed (km).
    pub seed_offset_km: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            step_seconds: 600.0,
            half_window_days: 0.5,
            inertial_window_days: 1.0,
            seed_offset_km: 0.5,
        }
    }
}

impl SimConfig {
    fn checked_step(&self) -> Result<f64> {
        if !(self.step_seconds > 0.0) || !self.step_seconds.is_finite() {
            return Err(Error::InvalidStepSize(self.step_seconds));
        }
        Ok(self.step_seconds)
    }
}

/// One point of a sampled trajectory.
#[derive(Debug, Clone)]
pub struct TrajectorySample {
    pub epoch: Epoch,
    pub position: Vector3<f64>,
    pub velocity: Option<Vector3<f64>>,
}

/// Two trajectories sampled in lock-step: timestamps match index-for-index.
#[derive(Debug, Clone)]
pub struct TrajectoryPair {
    pub target: Vec<TrajectorySample>,
    pub chase: Vec<TrajectorySample>,
}

/// Truth and observed relative-position series from an estimation run.
#[derive(Debug, Clone)]
pub struct EstimationRun {
    pub truth: Vec<TrajectorySample>,
    pub observed: Vec<TrajectorySample>,
}

/// Free propagation of a relative state over `[epoch - h, epoch + h]` days
/// about a reference orbit of semi-major axis `sma`.
///
/// Samples the window start, then one sample per step; the sample count is
/// `round(window / dt) + 1`.
pub fn propagate_relative(
    relative: &HillState,
    sma: f64,
    epoch: Epoch,
    config: &SimConfig,
) -> Result<Vec<TrajectorySample>> {
    let dt = config.checked_step()?;
    let half_seconds = config.half_window_days * SECONDS_IN_DAY;
    let steps = (2.0 * half_seconds / dt).round() as usize;

    let mut prop = HillPropagator::new(*relative, sma)?;
    prop.step_by_seconds(-half_seconds);
    let start = epoch.plus_seconds(-half_seconds);

    let mut samples = Vec::with_capacity(steps + 1);
    samples.push(TrajectorySample {
        epoch: start,
        position: prop.state().position,
        velocity: Some(prop.state().velocity),
    });
    for i in 1..=steps {
        prop.step_by_seconds(dt);
        samples.push(TrajectorySample {
            epoch: start.plus_seconds(i as f64 * dt),
            position: prop.state().position,
            velocity: Some(prop.state().velocity),
        });
    }
    Ok(samples)
}

/// Free propagation of target and chase over `[epoch, epoch + window]`
/// days, advanced in lock-step so their timestamps always match.
pub fn propagate_pair(
    target: &EciState,
    chase: &EciState,
    config: &SimConfig,
) -> Result<TrajectoryPair> {
    let dt = config.checked_step()?;
    let window_seconds = config.inertial_window_days * SECONDS_IN_DAY;
    let steps = (window_seconds / dt).round() as usize;

    let mut tgt = Spacecraft::new(*target, dt)?;
    let mut chs = Spacecraft::new(*chase, dt)?;
    let start = target.epoch;

    let mut pair = TrajectoryPair {
        target: Vec::with_capacity(steps + 1),
        chase: Vec::with_capacity(steps + 1),
    };
    record_pair(&mut pair, &tgt, &chs, start);
    for i in 1..=steps {
        tgt.step();
        chs.step();
        record_pair(&mut pair, &tgt, &chs, start.plus_seconds(i as f64 * dt));
    }
    Ok(pair)
}

fn record_pair(pair: &mut TrajectoryPair, tgt: &Spacecraft, chs: &Spacecraft, epoch: Epoch) {
    pair.target.push(TrajectorySample {
        epoch,
        position: tgt.position(),
        velocity: Some(tgt.velocity()),
    });
    pair.chase.push(TrajectorySample {
        epoch,
        position: chs.position(),
        velocity: Some(chs.velocity()),
    });
}

/// Estimation tracking over `[epoch - h, epoch + h]` days.
///
/// Truth target and chase are rolled back to the window start, the chase
/// estimator is acquired from a deliberately perturbed seed, and the run
/// then steps forward feeding one observation per step. Records the truth
/// relative position (target in the chase Hill frame) and the negated
/// estimator-internal relative position. Any contract error aborts the run
/// and discards the samples collected so far.
pub fn track_estimation(
    target: &EciState,
    chase: &EciState,
    config: &SimConfig,
) -> Result<EstimationRun> {
    let dt = config.checked_step()?;
    let epoch = target.epoch;
    let half_seconds = config.half_window_days * SECONDS_IN_DAY;
    let steps = (2.0 * half_seconds / dt).round() as usize;
    let start = epoch.plus_seconds(-half_seconds);

    let mut tgt = Spacecraft::new(*target, dt)?;
    let mut chs = Spacecraft::new(*chase, dt)?;
    tgt.step_to_epoch(start);
    chs.step_to_epoch(start);

    let offset = Vector3::repeat(config.seed_offset_km);
    let mut seed = Spacecraft::new(
        EciState::new(target.position + offset, target.velocity, epoch),
        dt,
    )?;
    seed.step_to_epoch(start);
    chs.acquire(&seed)?;

    let mut run = EstimationRun {
        truth: Vec::with_capacity(steps),
        observed: Vec::with_capacity(steps),
    };
    for i in 1..=steps {
        tgt.step();
        chs.step();
        chs.process_wfov(&tgt)?;

        let estimated = chs.estimated_relative().ok_or(Error::EstimatorNotAcquired)?;
        let stamp = start.plus_seconds(i as f64 * dt);
        run.truth.push(TrajectorySample {
            epoch: stamp,
            position: tgt.hill_position(&chs),
            velocity: None,
        });
        run.observed.push(TrajectorySample {
            epoch: stamp,
            position: -estimated.position,
            velocity: None,
        });
    }
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astro::hill_to_eci;
    use nalgebra::Vector6;

    fn geo_target() -> EciState {
        let epoch = Epoch::from_gregorian(2023, 1, 26, 12, 30, 0.0).unwrap();
        EciState::new(
            Vector3::new(42_164.0, 0.0, 0.0),
            Vector3::new(0.0, 3.074, 0.0),
            epoch,
        )
    }

    fn demo_relative() -> HillState {
        HillState::from_vector(Vector6::new(-5.0, 0.0, 0.0, 0.0, 0.0, 0.001))
    }

    #[test]
    fn test_relative_sample_count() {
        let config = SimConfig::default();
        let target = geo_target();
        let samples =
            propagate_relative(&demo_relative(), 42_164.0, target.epoch, &config).unwrap();
        let expected = (SECONDS_IN_DAY / config.step_seconds).round() as usize + 1;
        assert_eq!(samples.len(), expected);
    }

    #[test]
    fn test_relative_window_bounds_and_monotonicity() {
        let config = SimConfig::default();
        let target = geo_target();
        let samples =
            propagate_relative(&demo_relative(), 42_164.0, target.epoch, &config).unwrap();
        let start = target.epoch.plus_days(-0.5);
        let end = target.epoch.plus_days(0.5);
        assert!(samples[0].epoch.seconds_since(&start).abs() < 1e-6);
        assert!(samples.last().unwrap().epoch.seconds_since(&end).abs() < 1e-6);
        for pair in samples.windows(2) {
            assert!(pair[1].epoch > pair[0].epoch);
        }
    }

    #[test]
    fn test_relative_rejects_bad_step() {
        let config = SimConfig {
            step_seconds: 0.0,
            ..SimConfig::default()
        };
        let target = geo_target();
        assert!(propagate_relative(&demo_relative(), 42_164.0, target.epoch, &config).is_err());
    }

    #[test]
    fn test_pair_timestamps_match() {
        let config = SimConfig::default();
        let target = geo_target();
        let chase = hill_to_eci(&demo_relative(), &target);
        let pair = propagate_pair(&target, &chase, &config).unwrap();
        assert_eq!(pair.target.len(), pair.chase.len());
        for (t, c) in pair.target.iter().zip(&pair.chase) {
            assert!(t.epoch.seconds_since(&c.epoch).abs() < 1e-9);
        }
        let expected = (SECONDS_IN_DAY / config.step_seconds).round() as usize + 1;
        assert_eq!(pair.target.len(), expected);
    }

    #[test]
    fn test_estimation_series_aligned() {
        let config = SimConfig::default();
        let target = geo_target();
        let chase = hill_to_eci(&demo_relative(), &target);
        let run = track_estimation(&target, &chase, &config).unwrap();
        assert_eq!(run.truth.len(), run.observed.len());
        assert!(!run.truth.is_empty());
        for (t, o) in run.truth.iter().zip(&run.observed) {
            assert!(t.epoch.seconds_since(&o.epoch).abs() < 1e-9);
        }
    }

    #[test]
    fn test_estimation_converges_below_seed_offset() {
        let config = SimConfig::default();
        let target = geo_target();
        let chase = hill_to_eci(&demo_relative(), &target);
        let run = track_estimation(&target, &chase, &config).unwrap();
        // The seed is off by 0.5 km per axis; after the observation updates
        // the pointwise divergence must sit well below that.
        let last = (run.truth.last().unwrap().position
            - run.observed.last().unwrap().position)
            .norm();
        assert!(last < 0.1, "divergence {last} km");
    }
}
