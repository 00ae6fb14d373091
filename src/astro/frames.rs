//! Inertial and Hill-frame state representations.
//!
//! Positions and velocities are in kilometers and kilometers per second.
//! The Hill (RIC) frame is centered on a reference vehicle with axes
//! radial, in-track, cross-track.

use nalgebra::{Matrix3, Vector3, Vector6};

use super::epoch::Epoch;

/// Earth's gravitational parameter (km^3/s^2).
pub const MU_EARTH: f64 = 398_600.4418;

/// Position/velocity in the Earth-centered inertial frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EciState {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub epoch: Epoch,
}

impl EciState {
    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>, epoch: Epoch) -> Self {
        Self {
            position,
            velocity,
            epoch,
        }
    }

    /// Semi-major axis of the osculating orbit (km, negative if hyperbolic).
    pub fn semi_major_axis(&self) -> f64 {
        semi_major_axis(MU_EARTH, self.position.norm(), self.velocity.norm())
    }
}

/// Relative state expressed in a reference vehicle's Hill frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HillState {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

impl HillState {
    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Self { position, velocity }
    }

    /// Build from a packed `[x, y, z, vx, vy, vz]` vector.
    pub fn from_vector(v: Vector6<f64>) -> Self {
        Self {
            position: Vector3::new(v[0], v[1], v[2]),
            velocity: Vector3::new(v[3], v[4], v[5]),
        }
    }

    /// Pack into `[x, y, z, vx, vy, vz]`.
    pub fn to_vector(&self) -> Vector6<f64> {
        Vector6::new(
            self.position.x,
            self.position.y,
            self.position.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z,
        )
    }
}

/// Semi-major axis from the vis-viva equation.
pub fn semi_major_axis(mu: f64, r: f64, v: f64) -> f64 {
    1.0 / (2.0 / r - v * v / mu)
}

/// Rotation taking inertial coordinates into `reference`'s Hill frame.
fn hill_rotation(reference: &EciState) -> Matrix3<f64> {
    let radial = reference.position.normalize();
    let cross_track = reference.position.cross(&reference.velocity).normalize();
    let in_track = cross_track.cross(&radial);
    Matrix3::from_rows(&[
        radial.transpose(),
        in_track.transpose(),
        cross_track.transpose(),
    ])
}

/// Angular rate of the Hill frame about its cross-track axis (rad/s).
fn hill_rate(reference: &EciState) -> f64 {
    reference.position.cross(&reference.velocity).norm() / reference.position.norm_squared()
}

/// Express `state` relative to `reference` in the reference Hill frame.
pub fn eci_to_hill(state: &EciState, reference: &EciState) -> HillState {
    let rot = hill_rotation(reference);
    let rel_pos = rot * (state.position - reference.position);
    let omega = Vector3::new(0.0, 0.0, hill_rate(reference));
    let rel_vel = rot * (state.velocity - reference.velocity) - omega.cross(&rel_pos);
    HillState::new(rel_pos, rel_vel)
}

/// Rebuild an inertial state from a Hill-frame offset about `reference`.
///
/// The result carries the reference epoch; a zero offset returns the
/// reference state itself.
pub fn hill_to_eci(hill: &HillState, reference: &EciState) -> EciState {
    let rot = hill_rotation(reference);
    let inverse = rot.transpose();
    let omega = Vector3::new(0.0, 0.0, hill_rate(reference));
    let position = reference.position + inverse * hill.position;
    let velocity = reference.velocity + inverse * (hill.velocity + omega.cross(&hill.position));
    EciState::new(position, velocity, reference.epoch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo_reference() -> EciState {
        let epoch = Epoch::from_gregorian(2023, 1, 26, 12, 30, 0.0).unwrap();
        EciState::new(
            Vector3::new(42_164.0, 0.0, 0.0),
            Vector3::new(0.0, 3.074, 0.0),
            epoch,
        )
    }

    #[test]
    fn test_zero_offset_is_identity() {
        let reference = geo_reference();
        let chase = hill_to_eci(&HillState::from_vector(Vector6::zeros()), &reference);
        assert!((chase.position - reference.position).norm() < 1e-9);
        assert!((chase.velocity - reference.velocity).norm() < 1e-12);
    }

    #[test]
    fn test_hill_roundtrip() {
        let reference = geo_reference();
        let hill = HillState::new(
            Vector3::new(-5.0, 2.0, 1.0),
            Vector3::new(0.0005, -0.0002, 0.001),
        );
        let chase = hill_to_eci(&hill, &reference);
        let back = eci_to_hill(&chase, &reference);
        assert!((back.position - hill.position).norm() < 1e-9);
        assert!((back.velocity - hill.velocity).norm() < 1e-12);
    }

    #[test]
    fn test_radial_offset_changes_radius() {
        let reference = geo_reference();
        let hill = HillState::new(Vector3::new(-5.0, 0.0, 0.0), Vector3::zeros());
        let chase = hill_to_eci(&hill, &reference);
        assert!((chase.position.norm() - (42_164.0 - 5.0)).abs() < 1e-6);
    }

    #[test]
    fn test_semi_major_axis_geo() {
        let reference = geo_reference();
        let sma = reference.semi_major_axis();
        assert!((sma - 42_164.0).abs() < 50.0);
    }
}
