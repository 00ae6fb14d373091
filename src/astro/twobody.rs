//! Fixed-step two-body propagation.
//!
//! Classic RK4 over point-mass gravity. A negative step size propagates
//! backward, which the estimation setup relies on.

use nalgebra::Vector3;

use super::frames::{EciState, MU_EARTH};

/// Point-mass gravitational acceleration (km/s^2).
fn gravity(position: &Vector3<f64>) -> Vector3<f64> {
    let r = position.norm();
    -MU_EARTH / (r * r * r) * position
}

/// Advance `state` by `dt` seconds with a single RK4 step.
pub fn rk4_step(state: &EciState, dt: f64) -> EciState {
    let v1 = state.velocity;
    let a1 = gravity(&state.position);

    let p2 = state.position + v1 * (dt / 2.0);
    let v2 = state.velocity + a1 * (dt / 2.0);
    let a2 = gravity(&p2);

    let p3 = state.position + v2 * (dt / 2.0);
    let v3 = state.velocity + a2 * (dt / 2.0);
    let a3 = gravity(&p3);

    let p4 = state.position + v3 * dt;
    let v4 = state.velocity + a3 * dt;
    let a4 = gravity(&p4);

    EciState::new(
        state.position + (v1 + 2.0 * v2 + 2.0 * v3 + v4) * (dt / 6.0),
        state.velocity + (a1 + 2.0 * a2 + 2.0 * a3 + a4) * (dt / 6.0),
        state.epoch.plus_seconds(dt),
    )
}
