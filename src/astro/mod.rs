//! Astrodynamics service layer.
//!
//! Everything the orchestration pipeline needs from orbital mechanics:
//! epoch arithmetic, inertial and Hill-frame states, two-body and
//! Clohessy-Wiltshire propagation, and a relative-state estimator. The
//! rest of the crate consumes this module only through the types and
//! operations re-exported here.

pub mod epoch;
pub mod filter;
pub mod frames;
pub mod relative;
pub mod spacecraft;
pub mod twobody;

pub use epoch::{Epoch, SECONDS_IN_DAY};
pub use filter::RelativeFilter;
pub use frames::{eci_to_hill, hill_to_eci, semi_major_axis, EciState, HillState, MU_EARTH};
pub use relative::{cw_transition, mean_motion, HillPropagator};
pub use spacecraft::Spacecraft;
