//! Concrete derivation nodes.
//!
//! The node set mirrors the dashboard pages: target assembly and chase
//! derivation feed the display cells, three trajectory nodes render the
//! relative, inertial and estimation plots, and the sensor node owns the
//! instrument figure.

use nalgebra::Vector6;

use crate::astro::{hill_to_eci, EciState, Epoch, HillState};
use crate::error::Result;
use crate::fov::{self, FovGeometry, InstrumentParams};
use crate::scene::{Annotation, OverlayImage, PlotId};
use crate::sim::{self, TrajectorySample};
use crate::store::{keys, CellKey};

use super::{DerivationNode, NodeCtx};

pub const REL_PLOT: PlotId = "rel-plot";
pub const ECI_PLOT: PlotId = "eci-plot";
pub const OD_PLOT: PlotId = "od-plot";
pub const SENSOR_PLOT: PlotId = "sensor-plot";

fn epoch_from_cells(ctx: &NodeCtx<'_>) -> Result<Epoch> {
    Epoch::from_gregorian(
        ctx.read(keys::YEAR)? as i32,
        ctx.read(keys::MONTH)? as u32,
        ctx.read(keys::DAY)? as u32,
        ctx.read(keys::HOUR)? as u32,
        ctx.read(keys::MINUTE)? as u32,
        ctx.read(keys::SECOND)?,
    )
}

fn relative_from_cells(ctx: &NodeCtx<'_>) -> Result<HillState> {
    Ok(HillState::from_vector(Vector6::new(
        ctx.read(keys::R_POS)?,
        ctx.read(keys::I_POS)?,
        ctx.read(keys::C_POS)?,
        ctx.read(keys::R_VEL)?,
        ctx.read(keys::I_VEL)?,
        ctx.read(keys::C_VEL)?,
    )))
}

fn sample_points(samples: &[TrajectorySample]) -> Vec<[f64; 3]> {
    samples
        .iter()
        .map(|s| [s.position.x, s.position.y, s.position.z])
        .collect()
}

/// Combines the epoch and target scalars into the inertial target state.
pub struct TargetStateNode;

const TARGET_NODE_INPUTS: [CellKey; 12] = [
    keys::YEAR,
    keys::MONTH,
    keys::DAY,
    keys::HOUR,
    keys::MINUTE,
    keys::SECOND,
    keys::TARGET_X,
    keys::TARGET_Y,
    keys::TARGET_Z,
    keys::TARGET_VX,
    keys::TARGET_VY,
    keys::TARGET_VZ,
];
const TARGET_NODE_OUTPUTS: [CellKey; 1] = [keys::TARGET_STATE];

impl DerivationNode for TargetStateNode {
    fn name(&self) -> &'static str {
        "target-state"
    }

    fn inputs(&self) -> &'static [CellKey] {
        &TARGET_NODE_INPUTS
    }

    fn outputs(&self) -> &'static [CellKey] {
        &TARGET_NODE_OUTPUTS
    }

    fn compute(&mut self, ctx: &mut NodeCtx<'_>) -> Result<()> {
        let epoch = epoch_from_cells(ctx)?;
        let state = EciState::new(
            nalgebra::Vector3::new(
                ctx.read(keys::TARGET_X)?,
                ctx.read(keys::TARGET_Y)?,
                ctx.read(keys::TARGET_Z)?,
            ),
            nalgebra::Vector3::new(
                ctx.read(keys::TARGET_VX)?,
                ctx.read(keys::TARGET_VY)?,
                ctx.read(keys::TARGET_VZ)?,
            ),
            epoch,
        );
        ctx.write_state(keys::TARGET_STATE, state)
    }
}

/// Derives the chase inertial state, its display cells and the
/// semi-major axis from the target state and the relative offset.
pub struct ChaseStateNode;

const CHASE_NODE_INPUTS: [CellKey; 7] = [
    keys::TARGET_STATE,
    keys::R_POS,
    keys::I_POS,
    keys::C_POS,
    keys::R_VEL,
    keys::I_VEL,
    keys::C_VEL,
];
const CHASE_NODE_OUTPUTS: [CellKey; 8] = [
    keys::CHASE_STATE,
    keys::CHASE_X,
    keys::CHASE_Y,
    keys::CHASE_Z,
    keys::CHASE_VX,
    keys::CHASE_VY,
    keys::CHASE_VZ,
    keys::SMA,
];

impl DerivationNode for ChaseStateNode {
    fn name(&self) -> &'static str {
        "chase-state"
    }

    fn inputs(&self) -> &'static [CellKey] {
        &CHASE_NODE_INPUTS
    }

    fn outputs(&self) -> &'static [CellKey] {
        &CHASE_NODE_OUTPUTS
    }

    fn compute(&mut self, ctx: &mut NodeCtx<'_>) -> Result<()> {
        let target = ctx.state(keys::TARGET_STATE)?;
        let relative = relative_from_cells(ctx)?;
        let chase = hill_to_eci(&relative, &target);

        ctx.write_state(keys::CHASE_STATE, chase)?;
        ctx.write(keys::CHASE_X, chase.position.x)?;
        ctx.write(keys::CHASE_Y, chase.position.y)?;
        ctx.write(keys::CHASE_Z, chase.position.z)?;
        ctx.write(keys::CHASE_VX, chase.velocity.x)?;
        ctx.write(keys::CHASE_VY, chase.velocity.y)?;
        ctx.write(keys::CHASE_VZ, chase.velocity.z)?;
        ctx.write(keys::SMA, target.semi_major_axis())
    }
}

/// Renders one day of relative motion centered on the reference epoch.
pub struct RelativeMotionNode;

const REL_NODE_INPUTS: [CellKey; 13] = [
    keys::R_POS,
    keys::I_POS,
    keys::C_POS,
    keys::R_VEL,
    keys::I_VEL,
    keys::C_VEL,
    keys::SMA,
    keys::YEAR,
    keys::MONTH,
    keys::DAY,
    keys::HOUR,
    keys::MINUTE,
    keys::SECOND,
];

impl DerivationNode for RelativeMotionNode {
    fn name(&self) -> &'static str {
        "rel-motion"
    }

    fn inputs(&self) -> &'static [CellKey] {
        &REL_NODE_INPUTS
    }

    fn outputs(&self) -> &'static [CellKey] {
        &[]
    }

    fn scene(&self) -> Option<PlotId> {
        Some(REL_PLOT)
    }

    fn compute(&mut self, ctx: &mut NodeCtx<'_>) -> Result<()> {
        let epoch = epoch_from_cells(ctx)?;
        let relative = relative_from_cells(ctx)?;
        let sma = ctx.read(keys::SMA)?;
        let samples = sim::propagate_relative(&relative, sma, epoch, ctx.config())?;

        if let Some(scene) = ctx.scene_mut(REL_PLOT) {
            if let Some(trace) = scene.trace_mut("Chase") {
                trace.points = sample_points(&samples);
            }
            if let Some(trace) = scene.trace_mut("Target") {
                trace.points = vec![[0.0, 0.0, 0.0]];
            }
        }
        Ok(())
    }
}

/// Renders the target and chase inertial trajectories over one day.
pub struct InertialViewNode;

const ECI_NODE_INPUTS: [CellKey; 2] = [keys::TARGET_STATE, keys::CHASE_STATE];

impl DerivationNode for InertialViewNode {
    fn name(&self) -> &'static str {
        "inertial-view"
    }

    fn inputs(&self) -> &'static [CellKey] {
        &ECI_NODE_INPUTS
    }

    fn outputs(&self) -> &'static [CellKey] {
        &[]
    }

    fn scene(&self) -> Option<PlotId> {
        Some(ECI_PLOT)
    }

    fn compute(&mut self, ctx: &mut NodeCtx<'_>) -> Result<()> {
        let target = ctx.state(keys::TARGET_STATE)?;
        let chase = ctx.state(keys::CHASE_STATE)?;
        let pair = sim::propagate_pair(&target, &chase, ctx.config())?;

        if let Some(scene) = ctx.scene_mut(ECI_PLOT) {
            if let Some(trace) = scene.trace_mut("Earth") {
                trace.points = vec![[0.0, 0.0, 0.0]];
            }
            if let Some(trace) = scene.trace_mut("Target") {
                trace.points = sample_points(&pair.target);
            }
            if let Some(trace) = scene.trace_mut("Chase") {
                trace.points = sample_points(&pair.chase);
            }
        }
        Ok(())
    }
}

/// Renders the estimation-tracking truth and observed series.
pub struct EstimationNode;

impl DerivationNode for EstimationNode {
    fn name(&self) -> &'static str {
        "estimation"
    }

    fn inputs(&self) -> &'static [CellKey] {
        &ECI_NODE_INPUTS
    }

    fn outputs(&self) -> &'static [CellKey] {
        &[]
    }

    fn scene(&self) -> Option<PlotId> {
        Some(OD_PLOT)
    }

    fn compute(&mut self, ctx: &mut NodeCtx<'_>) -> Result<()> {
        let target = ctx.state(keys::TARGET_STATE)?;
        let chase = ctx.state(keys::CHASE_STATE)?;
        let run = sim::track_estimation(&target, &chase, ctx.config())?;

        if let Some(scene) = ctx.scene_mut(OD_PLOT) {
            if let Some(trace) = scene.trace_mut("Target") {
                trace.points = vec![[0.0, 0.0, 0.0]];
            }
            if let Some(trace) = scene.trace_mut("Truth") {
                trace.points = sample_points(&run.truth);
            }
            if let Some(trace) = scene.trace_mut("Observed") {
                trace.points = sample_points(&run.observed);
            }
        }
        Ok(())
    }
}

/// Owns the instrument figure and renders it with dirty-region scoping.
#[derive(Default)]
pub struct SensorNode {
    figure: FovGeometry,
}

const SENSOR_NODE_INPUTS: [CellKey; 4] = [
    keys::IMG_DIAMETER,
    keys::FOCAL_LENGTH,
    keys::SENSOR_X,
    keys::SENSOR_Y,
];

impl DerivationNode for SensorNode {
    fn name(&self) -> &'static str {
        "sensor-geometry"
    }

    fn inputs(&self) -> &'static [CellKey] {
        &SENSOR_NODE_INPUTS
    }

    fn outputs(&self) -> &'static [CellKey] {
        &[]
    }

    fn scene(&self) -> Option<PlotId> {
        Some(SENSOR_PLOT)
    }

    fn compute(&mut self, ctx: &mut NodeCtx<'_>) -> Result<()> {
        let params = InstrumentParams {
            diameter: ctx.read(keys::IMG_DIAMETER)?,
            focal_length: ctx.read(keys::FOCAL_LENGTH)?,
            sensor_width: ctx.read(keys::SENSOR_X)?,
            sensor_height: ctx.read(keys::SENSOR_Y)?,
        };
        fov::recompute(&mut self.figure, &params, ctx.triggered());

        let figure = &self.figure;
        if let Some(scene) = ctx.scene_mut(SENSOR_PLOT) {
            if let Some(trace) = scene.trace_mut("Image Circle") {
                trace.points = planar_points(&figure.image_circle.points);
            }
            if let Some(trace) = scene.trace_mut("Sensor Frame") {
                trace.points = planar_points(&figure.sensor_frame.points);
            }
            if let Some(trace) = scene.trace_mut("FOV Bracket") {
                trace.points = planar_points(&figure.fov_bracket.points);
            }
            scene.annotations = figure
                .labels
                .iter()
                .map(|l| Annotation {
                    text: l.text.clone(),
                    anchor: l.anchor,
                })
                .collect();
            scene.overlay = Some(OverlayImage {
                center: [0.0, 0.0],
                size: figure.overlay.size,
            });
        }
        Ok(())
    }
}

fn planar_points(points: &[[f64; 2]]) -> Vec<[f64; 3]> {
    points.iter().map(|p| [p[0], p[1], 0.0]).collect()
}
