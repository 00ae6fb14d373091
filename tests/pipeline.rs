//! End-to-end scenarios driven through the pipeline API.

use proxops::graph::nodes::{ECI_PLOT, OD_PLOT, REL_PLOT, SENSOR_PLOT};
use proxops::pipeline::{defaults, Pipeline};
use proxops::scene::SceneStatus;
use proxops::sim::SimConfig;
use proxops::store::keys;

fn booted_pipeline() -> Pipeline {
    let mut pipeline = Pipeline::new(SimConfig::default()).unwrap();
    let report = pipeline.bootstrap();
    assert!(report.failed.is_empty(), "bootstrap failures: {:?}", report.failed);
    pipeline
}

#[test]
fn geostationary_zero_offset_chase_equals_target() {
    let mut pipeline = booted_pipeline();
    // Zero out the demonstration offset; chase must collapse onto the target.
    pipeline
        .set_inputs(&[
            (keys::R_POS, 0.0),
            (keys::I_POS, 0.0),
            (keys::C_POS, 0.0),
            (keys::R_VEL, 0.0),
            (keys::I_VEL, 0.0),
            (keys::C_VEL, 0.0),
        ])
        .unwrap();

    assert!((pipeline.read(keys::CHASE_X).unwrap() - 42_164.0).abs() < 1e-6);
    assert!(pipeline.read(keys::CHASE_Y).unwrap().abs() < 1e-6);
    assert!(pipeline.read(keys::CHASE_Z).unwrap().abs() < 1e-6);
    assert!(pipeline.read(keys::CHASE_VX).unwrap().abs() < 1e-9);
    assert!((pipeline.read(keys::CHASE_VY).unwrap() - 3.074).abs() < 1e-9);
    assert!(pipeline.read(keys::CHASE_VZ).unwrap().abs() < 1e-9);

    let sma = pipeline.read(keys::SMA).unwrap();
    assert!((sma - 42_164.0).abs() < 50.0, "sma = {sma}");
}

#[test]
fn invalid_epoch_text_leaves_store_untouched() {
    let mut pipeline = booted_pipeline();
    let chase_count = pipeline.graph().call_count("chase-state");

    // February 30th does not exist.
    let result = pipeline.apply_epoch_text("2023-02-30 10:00:00");
    assert!(result.is_err());

    assert_eq!(pipeline.read(keys::YEAR).unwrap(), defaults::EPOCH[0]);
    assert_eq!(pipeline.read(keys::MONTH).unwrap(), defaults::EPOCH[1]);
    assert_eq!(pipeline.read(keys::DAY).unwrap(), defaults::EPOCH[2]);
    // No propagation happened either.
    assert_eq!(pipeline.graph().call_count("chase-state"), chase_count);
}

#[test]
fn valid_epoch_text_is_one_atomic_update() {
    let mut pipeline = booted_pipeline();
    let target_count = pipeline.graph().call_count("target-state");

    let report = pipeline.apply_epoch_text("2023-06-15 08:00:30").unwrap();
    assert!(report.failed.is_empty());
    // Six cells changed, but the target node ran exactly once.
    assert_eq!(pipeline.graph().call_count("target-state"), target_count + 1);
    assert_eq!(pipeline.read(keys::MONTH).unwrap(), 6.0);
    assert_eq!(pipeline.read(keys::SECOND).unwrap(), 30.0);
}

#[test]
fn relative_window_sample_count_matches_step() {
    let config = SimConfig::default();
    let expected = (86_400.0 / config.step_seconds).round() as usize + 1;
    let mut pipeline = Pipeline::new(config).unwrap();
    pipeline.bootstrap();

    // Demonstration offset: (-5, 0, 0) km, 1 m/s cross-track.
    pipeline
        .set_inputs(&[(keys::R_POS, -5.0), (keys::C_VEL, 0.001)])
        .unwrap();

    let scene = pipeline.scene(REL_PLOT).unwrap();
    assert_eq!(scene.trace("Chase").unwrap().points.len(), expected);
    assert_eq!(scene.trace("Target").unwrap().points.len(), 1);
}

#[test]
fn single_write_runs_each_dependent_node_once() {
    let mut pipeline = booted_pipeline();
    let counts_before: Vec<u64> = ["target-state", "chase-state", "rel-motion", "inertial-view", "estimation"]
        .iter()
        .map(|n| pipeline.graph().call_count(n))
        .collect();

    pipeline.set_input(keys::TARGET_X, 42_000.0).unwrap();

    for (name, before) in ["target-state", "chase-state", "rel-motion", "inertial-view", "estimation"]
        .iter()
        .zip(counts_before)
    {
        assert_eq!(
            pipeline.graph().call_count(name),
            before + 1,
            "node {name} did not run exactly once"
        );
    }
    // The sensor node reads none of the orbital keys.
    assert_eq!(pipeline.graph().call_count("sensor-geometry"), 1);
}

#[test]
fn noop_write_triggers_no_pass() {
    let mut pipeline = booted_pipeline();
    let count = pipeline.graph().call_count("target-state");
    let report = pipeline
        .set_input(keys::TARGET_X, defaults::TARGET[0])
        .unwrap();
    assert!(report.is_empty());
    assert_eq!(pipeline.graph().call_count("target-state"), count);
}

#[test]
fn degenerate_target_goes_stale_and_recovers() {
    let mut pipeline = booted_pipeline();
    let chase_points = pipeline
        .scene(ECI_PLOT)
        .unwrap()
        .trace("Chase")
        .unwrap()
        .points
        .clone();

    // A target at the frame origin has no defined Hill frame; the chase
    // derivation fails and everything downstream goes stale, keeping its
    // last good contents.
    pipeline
        .set_inputs(&[
            (keys::TARGET_X, 0.0),
            (keys::TARGET_VY, 0.0),
        ])
        .unwrap();

    assert!(pipeline.store().is_stale(keys::CHASE_X));
    assert!(pipeline.store().is_stale(keys::SMA));
    let scene = pipeline.scene(ECI_PLOT).unwrap();
    assert_ne!(scene.status, SceneStatus::Fresh);
    assert_eq!(scene.trace("Chase").unwrap().points, chase_points);

    // Restoring a sane target clears the stale flags.
    pipeline
        .set_inputs(&[
            (keys::TARGET_X, defaults::TARGET[0]),
            (keys::TARGET_VY, defaults::TARGET[4]),
        ])
        .unwrap();
    assert!(!pipeline.store().is_stale(keys::CHASE_X));
    assert!(!pipeline.store().is_stale(keys::SMA));
    assert_eq!(pipeline.scene(ECI_PLOT).unwrap().status, SceneStatus::Fresh);
}

#[test]
fn estimation_scene_series_are_aligned() {
    let pipeline = booted_pipeline();
    let scene = pipeline.scene(OD_PLOT).unwrap();
    let truth = &scene.trace("Truth").unwrap().points;
    let observed = &scene.trace("Observed").unwrap().points;
    assert_eq!(truth.len(), observed.len());
    assert!(!truth.is_empty());
}

#[test]
fn sensor_width_change_leaves_image_circle_untouched() {
    let mut pipeline = booted_pipeline();
    let circle_before = pipeline
        .scene(SENSOR_PLOT)
        .unwrap()
        .trace("Image Circle")
        .unwrap()
        .points
        .clone();
    let frame_before = pipeline
        .scene(SENSOR_PLOT)
        .unwrap()
        .trace("Sensor Frame")
        .unwrap()
        .points
        .clone();

    let width = defaults::INSTRUMENT[2];
    pipeline.set_input(keys::SENSOR_X, width * 2.0).unwrap();

    let scene = pipeline.scene(SENSOR_PLOT).unwrap();
    assert_eq!(scene.trace("Image Circle").unwrap().points, circle_before);

    let max_x = |points: &[[f64; 3]]| points.iter().map(|p| p[0]).fold(f64::MIN, f64::max);
    let frame_after = &scene.trace("Sensor Frame").unwrap().points;
    assert!((max_x(frame_after) - 2.0 * max_x(&frame_before)).abs() < 1e-9);
}

#[test]
fn inertial_scene_traces_share_length() {
    let pipeline = booted_pipeline();
    let scene = pipeline.scene(ECI_PLOT).unwrap();
    let target = &scene.trace("Target").unwrap().points;
    let chase = &scene.trace("Chase").unwrap().points;
    assert_eq!(target.len(), chase.len());
    let expected = (86_400.0 / pipeline.config().step_seconds).round() as usize + 1;
    assert_eq!(target.len(), expected);
}
