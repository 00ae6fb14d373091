//! Application shell.
//!
//! Thin egui layer over the pipeline: input widgets funnel changes into
//! store writes, pages draw whatever scenes the derivation graph last
//! published. No simulation or derivation logic lives here.

use std::path::PathBuf;

use anyhow::Result;
use eframe::egui;

use crate::graph::nodes::{ECI_PLOT, OD_PLOT, REL_PLOT, SENSOR_PLOT};
use crate::pipeline::Pipeline;
use crate::sim::SimConfig;
use crate::store::persist;
use crate::store::{keys, CellKey};
use crate::ui::plots::{self, Projection};
use crate::ui::Page;

const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 100, 100);
const STALE_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 180, 80);

/// Editable copies of the input cells, in display units. Velocities on
/// the relative page are entered in m/s and stored in km/s.
struct InputMirror {
    target: [f64; 6],
    relative_pos: [f64; 3],
    relative_vel: [f64; 3],
    instrument: [f64; 4],
}

impl InputMirror {
    fn from_pipeline(pipeline: &Pipeline) -> Self {
        let read = |key| pipeline.read(key).unwrap_or(0.0);
        Self {
            target: [
                read(keys::TARGET_X),
                read(keys::TARGET_Y),
                read(keys::TARGET_Z),
                read(keys::TARGET_VX),
                read(keys::TARGET_VY),
                read(keys::TARGET_VZ),
            ],
            relative_pos: [read(keys::R_POS), read(keys::I_POS), read(keys::C_POS)],
            relative_vel: [
                read(keys::R_VEL) * 1000.0,
                read(keys::I_VEL) * 1000.0,
                read(keys::C_VEL) * 1000.0,
            ],
            instrument: [
                read(keys::IMG_DIAMETER),
                read(keys::FOCAL_LENGTH),
                read(keys::SENSOR_X),
                read(keys::SENSOR_Y),
            ],
        }
    }
}

pub struct ProxOpsApp {
    pipeline: Pipeline,
    page: Page,
    inputs: InputMirror,
    epoch_text: String,
    epoch_error: Option<String>,
    projection: Projection,
    state_path: PathBuf,
}

impl ProxOpsApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: SimConfig,
        state_path: PathBuf,
    ) -> Result<Self> {
        let mut pipeline = Pipeline::new(config)?;

        if let Some(snapshot) = persist::load(&state_path) {
            let restored = pipeline.restore_snapshot(&snapshot);
            log::info!("Restored {} persistent cells from {:?}", restored, state_path);
        }

        let report = pipeline.bootstrap();
        for (node, error) in &report.failed {
            log::warn!("initial pass: node {} failed: {}", node, error);
        }

        let inputs = InputMirror::from_pipeline(&pipeline);
        let epoch_text = pipeline.epoch_text();

        Ok(Self {
            pipeline,
            page: Page::Dashboard,
            inputs,
            epoch_text,
            epoch_error: None,
            projection: Projection::default(),
            state_path,
        })
    }

    fn apply_changes(&mut self, changes: Vec<(CellKey, f64)>) {
        for (key, value) in changes {
            match self.pipeline.set_input(key, value) {
                Ok(_) => {}
                Err(e) => log::warn!("rejected input for {}: {}", key, e),
            }
        }
        self.save_state();
    }

    fn save_state(&self) {
        let snapshot = self.pipeline.snapshot();
        if let Err(e) = persist::save(&self.state_path, &snapshot) {
            log::warn!("Failed to save state file {:?}: {}", self.state_path, e);
        }
    }

    fn show_dashboard(&mut self, ui: &mut egui::Ui) {
        ui.heading("Scenario Configuration");
        ui.label(
            "The epoch and target state below act as the origin when deriving the \
             chase vehicle. Direct edits to the chase state cannot be made here; \
             use the relative motion page instead.",
        );
        ui.separator();

        ui.label("Epoch (YYYY-MM-DD hh:mm:ss)");
        let response = ui.text_edit_singleline(&mut self.epoch_text);
        if response.changed() {
            match self.pipeline.apply_epoch_text(&self.epoch_text) {
                Ok(_) => {
                    self.epoch_error = None;
                    self.save_state();
                }
                Err(e) => self.epoch_error = Some(e.to_string()),
            }
        }
        if let Some(error) = &self.epoch_error {
            ui.colored_label(ERROR_COLOR, error);
        }
        ui.separator();

        ui.label("Target state (inertial frame)");
        let changes = vector_inputs(
            ui,
            &mut self.inputs.target,
            &keys::TARGET,
            &[
                "x (km)",
                "y (km)",
                "z (km)",
                "vx (km/s)",
                "vy (km/s)",
                "vz (km/s)",
            ],
            1.0,
        );
        if !changes.is_empty() {
            self.apply_changes(changes);
        }
        ui.separator();

        ui.label("Chase state (derived)");
        self.show_chase_readout(ui);
    }

    fn show_chase_readout(&self, ui: &mut egui::Ui) {
        let labels = [
            "x (km)",
            "y (km)",
            "z (km)",
            "vx (km/s)",
            "vy (km/s)",
            "vz (km/s)",
        ];
        egui::Grid::new("chase_grid")
            .num_columns(2)
            .spacing([10.0, 4.0])
            .show(ui, |ui| {
                for (key, label) in keys::CHASE.iter().zip(labels) {
                    ui.label(label);
                    if self.pipeline.store().is_stale(*key) {
                        ui.colored_label(STALE_COLOR, "stale");
                    } else {
                        ui.label(format!("{:.6}", self.pipeline.read(*key).unwrap_or(0.0)));
                    }
                    ui.end_row();
                }
                ui.label("semi-major axis (km)");
                if self.pipeline.store().is_stale(keys::SMA) {
                    ui.colored_label(STALE_COLOR, "stale");
                } else {
                    ui.label(format!(
                        "{:.3}",
                        self.pipeline.read(keys::SMA).unwrap_or(0.0)
                    ));
                }
                ui.end_row();
            });
    }

    fn show_relative(&mut self, ui: &mut egui::Ui) {
        ui.heading("3-D Relative Motion Visualization and Planning");
        ui.label(
            "These values are relative to the target state defined on the \
             dashboard. Input various values to see how the motion profile \
             changes.",
        );
        ui.separator();

        let mut changes = vector_inputs(
            ui,
            &mut self.inputs.relative_pos,
            &[keys::R_POS, keys::I_POS, keys::C_POS],
            &["radial (km)", "in-track (km)", "cross-track (km)"],
            0.5,
        );
        let vel_changes = vector_inputs(
            ui,
            &mut self.inputs.relative_vel,
            &[keys::R_VEL, keys::I_VEL, keys::C_VEL],
            &["vr (m/s)", "vi (m/s)", "vc (m/s)"],
            0.1,
        );
        // UI velocities are m/s; the store carries km/s.
        changes.extend(vel_changes.into_iter().map(|(k, v)| (k, v / 1000.0)));
        if !changes.is_empty() {
            self.apply_changes(changes);
        }

        plots::view_controls(ui, &mut self.projection);
        if let Some(scene) = self.pipeline.scene(REL_PLOT) {
            plots::draw_scene_3d(ui, scene, &self.projection, ui.available_height());
        }
    }

    fn show_inertial(&mut self, ui: &mut egui::Ui) {
        ui.heading("Inertial Visualization");
        ui.label("This view shows how the target and chase state look independent of each other.");
        plots::view_controls(ui, &mut self.projection);
        if let Some(scene) = self.pipeline.scene(ECI_PLOT) {
            plots::draw_scene_3d(ui, scene, &self.projection, ui.available_height());
        }
    }

    fn show_estimation(&mut self, ui: &mut egui::Ui) {
        ui.heading("Filter Performance");
        ui.label(
            "This page shows how well the chase vehicle is able to estimate the \
             state of the target given the pre-defined relative state. Ideally \
             the observed state would always be on top of truth.",
        );
        plots::view_controls(ui, &mut self.projection);
        if let Some(scene) = self.pipeline.scene(OD_PLOT) {
            plots::draw_scene_3d(ui, scene, &self.projection, ui.available_height());
        }
    }

    fn show_hardware(&mut self, ui: &mut egui::Ui) {
        ui.heading("Instrument Geometry");
        let changes = vector_inputs(
            ui,
            &mut self.inputs.instrument,
            &keys::INSTRUMENT,
            &[
                "Image Circle Diameter (mm)",
                "Focal Length (mm)",
                "Sensor Width (mm)",
                "Sensor Height (mm)",
            ],
            0.1,
        );
        if !changes.is_empty() {
            self.apply_changes(changes);
        }

        if let Some(scene) = self.pipeline.scene(SENSOR_PLOT) {
            plots::draw_scene_planar(ui, scene, ui.available_height());
        }
    }
}

/// Draw one DragValue per component; returns the `(key, value)` pairs that
/// changed this frame.
fn vector_inputs(
    ui: &mut egui::Ui,
    values: &mut [f64],
    cell_keys: &[CellKey],
    labels: &[&str],
    speed: f64,
) -> Vec<(CellKey, f64)> {
    let mut changes = Vec::new();
    ui.horizontal_wrapped(|ui| {
        for ((value, key), label) in values.iter_mut().zip(cell_keys).zip(labels) {
            ui.label(*label);
            let response = ui.add(egui::DragValue::new(value).speed(speed));
            if response.changed() {
                changes.push((*key, *value));
            }
        }
    });
    changes
}

impl eframe::App for ProxOpsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("nav_panel")
            .default_width(170.0)
            .show(ctx, |ui| {
                ui.heading("proxops");
                ui.separator();
                for page in Page::ALL {
                    if ui.selectable_label(self.page == page, page.label()).clicked() {
                        self.page = page;
                    }
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| match self.page {
            Page::Dashboard => self.show_dashboard(ui),
            Page::Relative => self.show_relative(ui),
            Page::Inertial => self.show_inertial(ui),
            Page::Estimation => self.show_estimation(ui),
            Page::Hardware => self.show_hardware(ui),
        });
    }
}
