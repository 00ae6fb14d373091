//! Scene drawing on egui_plot canvases.
//!
//! Trajectory scenes carry 3-D points; they are drawn through a fixed
//! orthographic projection whose view angles the user can adjust. The
//! sensor scene is planar and drawn with a unit aspect ratio.

use egui::Ui;
use egui_plot::{Legend, Line, Plot, PlotPoint, PlotPoints, Points, Polygon, Text};

use crate::scene::{Scene, SceneStatus, TraceKind};

/// View angles for the orthographic 3-D projection (degrees).
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    pub yaw_deg: f64,
    pub pitch_deg: f64,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            yaw_deg: 35.0,
            pitch_deg: 25.0,
        }
    }
}

impl Projection {
    /// Rotate about the vertical axis by yaw, tilt by pitch, drop depth.
    pub fn project(&self, p: [f64; 3]) -> [f64; 2] {
        let (sy, cy) = self.yaw_deg.to_radians().sin_cos();
        let (sp, cp) = self.pitch_deg.to_radians().sin_cos();
        let x = cy * p[0] + sy * p[1];
        let y = -sy * p[0] + cy * p[1];
        [x, p[2] * cp - y * sp]
    }
}

/// Warn the user when a scene is showing last-good data.
pub fn status_label(ui: &mut Ui, scene: &Scene) {
    match scene.status {
        SceneStatus::Fresh => {}
        SceneStatus::Stale => {
            ui.colored_label(
                egui::Color32::from_rgb(220, 180, 80),
                "inputs unavailable - showing last good result",
            );
        }
        SceneStatus::Failed => {
            ui.colored_label(
                egui::Color32::from_rgb(220, 100, 100),
                "simulation failed - showing last good result",
            );
        }
    }
}

/// Draw a 3-D trajectory scene through `projection`.
pub fn draw_scene_3d(ui: &mut Ui, scene: &Scene, projection: &Projection, height: f32) {
    status_label(ui, scene);
    Plot::new(scene.id)
        .data_aspect(1.0)
        .height(height)
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            for trace in &scene.traces {
                let points: Vec<[f64; 2]> = trace
                    .points
                    .iter()
                    .map(|p| projection.project(*p))
                    .collect();
                match trace.kind {
                    TraceKind::Lines => plot_ui.line(
                        Line::new(trace.name, PlotPoints::new(points))
                            .color(trace.color)
                            .width(1.5),
                    ),
                    TraceKind::Markers => plot_ui.points(
                        Points::new(trace.name, PlotPoints::new(points))
                            .color(trace.color)
                            .radius(4.0),
                    ),
                }
            }
        });
}

/// Draw the planar sensor scene with its annotations and overlay.
pub fn draw_scene_planar(ui: &mut Ui, scene: &Scene, height: f32) {
    status_label(ui, scene);
    Plot::new(scene.id)
        .data_aspect(1.0)
        .height(height)
        .show_axes(false)
        .show_grid(false)
        .show(ui, |plot_ui| {
            if let Some(overlay) = &scene.overlay {
                let r = overlay.size * 0.5;
                let circle: Vec<[f64; 2]> = (0..=72)
                    .map(|i| {
                        let angle = (i as f64 * 5.0).to_radians();
                        [
                            overlay.center[0] + r * angle.cos(),
                            overlay.center[1] + r * angle.sin(),
                        ]
                    })
                    .collect();
                plot_ui.polygon(
                    Polygon::new("", PlotPoints::new(circle))
                        .fill_color(egui::Color32::from_gray(70))
                        .stroke(egui::Stroke::new(1.0, egui::Color32::from_gray(100))),
                );
            }
            for trace in &scene.traces {
                let points: Vec<[f64; 2]> =
                    trace.points.iter().map(|p| [p[0], p[1]]).collect();
                plot_ui.line(
                    Line::new(trace.name, PlotPoints::new(points))
                        .color(trace.color)
                        .width(1.5),
                );
            }
            for annotation in &scene.annotations {
                plot_ui.text(
                    Text::new(
                        "",
                        PlotPoint::new(annotation.anchor[0], annotation.anchor[1]),
                        annotation.text.clone(),
                    )
                    .color(egui::Color32::WHITE),
                );
            }
        });
}

/// Sliders for the 3-D view angles.
pub fn view_controls(ui: &mut Ui, projection: &mut Projection) {
    ui.horizontal(|ui| {
        ui.label("View:");
        ui.add(
            egui::DragValue::new(&mut projection.yaw_deg)
                .range(-180.0..=180.0)
                .suffix("° yaw"),
        );
        ui.add(
            egui::DragValue::new(&mut projection.pitch_deg)
                .range(-90.0..=90.0)
                .suffix("° pitch"),
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_top_view() {
        let projection = Projection {
            yaw_deg: 0.0,
            pitch_deg: 90.0,
        };
        let p = projection.project([1.0, 2.0, 3.0]);
        assert!((p[0] - 1.0).abs() < 1e-12);
        assert!((p[1] + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_projection_side_view() {
        let projection = Projection {
            yaw_deg: 0.0,
            pitch_deg: 0.0,
        };
        let p = projection.project([1.0, 2.0, 3.0]);
        assert!((p[0] - 1.0).abs() < 1e-12);
        assert!((p[1] - 3.0).abs() < 1e-12);
    }
}
