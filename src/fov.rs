//! Instrument field-of-view geometry.
//!
//! Pure trigonometry from four instrument scalars to a composite figure:
//! image-circle outline, sensor-frame rectangle, angular field-of-view
//! bracket and labels, and a to-scale moon overlay. Recomputation is
//! scoped to the dirty region of the figure: only the outputs that depend
//! on the scalar that actually changed are rebuilt, observable through
//! per-shape revision counters. With no prior figure everything is built.

use indexmap::IndexSet;

use crate::store::{keys, CellKey};

/// Apparent diameter of the moon (degrees), used to scale the overlay.
pub const MOON_DIAMETER_DEG: f64 = 0.52;

const CIRCLE_SEGMENTS: usize = 360;

/// The four instrument scalars (millimeters).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentParams {
    pub diameter: f64,
    pub focal_length: f64,
    pub sensor_width: f64,
    pub sensor_height: f64,
}

impl InstrumentParams {
    /// Full angular field of view across the image circle (degrees).
    pub fn fov_deg(&self) -> f64 {
        (self.diameter / self.focal_length).atan().to_degrees()
    }

    /// Horizontal field of view across the sensor (degrees).
    pub fn fov_x_deg(&self) -> f64 {
        self.sensor_width / self.diameter * self.fov_deg()
    }

    /// Vertical field of view across the sensor (degrees).
    pub fn fov_y_deg(&self) -> f64 {
        self.sensor_height / self.diameter * self.fov_deg()
    }
}

/// A polyline with a revision counter bumped on every rebuild.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    pub points: Vec<[f64; 2]>,
    pub revision: u64,
}

impl Shape {
    fn set(&mut self, points: Vec<[f64; 2]>) {
        self.points = points;
        self.revision += 1;
    }
}

#[derive(Debug, Clone, Default)]
pub struct AngleLabel {
    pub text: String,
    pub anchor: [f64; 2],
}

/// Placement of the moon overlay (plot coordinates, centered on origin).
#[derive(Debug, Clone, Copy, Default)]
pub struct MoonOverlay {
    pub size: f64,
    pub revision: u64,
}

/// The composite instrument figure.
#[derive(Debug, Clone, Default)]
pub struct FovGeometry {
    pub image_circle: Shape,
    pub sensor_frame: Shape,
    pub fov_bracket: Shape,
    /// Full, horizontal and vertical field-of-view labels.
    pub labels: [AngleLabel; 3],
    pub overlay: MoonOverlay,
}

impl FovGeometry {
    fn is_empty(&self) -> bool {
        self.image_circle.points.is_empty()
    }
}

/// Recompute the subset of `figure` affected by the keys in `changed`.
pub fn recompute(figure: &mut FovGeometry, params: &InstrumentParams, changed: &IndexSet<CellKey>) {
    let first = figure.is_empty();
    let diameter = first || changed.contains(&keys::IMG_DIAMETER);
    let focal = first || changed.contains(&keys::FOCAL_LENGTH);
    let width = first || changed.contains(&keys::SENSOR_X);
    let height = first || changed.contains(&keys::SENSOR_Y);

    if !(diameter || focal || width || height) {
        return;
    }

    let r = params.diameter * 0.5;
    let w = params.sensor_width;
    let h = params.sensor_height;
    let fov = params.fov_deg();

    if diameter {
        let circle = (0..=CIRCLE_SEGMENTS)
            .map(|d| {
                let angle = (d as f64).to_radians();
                [r * angle.cos(), r * angle.sin()]
            })
            .collect();
        figure.image_circle.set(circle);
        figure.fov_bracket.set(vec![[-r, r * 1.1], [r, r * 1.1]]);
    }

    if width || height {
        figure.sensor_frame.set(vec![
            [-w * 0.5, h * 0.5],
            [w * 0.5, h * 0.5],
            [w * 0.5, 0.0],
            [w * 0.5, -h * 0.5],
            [0.0, -h * 0.5],
            [-w * 0.5, -h * 0.5],
            [-w * 0.5, h * 0.5],
        ]);
    }

    // Every scalar feeds at least the label set.
    figure.labels[0] = AngleLabel {
        text: format!("{:.3} degrees", fov),
        anchor: [0.0, r * 1.1],
    };
    figure.labels[1] = AngleLabel {
        text: format!("{:.3} degrees", params.fov_x_deg()),
        anchor: [0.0, -h * 0.5],
    };
    figure.labels[2] = AngleLabel {
        text: format!("{:.3} degrees", params.fov_y_deg()),
        anchor: [w * 0.5, 0.0],
    };

    if diameter || focal {
        figure.overlay = MoonOverlay {
            size: MOON_DIAMETER_DEG / fov * params.diameter,
            revision: figure.overlay.revision + 1,
        };
    }
}
