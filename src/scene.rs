//! Scene descriptions handed to the display surface.
//!
//! A scene is a fixed set of named traces plus optional annotations and an
//! overlay, keyed by a stable plot id so the display can update in place.
//! The trace set never changes after construction; an empty point list is
//! a valid trace, not a missing one.

use egui::Color32;
use indexmap::IndexMap;

/// Stable plot identifier.
pub type PlotId = &'static str;

pub mod colors {
    use egui::Color32;

    pub const DARK_CYAN: Color32 = Color32::from_rgb(0, 139, 139);
    pub const DARK_MAGENTA: Color32 = Color32::from_rgb(139, 0, 139);
    pub const FIREBRICK: Color32 = Color32::from_rgb(178, 34, 34);
    pub const EARTH_BLUE: Color32 = Color32::from_rgb(65, 105, 225);
    pub const GREY: Color32 = Color32::from_rgb(128, 128, 128);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Lines,
    Markers,
}

#[derive(Debug, Clone)]
pub struct SceneTrace {
    pub name: &'static str,
    pub kind: TraceKind,
    pub color: Color32,
    pub points: Vec<[f64; 3]>,
}

impl SceneTrace {
    pub fn lines(name: &'static str, color: Color32) -> Self {
        Self {
            name,
            kind: TraceKind::Lines,
            color,
            points: Vec::new(),
        }
    }

    pub fn markers(name: &'static str, color: Color32) -> Self {
        Self {
            name,
            kind: TraceKind::Markers,
            color,
            points: Vec::new(),
        }
    }
}

/// Split trace points into per-axis channels.
pub fn channels(points: &[[f64; 3]]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut xs = Vec::with_capacity(points.len());
    let mut ys = Vec::with_capacity(points.len());
    let mut zs = Vec::with_capacity(points.len());
    for p in points {
        xs.push(p[0]);
        ys.push(p[1]);
        zs.push(p[2]);
    }
    (xs, ys, zs)
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub text: String,
    pub anchor: [f64; 2],
}

/// Placement of a background overlay image, in plot coordinates.
#[derive(Debug, Clone, Copy)]
pub struct OverlayImage {
    pub center: [f64; 2],
    pub size: f64,
}

/// Freshness of a scene's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneStatus {
    /// Contents reflect the latest inputs.
    Fresh,
    /// An upstream value is unavailable; contents are the last good run.
    Stale,
    /// The producing simulation failed; contents are the last good run.
    Failed,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub id: PlotId,
    pub traces: Vec<SceneTrace>,
    pub annotations: Vec<Annotation>,
    pub overlay: Option<OverlayImage>,
    pub status: SceneStatus,
    pub revision: u64,
}

impl Scene {
    pub fn new(id: PlotId, traces: Vec<SceneTrace>) -> Self {
        Self {
            id,
            traces,
            annotations: Vec::new(),
            overlay: None,
            status: SceneStatus::Fresh,
            revision: 0,
        }
    }

    pub fn trace_mut(&mut self, name: &str) -> Option<&mut SceneTrace> {
        self.traces.iter_mut().find(|t| t.name == name)
    }

    pub fn trace(&self, name: &str) -> Option<&SceneTrace> {
        self.traces.iter().find(|t| t.name == name)
    }
}

/// All scenes, keyed by plot id.
#[derive(Debug, Default)]
pub struct SceneSet {
    scenes: IndexMap<PlotId, Scene>,
}

impl SceneSet {
    pub fn insert(&mut self, scene: Scene) {
        self.scenes.insert(scene.id, scene);
    }

    pub fn get(&self, id: PlotId) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn get_mut(&mut self, id: PlotId) -> Option<&mut Scene> {
        self.scenes.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_set_is_stable() {
        let scene = Scene::new(
            "rel-plot",
            vec![
                SceneTrace::lines("Chase", colors::DARK_CYAN),
                SceneTrace::markers("Target", colors::DARK_MAGENTA),
            ],
        );
        assert_eq!(scene.traces.len(), 2);
        assert!(scene.trace("Chase").unwrap().points.is_empty());
    }

    #[test]
    fn test_channels_transposition() {
        let points = vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let (xs, ys, zs) = channels(&points);
        assert_eq!(xs, vec![1.0, 4.0]);
        assert_eq!(ys, vec![2.0, 5.0]);
        assert_eq!(zs, vec![3.0, 6.0]);
    }

    #[test]
    fn test_empty_channels() {
        let (xs, ys, zs) = channels(&[]);
        assert!(xs.is_empty() && ys.is_empty() && zs.is_empty());
    }
}
