//! Pipeline assembly.
//!
//! Defines the cell table, builds the derivation graph and the scene set,
//! and exposes the write API the shell and the tests drive. Construction
//! fails fast on any graph invariant violation; after that every user
//! input funnels through `set_input`/`apply_epoch_text`, each successful
//! write batch triggering exactly one propagation pass.

use indexmap::IndexSet;

use crate::error::Result;
use crate::graph::nodes::{
    ChaseStateNode, EstimationNode, InertialViewNode, RelativeMotionNode, SensorNode,
    TargetStateNode, ECI_PLOT, OD_PLOT, REL_PLOT, SENSOR_PLOT,
};
use crate::graph::{DerivationGraph, DerivedCache, PassReport};
use crate::scene::{colors, PlotId, Scene, SceneSet, SceneTrace};
use crate::sim::SimConfig;
use crate::store::persist::StateSnapshot;
use crate::store::{keys, CellKey, Producer, Scope, StateStore, WriteOutcome};
use crate::validate;

/// Documented startup defaults for the input cells.
pub mod defaults {
    pub const EPOCH: [f64; 6] = [2023.0, 1.0, 26.0, 12.0, 30.0, 0.0];
    /// Approximate geostationary state (km, km/s).
    pub const TARGET: [f64; 6] = [42_164.0, 0.0, 0.0, 0.0, 3.074, 0.0];
    /// Relative-motion demonstration offset (km, km/s).
    pub const RELATIVE: [f64; 6] = [-5.0, 0.0, 0.0, 0.0, 0.0, 0.001];
    /// Instrument parameters (mm).
    pub const INSTRUMENT: [f64; 4] = [42.0, 360.0, 13.2, 8.8];
}

pub struct Pipeline {
    store: StateStore,
    cache: DerivedCache,
    graph: DerivationGraph,
    scenes: SceneSet,
    config: SimConfig,
}

impl Pipeline {
    pub fn new(config: SimConfig) -> Result<Self> {
        let mut store = StateStore::default();

        for (key, default) in keys::EPOCH.iter().zip(defaults::EPOCH) {
            store.define(*key, default, Scope::Persistent, Producer::Input)?;
        }
        for (key, default) in keys::TARGET.iter().zip(defaults::TARGET) {
            store.define(*key, default, Scope::Persistent, Producer::Input)?;
        }
        for (key, default) in keys::RELATIVE.iter().zip(defaults::RELATIVE) {
            store.define(*key, default, Scope::Persistent, Producer::Input)?;
        }
        for (key, default) in keys::INSTRUMENT.iter().zip(defaults::INSTRUMENT) {
            store.define(*key, default, Scope::Persistent, Producer::Input)?;
        }
        for key in keys::CHASE {
            store.define(key, 0.0, Scope::Session, Producer::Node("chase-state"))?;
        }
        store.define(keys::SMA, 0.0, Scope::Session, Producer::Node("chase-state"))?;

        let mut scenes = SceneSet::default();
        scenes.insert(Scene::new(
            REL_PLOT,
            vec![
                SceneTrace::lines("Chase", colors::DARK_CYAN),
                SceneTrace::markers("Target", colors::DARK_MAGENTA),
            ],
        ));
        scenes.insert(Scene::new(
            ECI_PLOT,
            vec![
                SceneTrace::markers("Earth", colors::EARTH_BLUE),
                SceneTrace::lines("Target", colors::DARK_MAGENTA),
                SceneTrace::lines("Chase", colors::DARK_CYAN),
            ],
        ));
        scenes.insert(Scene::new(
            OD_PLOT,
            vec![
                SceneTrace::markers("Target", colors::DARK_MAGENTA),
                SceneTrace::lines("Truth", colors::DARK_CYAN),
                SceneTrace::lines("Observed", colors::FIREBRICK),
            ],
        ));
        scenes.insert(Scene::new(
            SENSOR_PLOT,
            vec![
                SceneTrace::lines("Image Circle", colors::DARK_CYAN),
                SceneTrace::lines("Sensor Frame", colors::DARK_MAGENTA),
                SceneTrace::lines("FOV Bracket", colors::GREY),
            ],
        ));

        let graph = DerivationGraph::new(
            vec![
                Box::new(TargetStateNode),
                Box::new(ChaseStateNode),
                Box::new(RelativeMotionNode),
                Box::new(InertialViewNode),
                Box::new(EstimationNode),
                Box::new(SensorNode::default()),
            ],
            &mut store,
        )?;

        Ok(Self {
            store,
            cache: DerivedCache::default(),
            graph,
            scenes,
            config,
        })
    }

    /// Initial full evaluation: every key counts as changed.
    pub fn bootstrap(&mut self) -> PassReport {
        let changed: IndexSet<CellKey> = self.store.keys().collect();
        self.run(changed)
    }

    /// Write one input cell; a no-op write triggers no propagation.
    pub fn set_input(&mut self, key: CellKey, value: f64) -> Result<PassReport> {
        match self.store.write(Producer::Input, key, value)? {
            WriteOutcome::Unchanged => Ok(PassReport::default()),
            WriteOutcome::Changed => {
                let mut changed = IndexSet::new();
                changed.insert(key);
                Ok(self.run(changed))
            }
        }
    }

    /// Write a batch of input cells as one atomic update: at most one
    /// propagation pass regardless of how many values changed.
    pub fn set_inputs(&mut self, writes: &[(CellKey, f64)]) -> Result<PassReport> {
        let mut changed = IndexSet::new();
        for &(key, value) in writes {
            if self.store.write(Producer::Input, key, value)? == WriteOutcome::Changed {
                changed.insert(key);
            }
        }
        if changed.is_empty() {
            return Ok(PassReport::default());
        }
        Ok(self.run(changed))
    }

    /// Validate epoch text and, on success, write the six epoch cells as
    /// one atomic update. A rejected input leaves the store untouched.
    pub fn apply_epoch_text(&mut self, text: &str) -> Result<PassReport> {
        let (fields, _epoch) = validate::epoch_from_text(text)?;
        self.set_inputs(&[
            (keys::YEAR, fields.year as f64),
            (keys::MONTH, fields.month as f64),
            (keys::DAY, fields.day as f64),
            (keys::HOUR, fields.hour as f64),
            (keys::MINUTE, fields.minute as f64),
            (keys::SECOND, fields.second),
        ])
    }

    fn run(&mut self, changed: IndexSet<CellKey>) -> PassReport {
        self.graph.propagate(
            &changed,
            &mut self.store,
            &mut self.cache,
            &mut self.scenes,
            &self.config,
        )
    }

    pub fn read(&self, key: CellKey) -> Result<f64> {
        self.store.read(key)
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn scenes(&self) -> &SceneSet {
        &self.scenes
    }

    pub fn scene(&self, id: PlotId) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn graph(&self) -> &DerivationGraph {
        &self.graph
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Current epoch cells formatted the way the validator accepts them.
    pub fn epoch_text(&self) -> String {
        let read = |key| self.store.read(key).unwrap_or(0.0);
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            read(keys::YEAR) as i64,
            read(keys::MONTH) as i64,
            read(keys::DAY) as i64,
            read(keys::HOUR) as i64,
            read(keys::MINUTE) as i64,
            read(keys::SECOND) as i64,
        )
    }

    /// Restore persistent cells from a snapshot; returns how many applied.
    pub fn restore_snapshot(&mut self, snapshot: &StateSnapshot) -> usize {
        snapshot.restore_into(&mut self.store)
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::capture(&self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_bootstrap() {
        let mut pipeline = Pipeline::new(SimConfig::default()).unwrap();
        let report = pipeline.bootstrap();
        assert!(report.failed.is_empty(), "failures: {:?}", report.failed);
        assert_eq!(report.computed.len(), 6);
        for id in [REL_PLOT, ECI_PLOT, OD_PLOT, SENSOR_PLOT] {
            let scene = pipeline.scene(id).unwrap();
            assert!(
                scene.traces.iter().any(|t| !t.points.is_empty()),
                "scene {id} is empty"
            );
        }
    }

    #[test]
    fn test_epoch_text_roundtrip() {
        let mut pipeline = Pipeline::new(SimConfig::default()).unwrap();
        pipeline.bootstrap();
        assert_eq!(pipeline.epoch_text(), "2023-01-26 12:30:00");
        pipeline.apply_epoch_text("2024-03-05 01:02:03").unwrap();
        assert_eq!(pipeline.epoch_text(), "2024-03-05 01:02:03");
    }

    #[test]
    fn test_noop_write_runs_no_nodes() {
        let mut pipeline = Pipeline::new(SimConfig::default()).unwrap();
        pipeline.bootstrap();
        let before = pipeline.graph().call_count("chase-state");
        let report = pipeline
            .set_input(keys::TARGET_X, defaults::TARGET[0])
            .unwrap();
        assert!(report.is_empty());
        assert_eq!(pipeline.graph().call_count("chase-state"), before);
    }
}
