//! Derivation graph engine.
//!
//! Nodes declare the cell keys they read and write; the graph is built
//! once at startup, topologically ordered, and checked for cycles and
//! duplicate producers (both are construction-time failures). A
//! propagation pass receives the set of changed keys, visits dirty nodes
//! in topological order at most once each, and spreads dirtiness through
//! whatever outputs actually change. A failing node marks its outputs
//! stale instead of writing garbage; nodes with stale inputs skip compute
//! and pass the stale flag on.

pub mod nodes;

use indexmap::{IndexMap, IndexSet};

use crate::astro::EciState;
use crate::error::{Error, Result};
use crate::scene::{PlotId, Scene, SceneSet, SceneStatus};
use crate::sim::SimConfig;
use crate::store::{CellKey, Producer, StateStore};

/// Typed products exchanged between nodes outside the scalar store,
/// addressed by the same key namespace so dependency edges are uniform.
#[derive(Debug, Default)]
pub struct DerivedCache {
    slots: IndexMap<CellKey, DerivedSlot>,
}

#[derive(Debug, Default)]
struct DerivedSlot {
    state: Option<EciState>,
    stale: bool,
}

impl DerivedCache {
    pub fn state(&self, key: CellKey) -> Result<EciState> {
        self.slots
            .get(&key)
            .and_then(|s| s.state)
            .ok_or(Error::UnknownCell(key))
    }

    /// Store a derived state; returns whether the value changed.
    pub fn set_state(&mut self, key: CellKey, state: EciState) -> bool {
        let slot = self.slots.entry(key).or_default();
        let changed = slot.state != Some(state) || slot.stale;
        slot.state = Some(state);
        slot.stale = false;
        changed
    }

    pub fn mark_stale(&mut self, key: CellKey) {
        self.slots.entry(key).or_default().stale = true;
    }

    pub fn is_stale(&self, key: CellKey) -> bool {
        self.slots.get(&key).map(|s| s.stale).unwrap_or(false)
    }
}

/// Execution context handed to a node's `compute`.
///
/// Reads go to the store or the derived cache; writes are restricted to
/// the node's declared outputs and tracked so the engine can propagate
/// dirtiness. The triggering key set is exposed for dirty-region scoping.
pub struct NodeCtx<'a> {
    node: &'static str,
    outputs: &'static [CellKey],
    store: &'a mut StateStore,
    cache: &'a mut DerivedCache,
    scenes: &'a mut SceneSet,
    config: &'a SimConfig,
    triggered: &'a IndexSet<CellKey>,
    changed_outputs: IndexSet<CellKey>,
}

impl<'a> NodeCtx<'a> {
    pub fn read(&self, key: CellKey) -> Result<f64> {
        self.store.read(key)
    }

    pub fn state(&self, key: CellKey) -> Result<EciState> {
        self.cache.state(key)
    }

    pub fn write(&mut self, key: CellKey, value: f64) -> Result<()> {
        if !self.outputs.contains(&key) {
            return Err(Error::UndeclaredOutput {
                key,
                node: self.node,
            });
        }
        if self.store.write(Producer::Node(self.node), key, value)?
            == crate::store::WriteOutcome::Changed
        {
            self.changed_outputs.insert(key);
        }
        Ok(())
    }

    pub fn write_state(&mut self, key: CellKey, state: EciState) -> Result<()> {
        if !self.outputs.contains(&key) {
            return Err(Error::UndeclaredOutput {
                key,
                node: self.node,
            });
        }
        if self.cache.set_state(key, state) {
            self.changed_outputs.insert(key);
        }
        Ok(())
    }

    pub fn scene_mut(&mut self, id: PlotId) -> Option<&mut Scene> {
        self.scenes.get_mut(id)
    }

    /// The keys whose change triggered this pass (including any outputs
    /// already rewritten earlier in the pass).
    pub fn triggered(&self) -> &IndexSet<CellKey> {
        self.triggered
    }

    pub fn config(&self) -> &SimConfig {
        self.config
    }
}

/// A recomputation node: pure with respect to its declared inputs.
pub trait DerivationNode {
    fn name(&self) -> &'static str;
    fn inputs(&self) -> &'static [CellKey];
    fn outputs(&self) -> &'static [CellKey];
    /// The scene this node renders into, if any.
    fn scene(&self) -> Option<PlotId> {
        None
    }
    fn compute(&mut self, ctx: &mut NodeCtx<'_>) -> Result<()>;
}

/// Outcome of one propagation pass.
#[derive(Debug, Default)]
pub struct PassReport {
    pub computed: Vec<&'static str>,
    pub skipped_stale: Vec<&'static str>,
    pub failed: Vec<(&'static str, Error)>,
}

impl PassReport {
    pub fn is_empty(&self) -> bool {
        self.computed.is_empty() && self.skipped_stale.is_empty() && self.failed.is_empty()
    }
}

/// The static derivation graph.
pub struct DerivationGraph {
    nodes: Vec<Box<dyn DerivationNode>>,
    /// Topological visit order (producers before consumers).
    order: Vec<usize>,
    /// Input key -> indices of nodes reading it.
    consumers: IndexMap<CellKey, Vec<usize>>,
    dirty: Vec<bool>,
    call_counts: Vec<u64>,
}

impl DerivationGraph {
    /// Build the graph, registering consumers in the store's subscriber
    /// table and failing fast on duplicate producers or cycles.
    pub fn new(nodes: Vec<Box<dyn DerivationNode>>, store: &mut StateStore) -> Result<Self> {
        let mut producers: IndexMap<CellKey, usize> = IndexMap::new();
        for (idx, node) in nodes.iter().enumerate() {
            for &key in node.outputs() {
                if let Some(&existing) = producers.get(&key) {
                    return Err(Error::DuplicateProducer {
                        key,
                        existing: nodes[existing].name(),
                    });
                }
                if let Some(cell) = store.cell(key) {
                    if cell.producer != Producer::Node(node.name()) {
                        return Err(Error::ForbiddenWrite {
                            key,
                            origin: node.name().to_string(),
                        });
                    }
                }
                producers.insert(key, idx);
            }
        }

        let mut consumers: IndexMap<CellKey, Vec<usize>> = IndexMap::new();
        for (idx, node) in nodes.iter().enumerate() {
            for &key in node.inputs() {
                consumers.entry(key).or_default().push(idx);
                store.subscribe(key, node.name());
            }
        }

        let order = topological_order(&nodes, &producers)?;

        let count = nodes.len();
        Ok(Self {
            nodes,
            order,
            consumers,
            dirty: vec![false; count],
            call_counts: vec![0; count],
        })
    }

    /// Times a node's compute has run, for test instrumentation.
    pub fn call_count(&self, name: &str) -> u64 {
        self.nodes
            .iter()
            .position(|n| n.name() == name)
            .map(|idx| self.call_counts[idx])
            .unwrap_or(0)
    }

    /// Run one propagation pass for the given changed keys.
    pub fn propagate(
        &mut self,
        changed: &IndexSet<CellKey>,
        store: &mut StateStore,
        cache: &mut DerivedCache,
        scenes: &mut SceneSet,
        config: &SimConfig,
    ) -> PassReport {
        let mut report = PassReport::default();
        let mut effective = changed.clone();

        for key in changed {
            if let Some(readers) = self.consumers.get(key) {
                for &idx in readers {
                    self.dirty[idx] = true;
                }
            }
        }

        for pos in 0..self.order.len() {
            let idx = self.order[pos];
            if !self.dirty[idx] {
                continue;
            }
            self.dirty[idx] = false;

            let name = self.nodes[idx].name();
            let outputs = self.nodes[idx].outputs();
            let scene_id = self.nodes[idx].scene();

            let stale_input = self.nodes[idx]
                .inputs()
                .iter()
                .any(|&k| store.is_stale(k) || cache.is_stale(k));

            if stale_input {
                for &key in outputs {
                    mark_output_stale(store, cache, key);
                    self.mark_consumers_dirty(key);
                }
                if let Some(scene) = scene_id.and_then(|id| scenes.get_mut(id)) {
                    scene.status = SceneStatus::Stale;
                }
                report.skipped_stale.push(name);
                continue;
            }

            self.call_counts[idx] += 1;
            let (result, changed_outputs) = {
                let mut ctx = NodeCtx {
                    node: name,
                    outputs,
                    store: &mut *store,
                    cache: &mut *cache,
                    scenes: &mut *scenes,
                    config,
                    triggered: &effective,
                    changed_outputs: IndexSet::new(),
                };
                let result = self.nodes[idx].compute(&mut ctx);
                (result, ctx.changed_outputs)
            };
            match result {
                Ok(()) => {
                    if let Some(scene) = scene_id.and_then(|id| scenes.get_mut(id)) {
                        scene.status = SceneStatus::Fresh;
                        scene.revision += 1;
                    }
                    report.computed.push(name);
                    for key in changed_outputs {
                        effective.insert(key);
                        self.mark_consumers_dirty(key);
                    }
                }
                Err(e) => {
                    for &key in outputs {
                        mark_output_stale(store, cache, key);
                        self.mark_consumers_dirty(key);
                    }
                    if let Some(scene) = scene_id.and_then(|id| scenes.get_mut(id)) {
                        scene.status = SceneStatus::Failed;
                    }
                    log::warn!("derivation node {} failed: {}", name, e);
                    report.failed.push((name, e));
                }
            }
        }

        // Dirty bookkeeping never outlives a pass.
        for flag in &mut self.dirty {
            *flag = false;
        }
        report
    }

    fn mark_consumers_dirty(&mut self, key: CellKey) {
        if let Some(readers) = self.consumers.get(&key) {
            for &idx in readers {
                self.dirty[idx] = true;
            }
        }
    }
}

/// Scalar keys go stale in the store, typed keys in the derived cache.
fn mark_output_stale(store: &mut StateStore, cache: &mut DerivedCache, key: CellKey) {
    if store.cell(key).is_some() {
        store.mark_stale(key);
    } else {
        cache.mark_stale(key);
    }
}

/// Kahn's algorithm over node-to-node edges implied by key production.
fn topological_order(
    nodes: &[Box<dyn DerivationNode>],
    producers: &IndexMap<CellKey, usize>,
) -> Result<Vec<usize>> {
    let count = nodes.len();
    let mut in_degree = vec![0usize; count];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];

    for (idx, node) in nodes.iter().enumerate() {
        for key in node.inputs() {
            if let Some(&producer) = producers.get(key) {
                in_degree[idx] += 1;
                dependents[producer].push(idx);
            }
        }
    }

    let mut queue: Vec<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(count);
    let mut head = 0;
    while head < queue.len() {
        let idx = queue[head];
        head += 1;
        order.push(idx);
        for &dep in &dependents[idx] {
            in_degree[dep] -= 1;
            if in_degree[dep] == 0 {
                queue.push(dep);
            }
        }
    }

    if order.len() != count {
        let cycle: Vec<&'static str> = (0..count)
            .filter(|&i| in_degree[i] > 0)
            .map(|i| nodes[i].name())
            .collect();
        return Err(Error::CycleDetected { nodes: cycle });
    }
    Ok(order)
}
