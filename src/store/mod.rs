//! Shared state store: named scalar cells with scoped lifetime.
//!
//! Every user-facing quantity lives in a cell addressed by a stable key.
//! Each cell has exactly one declared producer; writes are atomic per key
//! and a write of an equal value is a no-op that triggers no propagation.

pub mod persist;

use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::error::{Error, Result};

/// Identifies a state cell or derived product in the dependency namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey(pub &'static str);

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Well-known keys, matching the store ids exposed to the display surface.
pub mod keys {
    use super::CellKey;

    pub const YEAR: CellKey = CellKey("year");
    pub const MONTH: CellKey = CellKey("month");
    pub const DAY: CellKey = CellKey("day");
    pub const HOUR: CellKey = CellKey("hour");
    pub const MINUTE: CellKey = CellKey("minute");
    pub const SECOND: CellKey = CellKey("second");

    pub const TARGET_X: CellKey = CellKey("target-x");
    pub const TARGET_Y: CellKey = CellKey("target-y");
    pub const TARGET_Z: CellKey = CellKey("target-z");
    pub const TARGET_VX: CellKey = CellKey("target-vx");
    pub const TARGET_VY: CellKey = CellKey("target-vy");
    pub const TARGET_VZ: CellKey = CellKey("target-vz");

    pub const R_POS: CellKey = CellKey("r-pos");
    pub const I_POS: CellKey = CellKey("i-pos");
    pub const C_POS: CellKey = CellKey("c-pos");
    pub const R_VEL: CellKey = CellKey("r-vel");
    pub const I_VEL: CellKey = CellKey("i-vel");
    pub const C_VEL: CellKey = CellKey("c-vel");

    pub const SMA: CellKey = CellKey("sma");
    pub const CHASE_X: CellKey = CellKey("chase-x");
    pub const CHASE_Y: CellKey = CellKey("chase-y");
    pub const CHASE_Z: CellKey = CellKey("chase-z");
    pub const CHASE_VX: CellKey = CellKey("chase-vx");
    pub const CHASE_VY: CellKey = CellKey("chase-vy");
    pub const CHASE_VZ: CellKey = CellKey("chase-vz");

    pub const IMG_DIAMETER: CellKey = CellKey("img-diameter");
    pub const FOCAL_LENGTH: CellKey = CellKey("focal-length");
    pub const SENSOR_X: CellKey = CellKey("sensor-x");
    pub const SENSOR_Y: CellKey = CellKey("sensor-y");

    /// Typed products exchanged between nodes (no scalar cell backing).
    pub const TARGET_STATE: CellKey = CellKey("target-state");
    pub const CHASE_STATE: CellKey = CellKey("chase-state");

    pub const EPOCH: [CellKey; 6] = [YEAR, MONTH, DAY, HOUR, MINUTE, SECOND];
    pub const TARGET: [CellKey; 6] = [TARGET_X, TARGET_Y, TARGET_Z, TARGET_VX, TARGET_VY, TARGET_VZ];
    pub const RELATIVE: [CellKey; 6] = [R_POS, I_POS, C_POS, R_VEL, I_VEL, C_VEL];
    pub const CHASE: [CellKey; 6] = [CHASE_X, CHASE_Y, CHASE_Z, CHASE_VX, CHASE_VY, CHASE_VZ];
    pub const INSTRUMENT: [CellKey; 4] = [IMG_DIAMETER, FOCAL_LENGTH, SENSOR_X, SENSOR_Y];
}

/// Cell lifetime: session cells reset every run, persistent cells are
/// saved to the state file and restored at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Session,
    Persistent,
}

/// Who is allowed to write a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Producer {
    /// The validated external input path.
    Input,
    /// A derivation node, by name.
    Node(&'static str),
}

impl fmt::Display for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Producer::Input => f.write_str("input"),
            Producer::Node(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StateCell {
    pub value: f64,
    pub default: f64,
    pub scope: Scope,
    pub producer: Producer,
    pub stale: bool,
}

/// Outcome of a write: whether the stored value actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Changed,
    Unchanged,
}

/// Arena of named cells plus an explicit subscriber table.
#[derive(Debug, Default)]
pub struct StateStore {
    cells: IndexMap<CellKey, StateCell>,
    subscribers: IndexMap<CellKey, IndexSet<&'static str>>,
}

impl StateStore {
    /// Define a cell with its default value, scope and producer.
    pub fn define(
        &mut self,
        key: CellKey,
        default: f64,
        scope: Scope,
        producer: Producer,
    ) -> Result<()> {
        if self.cells.contains_key(&key) {
            return Err(Error::DuplicateCell(key));
        }
        self.cells.insert(
            key,
            StateCell {
                value: default,
                default,
                scope,
                producer,
                stale: false,
            },
        );
        Ok(())
    }

    pub fn read(&self, key: CellKey) -> Result<f64> {
        self.cells
            .get(&key)
            .map(|c| c.value)
            .ok_or(Error::UnknownCell(key))
    }

    pub fn cell(&self, key: CellKey) -> Option<&StateCell> {
        self.cells.get(&key)
    }

    pub fn is_stale(&self, key: CellKey) -> bool {
        self.cells.get(&key).map(|c| c.stale).unwrap_or(false)
    }

    /// Write a value on behalf of `origin`. Only the declared producer may
    /// write; an equal value is a no-op. A successful write clears the
    /// stale flag.
    pub fn write(&mut self, origin: Producer, key: CellKey, value: f64) -> Result<WriteOutcome> {
        if !value.is_finite() {
            return Err(Error::NonFiniteValue { key });
        }
        let cell = self.cells.get_mut(&key).ok_or(Error::UnknownCell(key))?;
        if cell.producer != origin {
            return Err(Error::ForbiddenWrite {
                key,
                origin: origin.to_string(),
            });
        }
        if cell.value == value && !cell.stale {
            return Ok(WriteOutcome::Unchanged);
        }
        cell.value = value;
        cell.stale = false;
        Ok(WriteOutcome::Changed)
    }

    pub fn mark_stale(&mut self, key: CellKey) {
        if let Some(cell) = self.cells.get_mut(&key) {
            cell.stale = true;
        }
    }

    /// Register a consumer of `key`; part of the subscribe contract.
    pub fn subscribe(&mut self, key: CellKey, consumer: &'static str) {
        self.subscribers.entry(key).or_default().insert(consumer);
    }

    pub fn subscribers(&self, key: CellKey) -> Option<&IndexSet<&'static str>> {
        self.subscribers.get(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = CellKey> + '_ {
        self.cells.keys().copied()
    }

    /// Persistent-scoped cells as `(name, value)` pairs for the state file.
    pub fn persistent_values(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.cells
            .iter()
            .filter(|(_, c)| c.scope == Scope::Persistent)
            .map(|(k, c)| (k.0, c.value))
    }

    /// Restore a persistent cell from the state file. Unknown names,
    /// session cells and non-finite values are ignored.
    pub fn restore(&mut self, name: &str, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        for (key, cell) in self.cells.iter_mut() {
            if key.0 == name && cell.scope == Scope::Persistent {
                cell.value = value;
                return true;
            }
        }
        false
    }
}
