//! Behavior and parameter driver types.
//!
//! A driver is a behavior that writes parameter values when its node becomes
//! active. The builder never matches on [`Behavior`] itself; it reaches
//! drivers only through a [`DriverSink`](crate::sink::DriverSink).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::BehaviorId;

/// How a driver entry writes its target parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverMode {
    /// Write `value`.
    Set,
    /// Add `value` to the current value.
    Add,
    /// Write a random value (range for numbers, chance for bools).
    Random,
    /// Copy the value of `source`.
    Copy,
}

impl fmt::Display for DriverMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set => write!(f, "set"),
            Self::Add => write!(f, "add"),
            Self::Random => write!(f, "random"),
            Self::Copy => write!(f, "copy"),
        }
    }
}

/// One write performed by a driver.
///
/// Constructors zero the fields a mode does not use, so two entries that
/// describe the same write compare equal field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEntry {
    /// Write mode.
    pub mode: DriverMode,
    /// Parameter written.
    pub target: String,
    /// Value for `Set`, `Add` and `Copy`.
    pub value: f32,
    /// Lower bound for numeric `Random`.
    pub value_min: f32,
    /// Upper bound for numeric `Random`.
    pub value_max: f32,
    /// Probability of `true` for boolean `Random`.
    pub chance: f32,
    /// Source parameter for `Copy`.
    pub source: Option<String>,
    /// Only apply for the local actor.
    pub local_only: bool,
}

impl ParameterEntry {
    fn blank(mode: DriverMode, target: impl Into<String>) -> Self {
        Self {
            mode,
            target: target.into(),
            value: 0.0,
            value_min: 0.0,
            value_max: 0.0,
            chance: 0.0,
            source: None,
            local_only: false,
        }
    }

    /// `Set(target, value)`.
    pub fn set(target: impl Into<String>, value: f32) -> Self {
        Self { value, ..Self::blank(DriverMode::Set, target) }
    }

    /// `Add(target, value)`.
    pub fn add(target: impl Into<String>, value: f32) -> Self {
        Self { value, ..Self::blank(DriverMode::Add, target) }
    }

    /// Random number in `[min, max]`.
    pub fn random_range(target: impl Into<String>, min: f32, max: f32) -> Self {
        Self { value_min: min, value_max: max, ..Self::blank(DriverMode::Random, target) }
    }

    /// Random bool that is `true` with probability `chance`.
    pub fn random_chance(target: impl Into<String>, chance: f32) -> Self {
        Self { chance, ..Self::blank(DriverMode::Random, target) }
    }

    /// Copy `source` into `target`.
    pub fn copy(target: impl Into<String>, source: impl Into<String>) -> Self {
        Self { source: Some(source.into()), ..Self::blank(DriverMode::Copy, target) }
    }

    /// Mark the entry as local-only.
    pub fn local_only(mut self, local_only: bool) -> Self {
        self.local_only = local_only;
        self
    }

    /// Zero the fields this entry's mode ignores.
    pub fn normalized(mut self) -> Self {
        match self.mode {
            DriverMode::Set | DriverMode::Add => {
                self.value_min = 0.0;
                self.value_max = 0.0;
                self.chance = 0.0;
                self.source = None;
            }
            DriverMode::Random => {
                self.value = 0.0;
                self.source = None;
            }
            DriverMode::Copy => {
                self.value_min = 0.0;
                self.value_max = 0.0;
                self.chance = 0.0;
                if self.source.as_deref().is_some_and(|s| s.trim().is_empty()) {
                    self.source = None;
                }
            }
        }
        self
    }

    /// Field-by-field identity with approximate float comparison.
    pub fn is_identical(&self, other: &ParameterEntry) -> bool {
        self.mode == other.mode
            && self.target == other.target
            && self.local_only == other.local_only
            && self.source == other.source
            && approx_eq(self.value, other.value)
            && approx_eq(self.value_min, other.value_min)
            && approx_eq(self.value_max, other.value_max)
            && approx_eq(self.chance, other.chance)
    }
}

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
}

/// An ordered list of parameter writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    /// Entries in execution order.
    pub entries: Vec<ParameterEntry>,
}

impl Driver {
    /// Create an empty driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an identical entry is already present.
    pub fn contains(&self, entry: &ParameterEntry) -> bool {
        self.entries.iter().any(|e| e.is_identical(entry))
    }

    /// Append `entry` unless an identical one exists. Returns `true` if appended.
    pub fn append_if_absent(&mut self, entry: ParameterEntry) -> bool {
        let entry = entry.normalized();
        if self.contains(&entry) {
            return false;
        }
        self.entries.push(entry);
        true
    }
}

/// A behavior instance stored in the document's behavior arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Behavior {
    /// Parameter driver.
    ParameterDriver {
        /// Instance id.
        id: BehaviorId,
        /// Driver payload.
        driver: Driver,
    },
    /// Any other host behavior, carried opaquely.
    Opaque {
        /// Instance id.
        id: BehaviorId,
        /// Host type name.
        type_name: String,
        /// Serialized host data.
        #[serde(default)]
        data: serde_json::Value,
    },
}

impl Behavior {
    /// Instance id.
    pub fn id(&self) -> BehaviorId {
        match self {
            Self::ParameterDriver { id, .. } | Self::Opaque { id, .. } => *id,
        }
    }
}
