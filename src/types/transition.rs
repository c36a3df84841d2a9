//! Transition and guard types.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::NodeId;

/// A condition that must hold for a transition to fire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Guard {
    /// Int parameter equals a value.
    Equals {
        /// Parameter name.
        parameter: String,
        /// Required value.
        value: i32,
    },
    /// Bool parameter has the expected value.
    BoolIs {
        /// Parameter name.
        parameter: String,
        /// Required value.
        expected: bool,
    },
}

impl Guard {
    /// Create an int equality guard.
    pub fn equals(parameter: impl Into<String>, value: i32) -> Self {
        Self::Equals { parameter: parameter.into(), value }
    }

    /// Create a bool guard.
    pub fn bool_is(parameter: impl Into<String>, expected: bool) -> Self {
        Self::BoolIs { parameter: parameter.into(), expected }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { parameter, value } => write!(f, "{} == {}", parameter, value),
            Self::BoolIs { parameter, expected: true } => write!(f, "{}", parameter),
            Self::BoolIs { parameter, expected: false } => write!(f, "!{}", parameter),
        }
    }
}

/// Directed transition between two nodes, owned by its source node.
///
/// All guards are combined conjunctively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Source node (the owner).
    pub source: NodeId,
    /// Destination node.
    pub destination: NodeId,
    /// Guard conditions, all of which must hold.
    pub conditions: Vec<Guard>,
    /// Whether the transition waits for an exit time.
    pub has_exit_time: bool,
    /// Normalized exit time, used when `has_exit_time` is set.
    pub exit_time: f32,
    /// Whether `duration` is in seconds rather than normalized time.
    pub has_fixed_duration: bool,
    /// Blend duration.
    pub duration: f32,
    /// Normalized start offset in the destination.
    pub offset: f32,
}

impl Transition {
    /// An unguarded transition with no exit time and a fixed zero duration.
    pub fn instant(source: NodeId, destination: NodeId) -> Self {
        Self {
            source,
            destination,
            conditions: Vec::new(),
            has_exit_time: false,
            exit_time: 0.0,
            has_fixed_duration: true,
            duration: 0.0,
            offset: 0.0,
        }
    }

    /// Add guards to the transition.
    pub fn with_conditions(mut self, conditions: Vec<Guard>) -> Self {
        self.conditions = conditions;
        self
    }

    /// Copy timing (exit time, duration, offset) from another transition.
    pub fn copy_timing_from(&mut self, other: &Transition) {
        self.has_exit_time = other.has_exit_time;
        self.exit_time = other.exit_time;
        self.has_fixed_duration = other.has_fixed_duration;
        self.duration = other.duration;
        self.offset = other.offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instant_defaults() {
        let t = Transition::instant(NodeId::new(1), NodeId::new(2));
        assert!(!t.has_exit_time);
        assert!(t.has_fixed_duration);
        assert_eq!(t.duration, 0.0);
        assert!(t.conditions.is_empty());
    }

    #[test]
    fn test_copy_timing() {
        let mut source = Transition::instant(NodeId::new(1), NodeId::new(2));
        source.has_exit_time = true;
        source.exit_time = 0.75;
        source.has_fixed_duration = false;
        source.duration = 0.25;
        source.offset = 0.1;

        let mut target = Transition::instant(NodeId::new(3), NodeId::new(4))
            .with_conditions(vec![Guard::equals("Sync", 4)]);
        target.copy_timing_from(&source);

        assert!(target.has_exit_time);
        assert_eq!(target.exit_time, 0.75);
        assert!(!target.has_fixed_duration);
        assert_eq!(target.duration, 0.25);
        assert_eq!(target.offset, 0.1);
        // Guards and endpoints stay
        assert_eq!(target.conditions, vec![Guard::equals("Sync", 4)]);
        assert_eq!(target.destination, NodeId::new(4));
    }

    #[test]
    fn test_guard_display() {
        assert_eq!(Guard::equals("Sync", 3).to_string(), "Sync == 3");
        assert_eq!(Guard::bool_is("Bit0", true).to_string(), "Bit0");
        assert_eq!(Guard::bool_is("Bit1", false).to_string(), "!Bit1");
    }
}
