//! Core types for the state graph document.

pub mod ids;
pub mod node;
pub mod transition;
pub mod parameter;
pub mod driver;

pub use ids::{NodeId, GraphId, BehaviorId};
pub use node::{Node, StateGraph, Layer, Position};
pub use transition::{Transition, Guard};
pub use parameter::{Parameter, ParameterKind};
pub use driver::{Behavior, Driver, DriverMode, ParameterEntry};
