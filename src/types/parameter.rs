//! Document parameter types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a document parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Integer parameter.
    Int,
    /// Boolean parameter.
    Bool,
    /// Floating point parameter.
    Float,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Bool => write!(f, "bool"),
            Self::Float => write!(f, "float"),
        }
    }
}

/// A named parameter. Names are unique within a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter kind.
    pub kind: ParameterKind,
}

impl Parameter {
    /// Create a new parameter.
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self { name: name.into(), kind }
    }
}
