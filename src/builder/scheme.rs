//! Resolved encoding: which parameters carry a code and how.

use crate::codec;
use crate::types::{Guard, ParameterEntry, ParameterKind};

/// Encoding fixed for the duration of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GuardScheme {
    /// Shared int parameter.
    Int { parameter: String },
    /// One boolean per bit, least significant first.
    Bits { parameters: Vec<String> },
}

impl GuardScheme {
    /// Guards that hold exactly when the parameters carry `code`.
    pub(crate) fn guards(&self, code: u32) -> Vec<Guard> {
        match self {
            Self::Int { parameter } => vec![Guard::equals(parameter.clone(), code as i32)],
            Self::Bits { parameters } => parameters
                .iter()
                .zip(codec::encode(code as i32, parameters.len()))
                .map(|(name, bit)| Guard::bool_is(name.clone(), bit))
                .collect(),
        }
    }

    /// Driver entries that make the parameters carry `code`.
    pub(crate) fn driver_entries(&self, code: u32) -> Vec<ParameterEntry> {
        match self {
            Self::Int { parameter } => vec![ParameterEntry::set(parameter.clone(), code as f32)],
            Self::Bits { parameters } => parameters
                .iter()
                .zip(codec::encode(code as i32, parameters.len()))
                .map(|(name, bit)| ParameterEntry::set(name.clone(), if bit { 1.0 } else { 0.0 }))
                .collect(),
        }
    }

    /// Parameters the scheme needs, with their kinds.
    pub(crate) fn parameters(&self) -> Vec<(&str, ParameterKind)> {
        match self {
            Self::Int { parameter } => vec![(parameter.as_str(), ParameterKind::Int)],
            Self::Bits { parameters } => parameters
                .iter()
                .map(|p| (p.as_str(), ParameterKind::Bool))
                .collect(),
        }
    }

    /// Bit width, `None` for the int scheme.
    pub(crate) fn bit_width(&self) -> Option<usize> {
        match self {
            Self::Int { .. } => None,
            Self::Bits { parameters } => Some(parameters.len()),
        }
    }

    /// Whether `code` can be expressed.
    pub(crate) fn can_represent(&self, code: u32) -> bool {
        match self {
            Self::Int { .. } => true,
            Self::Bits { parameters } => codec::is_representable(code, parameters.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(names: &[&str]) -> GuardScheme {
        GuardScheme::Bits { parameters: names.iter().map(|s| s.to_string()).collect() }
    }

    #[test]
    fn test_int_guards() {
        let scheme = GuardScheme::Int { parameter: "Sync".to_string() };
        assert_eq!(scheme.guards(4), vec![Guard::equals("Sync", 4)]);
        assert_eq!(scheme.driver_entries(4), vec![ParameterEntry::set("Sync", 4.0)]);
        assert_eq!(scheme.bit_width(), None);
    }

    #[test]
    fn test_bit_guards_least_significant_first() {
        let scheme = bits(&["B0", "B1", "B2"]);
        // 6 = 0b110
        assert_eq!(
            scheme.guards(6),
            vec![Guard::bool_is("B0", false), Guard::bool_is("B1", true), Guard::bool_is("B2", true)]
        );
        assert_eq!(
            scheme.driver_entries(6),
            vec![
                ParameterEntry::set("B0", 0.0),
                ParameterEntry::set("B1", 1.0),
                ParameterEntry::set("B2", 1.0),
            ]
        );
    }

    #[test]
    fn test_representability() {
        let scheme = bits(&["B0", "B1"]);
        assert!(scheme.can_represent(3));
        assert!(!scheme.can_represent(4));
        assert!(bits(&[]).can_represent(0));
    }

    #[test]
    fn test_parameter_kinds() {
        assert_eq!(bits(&["B0"]).parameters(), vec![("B0", ParameterKind::Bool)]);
    }
}
