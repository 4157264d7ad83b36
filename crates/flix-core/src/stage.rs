//! Build State: as etapas de um build, em ordem
use std::fmt;

/// Lifecycle of one template build. Each transition belongs to exactly one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildState {
    Empty,
    MetadataFilled,
    DependenciesResolved,
    NetworkPinsComputed,
    Identified,
}

impl BuildState {
    /// The state that follows this one, `None` once identified.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Empty => Some(Self::MetadataFilled),
            Self::MetadataFilled => Some(Self::DependenciesResolved),
            Self::DependenciesResolved => Some(Self::NetworkPinsComputed),
            Self::NetworkPinsComputed => Some(Self::Identified),
            Self::Identified => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Identified
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Empty => "empty",
            Self::MetadataFilled => "metadata_filled",
            Self::DependenciesResolved => "dependencies_resolved",
            Self::NetworkPinsComputed => "network_pins_computed",
            Self::Identified => "identified",
        };
        f.write_str(s)
    }
}
