//! Shared template interface over both format generations.
//!
//! Callers switch on the format once, at parse time, and work through
//! [`TemplateView`] afterwards.
use serde::{Deserialize, Serialize};
use std::fmt;

use flix_core::OperationKind;

use crate::messages::Message;
use crate::{v1, v2};

pub use crate::v2::{DependencyPin, NetworkPin};

/// Supported template generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormatVersion {
    /// `f_version` 1.0.0: name-keyed arguments, inline pins
    V1,
    /// `f_version` 1.1.0: ordered parameters, recursive pin trees
    #[default]
    V2,
}

impl FormatVersion {
    pub fn version_tag(&self) -> &'static str {
        match self {
            Self::V1 => v1::F_VERSION,
            Self::V2 => v2::F_VERSION,
        }
    }

    pub fn from_version_tag(tag: &str) -> Option<Self> {
        match tag {
            v1::F_VERSION => Some(Self::V1),
            v2::F_VERSION => Some(Self::V2),
            _ => None,
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.version_tag())
    }
}

/// A parameter, input or output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub label: String,
    pub index: usize,
    pub type_name: String,
    pub messages: Vec<Message>,
    pub is_output: bool,
    /// 1.0.0 only: contract whose balance the argument spends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
}

/// Pin data recorded for one dependency on one network.
/// Block height and pin always travel together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinRecord {
    pub block_height: u64,
    pub pin: String,
    /// Full tree, only carried by formats that store it
    pub tree: Option<DependencyPin>,
}

impl PinRecord {
    pub fn from_tree(block_height: u64, tree: DependencyPin) -> Self {
        Self {
            block_height,
            pin: tree.pin.clone(),
            tree: Some(tree),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEntry {
    pub network: String,
    pub address: String,
    pub pin: Option<PinRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyInfo {
    pub contract: String,
    pub networks: Vec<NetworkEntry>,
}

impl DependencyInfo {
    pub fn network(&self, name: &str) -> Option<&NetworkEntry> {
        self.networks.iter().find(|n| n.network == name)
    }
}

/// Logical accessors both generations answer identically.
pub trait TemplateView {
    fn format(&self) -> FormatVersion;
    fn id(&self) -> &str;
    fn kind(&self) -> Option<OperationKind>;
    fn interface(&self) -> &str;
    fn messages(&self) -> Vec<Message>;
    fn raw_source(&self) -> &str;
    /// Input parameters in index order
    fn parameters(&self) -> Vec<ParameterInfo>;
    fn output(&self) -> Option<ParameterInfo>;
    fn dependencies(&self) -> Vec<DependencyInfo>;
    fn network_pins(&self) -> Vec<NetworkPin>;

    fn is_read_only(&self) -> bool {
        self.kind().is_some_and(|k| k.is_read_only())
    }

    fn is_mutating(&self) -> bool {
        self.kind() == Some(OperationKind::Transaction)
    }
}

/// A template of either generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InteractionTemplate {
    V1(v1::FlowInteractionTemplate),
    V2(v2::InteractionTemplate),
}

impl InteractionTemplate {
    fn view(&self) -> &dyn TemplateView {
        match self {
            Self::V1(t) => t,
            Self::V2(t) => t,
        }
    }

    pub(crate) fn set_id(&mut self, id: String) {
        match self {
            Self::V1(t) => t.id = id,
            Self::V2(t) => t.id = id,
        }
    }

    /// Stores network pins. v1 documents have no slot for them, so this is a
    /// no-op there.
    pub fn set_network_pins(&mut self, mut pins: Vec<NetworkPin>) {
        if let Self::V2(t) = self {
            pins.sort_by(|a, b| a.network.cmp(&b.network));
            t.data.cadence.network_pins = pins;
        }
    }
}

impl TemplateView for InteractionTemplate {
    fn format(&self) -> FormatVersion {
        self.view().format()
    }
    fn id(&self) -> &str {
        self.view().id()
    }
    fn kind(&self) -> Option<OperationKind> {
        self.view().kind()
    }
    fn interface(&self) -> &str {
        self.view().interface()
    }
    fn messages(&self) -> Vec<Message> {
        self.view().messages()
    }
    fn raw_source(&self) -> &str {
        self.view().raw_source()
    }
    fn parameters(&self) -> Vec<ParameterInfo> {
        self.view().parameters()
    }
    fn output(&self) -> Option<ParameterInfo> {
        self.view().output()
    }
    fn dependencies(&self) -> Vec<DependencyInfo> {
        self.view().dependencies()
    }
    fn network_pins(&self) -> Vec<NetworkPin> {
        self.view().network_pins()
    }
}

/// Format-neutral template contents, assembled by the builder before the
/// physical document is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TemplateDraft {
    pub format: FormatVersion,
    pub kind: Option<OperationKind>,
    pub interface: String,
    pub messages: Vec<Message>,
    pub body: String,
    pub dependencies: Vec<DependencyInfo>,
    pub parameters: Vec<ParameterInfo>,
    pub output: Option<ParameterInfo>,
}

impl TemplateDraft {
    /// Lays the draft out as a document of its format. The id stays empty.
    pub fn into_template(self) -> InteractionTemplate {
        match self.format {
            FormatVersion::V1 => InteractionTemplate::V1(v1::FlowInteractionTemplate::from_draft(self)),
            FormatVersion::V2 => InteractionTemplate::V2(v2::InteractionTemplate::from_draft(self)),
        }
    }
}
