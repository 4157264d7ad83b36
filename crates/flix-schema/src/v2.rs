//! Format generation 1.1.0: ordered parameters, dependency pin trees and
//! per-network pins of the import-substituted body.
use serde::{Deserialize, Serialize};

use flix_core::{OperationKind, F_TYPE};

use crate::messages::{null_as_default, Message};
use crate::template::{
    DependencyInfo, FormatVersion, NetworkEntry, ParameterInfo, PinRecord, TemplateDraft, TemplateView,
};

pub const F_VERSION: &str = "1.1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionTemplate {
    pub f_type: String,
    pub f_version: String,
    #[serde(default)]
    pub id: String,
    pub data: Data,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    pub r#type: String,
    #[serde(default)]
    pub interface: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<Message>,
    pub cadence: Cadence,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dependencies: Vec<Dependency>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cadence {
    pub body: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub network_pins: Vec<NetworkPin>,
}

/// Hash of the body with every import substituted for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPin {
    pub network: String,
    pub pin_self: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(default, deserialize_with = "null_as_default")]
    pub contracts: Vec<Contract>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub contract: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub networks: Vec<Network>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub network: String,
    pub address: String,
    #[serde(default)]
    pub dependency_pin_block_height: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_pin: Option<DependencyPin>,
}

/// Recursive pin node for one deployed contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyPin {
    /// Hash of `pin_self` followed by every child's `pin`, in import order
    pub pin: String,
    /// Hash of this contract's own deployed source
    pub pin_self: String,
    pub pin_contract_name: String,
    pub pin_contract_address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub imports: Vec<DependencyPin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub label: String,
    #[serde(default)]
    pub index: usize,
    pub r#type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<Message>,
}

impl Parameter {
    fn from_info(info: &ParameterInfo) -> Self {
        Self {
            label: info.label.clone(),
            index: info.index,
            r#type: info.type_name.clone(),
            messages: info.messages.clone(),
        }
    }

    fn to_info(&self, is_output: bool) -> ParameterInfo {
        ParameterInfo {
            label: self.label.clone(),
            index: self.index,
            type_name: self.r#type.clone(),
            messages: self.messages.clone(),
            is_output,
            balance: None,
        }
    }
}

impl InteractionTemplate {
    pub(crate) fn from_draft(draft: TemplateDraft) -> Self {
        let dependencies = draft
            .dependencies
            .iter()
            .map(|dep| Dependency {
                contracts: vec![Contract {
                    contract: dep.contract.clone(),
                    networks: dep
                        .networks
                        .iter()
                        .map(|entry| {
                            let tree = entry.pin.as_ref().and_then(|p| p.tree.clone());
                            Network {
                                network: entry.network.clone(),
                                address: entry.address.clone(),
                                dependency_pin_block_height: tree
                                    .as_ref()
                                    .and(entry.pin.as_ref())
                                    .map(|p| p.block_height)
                                    .unwrap_or(0),
                                dependency_pin: tree,
                            }
                        })
                        .collect(),
                }],
            })
            .collect();

        Self {
            f_type: F_TYPE.to_string(),
            f_version: F_VERSION.to_string(),
            id: String::new(),
            data: Data {
                r#type: draft.kind.map(|k| k.as_str().to_string()).unwrap_or_default(),
                interface: draft.interface,
                messages: draft.messages,
                cadence: Cadence {
                    body: draft.body,
                    network_pins: Vec::new(),
                },
                dependencies,
                parameters: draft.parameters.iter().map(Parameter::from_info).collect(),
                output: draft.output.as_ref().map(Parameter::from_info),
            },
        }
    }
}

impl TemplateView for InteractionTemplate {
    fn format(&self) -> FormatVersion {
        FormatVersion::V2
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> Option<OperationKind> {
        OperationKind::from_type_tag(&self.data.r#type)
    }

    fn interface(&self) -> &str {
        &self.data.interface
    }

    fn messages(&self) -> Vec<Message> {
        self.data.messages.clone()
    }

    fn raw_source(&self) -> &str {
        &self.data.cadence.body
    }

    fn parameters(&self) -> Vec<ParameterInfo> {
        let mut params: Vec<ParameterInfo> = self.data.parameters.iter().map(|p| p.to_info(false)).collect();
        params.sort_by_key(|p| p.index);
        params
    }

    fn output(&self) -> Option<ParameterInfo> {
        self.data.output.as_ref().map(|p| p.to_info(true))
    }

    fn dependencies(&self) -> Vec<DependencyInfo> {
        self.data
            .dependencies
            .iter()
            .flat_map(|dep| dep.contracts.iter())
            .map(|contract| DependencyInfo {
                contract: contract.contract.clone(),
                networks: contract
                    .networks
                    .iter()
                    .map(|n| NetworkEntry {
                        network: n.network.clone(),
                        address: n.address.clone(),
                        pin: n
                            .dependency_pin
                            .clone()
                            .map(|tree| PinRecord::from_tree(n.dependency_pin_block_height, tree)),
                    })
                    .collect(),
            })
            .collect()
    }

    fn network_pins(&self) -> Vec<NetworkPin> {
        self.data.cadence.network_pins.clone()
    }
}
