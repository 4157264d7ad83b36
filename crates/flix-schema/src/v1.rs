//! Format generation 1.0.0: arguments keyed by name, dependencies keyed by
//! the import placeholder, pins stored inline per network.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use flix_core::{bare_address, OperationKind, F_TYPE};

use crate::messages::{null_as_default, I18n, Message};
use crate::template::{
    DependencyInfo, FormatVersion, NetworkEntry, NetworkPin, ParameterInfo, PinRecord, TemplateDraft, TemplateView,
};

pub const F_VERSION: &str = "1.0.0";

/// Placeholder -> contract name -> network name -> deployment
pub type Dependencies = BTreeMap<String, BTreeMap<String, BTreeMap<String, Network>>>;
pub type Arguments = BTreeMap<String, Argument>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowInteractionTemplate {
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
    #[serde(default)]
    pub messages: Messages,
    pub cadence: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dependencies: Dependencies,
    #[serde(default, deserialize_with = "null_as_default")]
    pub arguments: Arguments,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub address: String,
    #[serde(default)]
    pub fq_address: String,
    #[serde(default)]
    pub contract: String,
    #[serde(default)]
    pub pin: String,
    #[serde(default)]
    pub pin_block_height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub index: usize,
    pub r#type: String,
    #[serde(default)]
    pub messages: Messages,
    #[serde(default)]
    pub balance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Messages {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Translations>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Translations>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translations {
    #[serde(default, deserialize_with = "null_as_default")]
    pub i18n: BTreeMap<String, String>,
}

/// Import placeholder used in v1 bodies, e.g. `0xFLOWTOKENADDRESS`.
pub fn placeholder(contract: &str) -> String {
    format!("0x{}ADDRESS", contract.to_uppercase())
}

impl Messages {
    fn from_list(messages: &[Message]) -> Self {
        let collect = |key: &str| {
            let i18n: BTreeMap<String, String> = messages
                .iter()
                .filter(|m| m.key == key)
                .flat_map(|m| m.i18n.iter().map(|t| (t.tag.clone(), t.translation.clone())))
                .collect();
            (!i18n.is_empty()).then_some(Translations { i18n })
        };
        Self {
            title: collect("title"),
            description: collect("description"),
        }
    }

    fn to_list(&self) -> Vec<Message> {
        [("title", &self.title), ("description", &self.description)]
            .into_iter()
            .filter_map(|(key, translations)| {
                translations.as_ref().map(|t| Message {
                    key: key.to_string(),
                    i18n: t
                        .i18n
                        .iter()
                        .map(|(tag, translation)| I18n {
                            tag: tag.clone(),
                            translation: translation.clone(),
                        })
                        .collect(),
                })
            })
            .collect()
    }
}

impl FlowInteractionTemplate {
    pub(crate) fn from_draft(draft: TemplateDraft) -> Self {
        let mut dependencies = Dependencies::new();
        for dep in &draft.dependencies {
            let networks = dep
                .networks
                .iter()
                .map(|entry| {
                    let (pin, pin_block_height) = entry
                        .pin
                        .as_ref()
                        .map(|p| (p.pin.clone(), p.block_height))
                        .unwrap_or_default();
                    let network = Network {
                        address: entry.address.clone(),
                        fq_address: format!("A.{}.{}", bare_address(&entry.address), dep.contract),
                        contract: dep.contract.clone(),
                        pin,
                        pin_block_height,
                    };
                    (entry.network.clone(), network)
                })
                .collect();
            dependencies
                .entry(placeholder(&dep.contract))
                .or_default()
                .insert(dep.contract.clone(), networks);
        }

        let arguments = draft
            .parameters
            .iter()
            .map(|p| {
                let argument = Argument {
                    index: p.index,
                    r#type: p.type_name.clone(),
                    messages: Messages::from_list(&p.messages),
                    balance: p.balance.clone().unwrap_or_default(),
                };
                (p.label.clone(), argument)
            })
            .collect();

        Self {
            f_type: F_TYPE.to_string(),
            f_version: F_VERSION.to_string(),
            id: String::new(),
            data: Data {
                r#type: draft.kind.map(|k| k.as_str().to_string()).unwrap_or_default(),
                interface: draft.interface,
                messages: Messages::from_list(&draft.messages),
                cadence: draft.body,
                dependencies,
                arguments,
            },
        }
    }
}

impl TemplateView for FlowInteractionTemplate {
    fn format(&self) -> FormatVersion {
        FormatVersion::V1
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
        self.data.messages.to_list()
    }

    fn raw_source(&self) -> &str {
        &self.data.cadence
    }

    fn parameters(&self) -> Vec<ParameterInfo> {
        let mut params: Vec<ParameterInfo> = self
            .data
            .arguments
            .iter()
            .map(|(label, arg)| ParameterInfo {
                label: label.clone(),
                index: arg.index,
                type_name: arg.r#type.clone(),
                messages: arg.messages.to_list(),
                is_output: false,
                balance: (!arg.balance.is_empty()).then(|| arg.balance.clone()),
            })
            .collect();
        params.sort_by_key(|p| p.index);
        params
    }

    /// v1 never stores an output; read-only templates get a generic one.
    fn output(&self) -> Option<ParameterInfo> {
        self.is_read_only().then(|| ParameterInfo {
            label: "result".to_string(),
            index: 0,
            type_name: "AnyStruct".to_string(),
            messages: Vec::new(),
            is_output: true,
            balance: None,
        })
    }

    fn dependencies(&self) -> Vec<DependencyInfo> {
        self.data
            .dependencies
            .values()
            .flat_map(|contracts| contracts.iter())
            .map(|(contract, networks)| DependencyInfo {
                contract: contract.clone(),
                networks: networks
                    .iter()
                    .map(|(name, network)| NetworkEntry {
                        network: name.clone(),
                        address: network.address.clone(),
                        pin: (!network.pin.is_empty()).then(|| PinRecord {
                            block_height: network.pin_block_height,
                            pin: network.pin.clone(),
                            tree: None,
                        }),
                    })
                    .collect(),
            })
            .collect()
    }

    fn network_pins(&self) -> Vec<NetworkPin> {
        Vec::new()
    }
}
