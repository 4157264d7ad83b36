//! Contract Registry
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use flix_core::normalize_address;
use flix_schema::{DependencyPin, PinRecord};

/// Deployment of one contract on one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub address: String,
    /// Pin computed ahead of time; reused instead of reading the chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<PinRecord>,
}

/// Network name -> deployment
pub type NetworkAddresses = BTreeMap<String, RegistryEntry>;

/// Caller-supplied addresses: contract name -> network name -> address
pub type ContractOverrides = BTreeMap<String, BTreeMap<String, String>>;

const CORE_CONTRACTS: &[(&str, &[(&str, &str)])] = &[
    (
        "FungibleToken",
        &[
            ("emulator", "0xee82856bf20e2aa6"),
            ("mainnet", "0xf233dcee88fe0abe"),
            ("testnet", "0x9a0766d93b6608b7"),
        ],
    ),
    (
        "NonFungibleToken",
        &[
            ("emulator", "0xf8d6e0586b0a20c7"),
            ("mainnet", "0x1d7e57aa55817448"),
            ("testnet", "0x631e88ae7f1d7c20"),
        ],
    ),
    (
        "MetadataViews",
        &[("mainnet", "0x1d7e57aa55817448"), ("testnet", "0x631e88ae7f1d7c20")],
    ),
    (
        "FlowToken",
        &[
            ("emulator", "0x0ae53cb6e3f42a79"),
            ("mainnet", "0x1654653399040a61"),
            ("testnet", "0x7e60df042a9c0868"),
        ],
    ),
];

/// Read-only lookup from contract name to its per-network deployments.
///
/// Built once, then shared (behind an `Arc`) by every build that needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRegistry {
    contracts: BTreeMap<String, NetworkAddresses>,
}

impl ContractRegistry {
    /// Registry holding no contracts at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The well-known core contracts.
    pub fn core() -> Self {
        let contracts = CORE_CONTRACTS
            .iter()
            .map(|(name, networks)| {
                let networks = networks
                    .iter()
                    .map(|(network, address)| (network.to_string(), RegistryEntry::unpinned(address)))
                    .collect();
                (name.to_string(), networks)
            })
            .collect();
        Self { contracts }
    }

    /// Core contracts merged with `overrides`. A caller entry replaces the
    /// core entry of the same name entirely.
    pub fn with_core(overrides: &ContractOverrides) -> Self {
        Self::core().with_overrides(overrides)
    }

    pub fn with_overrides(mut self, overrides: &ContractOverrides) -> Self {
        for (name, networks) in overrides {
            let networks = networks
                .iter()
                .map(|(network, address)| (network.clone(), RegistryEntry::unpinned(address)))
                .collect();
            self.contracts.insert(name.clone(), networks);
        }
        self
    }

    /// Adds or replaces one network deployment.
    pub fn with_contract(mut self, name: &str, network: &str, address: &str) -> Self {
        self.contracts
            .entry(name.to_string())
            .or_default()
            .insert(network.to_string(), RegistryEntry::unpinned(address));
        self
    }

    /// Adds a deployment whose pin tree is already known.
    pub fn with_pinned(mut self, name: &str, network: &str, address: &str, block_height: u64, tree: DependencyPin) -> Self {
        let entry = RegistryEntry {
            address: normalize_address(address),
            pin: Some(PinRecord::from_tree(block_height, tree)),
        };
        self.contracts
            .entry(name.to_string())
            .or_default()
            .insert(network.to_string(), entry);
        self
    }

    pub fn resolve(&self, name: &str) -> Option<&NetworkAddresses> {
        self.contracts.get(name)
    }

    pub fn entry(&self, name: &str, network: &str) -> Option<&RegistryEntry> {
        self.resolve(name).and_then(|networks| networks.get(network))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.contracts.contains_key(name)
    }

    pub fn contract_names(&self) -> impl Iterator<Item = &str> {
        self.contracts.keys().map(String::as_str)
    }

    /// Plain address table, without pins.
    pub fn addresses(&self) -> ContractOverrides {
        self.contracts
            .iter()
            .map(|(name, networks)| {
                let networks = networks
                    .iter()
                    .map(|(network, entry)| (network.clone(), entry.address.clone()))
                    .collect();
                (name.clone(), networks)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

impl RegistryEntry {
    fn unpinned(address: &str) -> Self {
        Self {
            address: normalize_address(address),
            pin: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_table() {
        let registry = ContractRegistry::core();
        assert_eq!(registry.len(), 4);
        let flow = registry.resolve("FlowToken").unwrap();
        assert_eq!(flow["mainnet"].address, "0x1654653399040a61");
        assert_eq!(flow["testnet"].address, "0x7e60df042a9c0868");
        assert!(registry.entry("MetadataViews", "emulator").is_none());
        assert!(registry.resolve("HelloWorld").is_none());
    }

    #[test]
    fn test_caller_wins() {
        let mut overrides = ContractOverrides::new();
        overrides.insert(
            "FlowToken".to_string(),
            BTreeMap::from([("testnet".to_string(), "0x0000000000000001".to_string())]),
        );
        let registry = ContractRegistry::with_core(&overrides);

        let flow = registry.resolve("FlowToken").unwrap();
        assert_eq!(flow.len(), 1);
        assert_eq!(flow["testnet"].address, "0x0000000000000001");
        // untouched core entries stay
        assert!(registry.contains("FungibleToken"));
    }

    #[test]
    fn test_addresses_are_normalised() {
        let registry = ContractRegistry::empty().with_contract("HelloWorld", "testnet", "E15193734357CF5C");
        assert_eq!(registry.entry("HelloWorld", "testnet").unwrap().address, "0xe15193734357cf5c");
        assert_eq!(registry.addresses()["HelloWorld"]["testnet"], "0xe15193734357cf5c");
    }
}
