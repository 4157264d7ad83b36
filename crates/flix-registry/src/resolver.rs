//! Import Resolver: import reference + rede -> endereço concreto
use std::sync::Arc;
use tracing::{debug, warn};

use flix_core::{normalize_address, FlixError, ImportRef};
use flix_schema::PinRecord;

use crate::contracts::ContractRegistry;

/// Where one import lives on one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImport {
    pub contract: String,
    pub network: String,
    pub address: String,
    /// Present when the registry already carries a pin for this deployment
    pub pin: Option<PinRecord>,
}

#[derive(Debug, Clone)]
pub struct ImportResolver {
    registry: Arc<ContractRegistry>,
}

impl ImportResolver {
    pub fn new(registry: Arc<ContractRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    /// Resolves `import` on `network`.
    ///
    /// Bare imports go through the registry. Explicit imports keep the
    /// address written in source; the registry only contributes a pin when it
    /// holds one for that same address. Deployed contracts import from
    /// addresses of their own network, so this is what the pin engine uses.
    pub fn resolve(&self, import: &ImportRef, network: &str) -> Result<ResolvedImport, FlixError> {
        match &import.address {
            None => self.resolve_bare(&import.name, network),
            Some(address) => Ok(self.resolve_explicit(&import.name, address, network)),
        }
    }

    fn resolve_bare(&self, name: &str, network: &str) -> Result<ResolvedImport, FlixError> {
        let networks = self
            .registry
            .resolve(name)
            .ok_or_else(|| FlixError::UnresolvedDependency {
                contract: name.to_string(),
                network: network.to_string(),
            })?;
        let entry = networks.get(network).ok_or_else(|| FlixError::NetworkMismatch {
            contract: name.to_string(),
            network: network.to_string(),
        })?;
        debug!(contract = name, network, address = %entry.address, "resolved from registry");

        Ok(ResolvedImport {
            contract: name.to_string(),
            network: network.to_string(),
            address: entry.address.clone(),
            pin: entry.pin.clone(),
        })
    }

    fn resolve_explicit(&self, name: &str, address: &str, network: &str) -> ResolvedImport {
        let address = normalize_address(address);
        let pin = self
            .registry
            .entry(name, network)
            .filter(|entry| entry.address == address)
            .and_then(|entry| entry.pin.clone());

        ResolvedImport {
            contract: name.to_string(),
            network: network.to_string(),
            address,
            pin,
        }
    }

    /// Resolves one top-level import on every network it can be placed on.
    ///
    /// A contract the registry knows is placed on the registry's networks at
    /// the registry's address for each of them, whatever address the source
    /// spells out. An explicit import of an unknown contract is placed on
    /// `networks` with its literal address.
    pub fn resolve_all(&self, import: &ImportRef, networks: &[String]) -> Result<Vec<ResolvedImport>, FlixError> {
        match (self.registry.resolve(&import.name), &import.address) {
            (Some(known), address) => {
                if let Some(address) = address.as_deref().map(normalize_address) {
                    if !known.values().any(|entry| entry.address == address) {
                        warn!(contract = %import.name, %address, "literal address unknown to the registry, using registry deployments");
                    }
                }
                known
                    .keys()
                    .map(|network| self.resolve_bare(&import.name, network))
                    .collect()
            }
            (None, Some(_)) => networks.iter().map(|network| self.resolve(import, network)).collect(),
            (None, None) => Err(FlixError::UnresolvedDependency {
                contract: import.name.clone(),
                network: networks.join(","),
            }),
        }
    }
}
