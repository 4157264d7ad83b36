//! Network pins: hash of the template body with every import bound to the
//! addresses of one network.
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use flix_core::{sha3_hex, FlixError, ImportRef, SourceAnalyzer};
use flix_schema::{NetworkPin, TemplateView};

pub struct NetworkPinCalculator {
    analyzer: Arc<dyn SourceAnalyzer>,
}

impl NetworkPinCalculator {
    pub fn new(analyzer: Arc<dyn SourceAnalyzer>) -> Self {
        Self { analyzer }
    }

    /// The body a client submits on `network`: each import rewritten to
    /// `import Name from <address>`.
    pub fn resolve_source_for_network(&self, template: &dyn TemplateView, network: &str) -> Result<String, FlixError> {
        let mut addresses = HashMap::new();
        for dep in template.dependencies() {
            let entry = dep.network(network).ok_or_else(|| FlixError::NetworkMismatch {
                contract: dep.contract.clone(),
                network: network.to_string(),
            })?;
            addresses.insert(dep.contract.clone(), entry.address.clone());
        }

        let unresolved = RefCell::new(None);
        let source = self.analyzer.rewrite_imports(template.raw_source(), &|import: &ImportRef| {
            match addresses.get(&import.name) {
                Some(address) => Some(format!("import {} from {}", import.name, address)),
                None => {
                    unresolved.borrow_mut().get_or_insert_with(|| import.name.clone());
                    None
                }
            }
        })?;

        match unresolved.into_inner() {
            Some(contract) => Err(FlixError::NetworkMismatch {
                contract,
                network: network.to_string(),
            }),
            None => Ok(source),
        }
    }

    pub fn compute_network_pin(&self, template: &dyn TemplateView, network: &str) -> Result<NetworkPin, FlixError> {
        let source = self.resolve_source_for_network(template, network)?;
        Ok(NetworkPin {
            network: network.to_string(),
            pin_self: sha3_hex(source),
        })
    }

    /// Pins for every network in `networks`, sorted by network name.
    pub fn compute_all(&self, template: &dyn TemplateView, networks: &[String]) -> Result<Vec<NetworkPin>, FlixError> {
        let mut pins = networks
            .iter()
            .map(|network| self.compute_network_pin(template, network))
            .collect::<Result<Vec<_>, _>>()?;
        pins.sort_by(|a, b| a.network.cmp(&b.network));
        pins.dedup_by(|a, b| a.network == b.network);
        Ok(pins)
    }

    /// Recomputes `pin` from the template and compares.
    pub fn verify_network_pin(&self, template: &dyn TemplateView, pin: &NetworkPin) -> Result<bool, FlixError> {
        Ok(self.compute_network_pin(template, &pin.network)?.pin_self == pin.pin_self)
    }
}
