//! Chain Reader: acesso ao bytecode implantado e à altura de bloco
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::address::normalize_address;
use crate::error::FlixError;

/// Read access to one network's deployed contracts.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Deployed source of `contract_name` on the account at `address`.
    async fn get_deployed_source(&self, address: &str, contract_name: &str) -> Result<Vec<u8>, FlixError>;

    async fn get_latest_height(&self, network: &str) -> Result<u64, FlixError>;
}

/// Chain state held in memory, loadable from a YAML snapshot.
///
/// ```yaml
/// network: testnet
/// height: 100
/// accounts:
///   "0xe15193734357cf5c":
///     HelloWorld: "access(all) contract HelloWorld {}"
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InMemoryChain {
    pub network: String,
    pub height: u64,
    #[serde(default)]
    pub accounts: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(skip)]
    failing: HashSet<String>,
    #[serde(skip)]
    latency: Option<Duration>,
    #[serde(skip)]
    fetches: Mutex<HashMap<String, usize>>,
}

impl InMemoryChain {
    pub fn new(network: impl Into<String>, height: u64) -> Self {
        Self {
            network: network.into(),
            height,
            ..Default::default()
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        let mut chain: Self =
            serde_yaml::from_str(yaml).map_err(|e| format!("Failed to parse chain snapshot: {}", e))?;
        chain.accounts = std::mem::take(&mut chain.accounts)
            .into_iter()
            .map(|(address, contracts)| (normalize_address(&address), contracts))
            .collect();
        Ok(chain)
    }

    /// Deploys `code` as `name` on the account at `address`.
    pub fn with_contract(mut self, address: &str, name: &str, code: &str) -> Self {
        self.accounts
            .entry(normalize_address(address))
            .or_default()
            .insert(name.to_string(), code.to_string());
        self
    }

    /// Makes every fetch of this contract fail.
    pub fn with_failure(mut self, address: &str, name: &str) -> Self {
        self.failing.insert(key(address, name));
        self
    }

    /// Delays every fetch, so concurrent callers overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of fetches made for one contract.
    pub fn fetch_count(&self, address: &str, name: &str) -> usize {
        self.fetches
            .lock()
            .map(|f| f.get(&key(address, name)).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of fetches made for any contract.
    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().map(|f| f.values().sum()).unwrap_or(0)
    }
}

fn key(address: &str, name: &str) -> String {
    format!("{}.{}", normalize_address(address), name)
}

#[async_trait]
impl ChainReader for InMemoryChain {
    async fn get_deployed_source(&self, address: &str, contract_name: &str) -> Result<Vec<u8>, FlixError> {
        let k = key(address, contract_name);
        if let Ok(mut fetches) = self.fetches.lock() {
            *fetches.entry(k.clone()).or_insert(0) += 1;
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.contains(&k) {
            return Err(FlixError::fetch(contract_name, address, &self.network, "account unavailable"));
        }

        self.accounts
            .get(&normalize_address(address))
            .and_then(|contracts| contracts.get(contract_name))
            .map(|code| code.as_bytes().to_vec())
            .ok_or_else(|| FlixError::fetch(contract_name, address, &self.network, "contract not deployed"))
    }

    async fn get_latest_height(&self, network: &str) -> Result<u64, FlixError> {
        if network != self.network {
            return Err(FlixError::fetch("", "", network, format!("reader serves {}", self.network)));
        }
        Ok(self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_counts_and_normalises_addresses() {
        let chain = InMemoryChain::new("testnet", 10).with_contract("E15193734357CF5C", "HelloWorld", "code");
        let src = chain.get_deployed_source("0xe15193734357cf5c", "HelloWorld").await.unwrap();
        assert_eq!(src, b"code");
        assert_eq!(chain.fetch_count("0xe15193734357cf5c", "HelloWorld"), 1);
        assert_eq!(chain.get_latest_height("testnet").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_missing_contract_is_fetch_failure() {
        let chain = InMemoryChain::new("testnet", 1);
        let err = chain.get_deployed_source("0x01", "Nope").await.unwrap_err();
        assert!(matches!(err, FlixError::FetchFailure { .. }));
        assert!(chain.get_latest_height("mainnet").await.is_err());
    }

    #[test]
    fn test_snapshot_from_yaml() {
        let yaml = r#"
network: testnet
height: 42
accounts:
  "0xe15193734357cf5c":
    GiveNumber: "access(all) contract GiveNumber {}"
"#;
        let chain = InMemoryChain::from_yaml(yaml).unwrap();
        assert_eq!(chain.height, 42);
        assert!(chain.accounts["0xe15193734357cf5c"].contains_key("GiveNumber"));
    }
}
