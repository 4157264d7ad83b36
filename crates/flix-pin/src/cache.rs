//! Run-local memo cache for the pin engine.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use flix_core::bare_address;
use flix_schema::DependencyPin;

/// A contract fetched from the chain, before its pin is assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContract {
    pub name: String,
    pub address: String,
    pub pin_self: String,
    /// Direct imports as (name, address), in source order
    pub children: Vec<(String, String)>,
}

/// Network-qualified identity of a deployed contract, e.g.
/// `testnet/A.e15193734357cf5c.HelloWorld`.
pub fn identity_key(network: &str, address: &str, name: &str) -> String {
    format!("{}/A.{}.{}", network, bare_address(address), name)
}

/// Owned by one build run and shared by its concurrent fetches.
#[derive(Debug, Default)]
pub struct PinCache {
    contracts: Mutex<HashMap<String, Arc<FetchedContract>>>,
    pins: Mutex<HashMap<String, DependencyPin>>,
}

impl PinCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contract(&self, key: &str) -> Option<Arc<FetchedContract>> {
        self.contracts.lock().ok().and_then(|c| c.get(key).cloned())
    }

    /// Stores a fetched contract. An entry already present is kept.
    pub fn insert_contract(&self, key: String, contract: FetchedContract) -> Arc<FetchedContract> {
        match self.contracts.lock() {
            Ok(mut contracts) => contracts.entry(key).or_insert_with(|| Arc::new(contract)).clone(),
            Err(_) => Arc::new(contract),
        }
    }

    pub fn pin(&self, key: &str) -> Option<DependencyPin> {
        self.pins.lock().ok().and_then(|p| p.get(key).cloned())
    }

    pub fn insert_pin(&self, key: String, pin: DependencyPin) {
        if let Ok(mut pins) = self.pins.lock() {
            pins.insert(key, pin);
        }
    }

    pub fn fetched(&self) -> usize {
        self.contracts.lock().map(|c| c.len()).unwrap_or(0)
    }
}
