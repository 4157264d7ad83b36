//! Generator configuration (YAML)
//!
//! ```yaml
//! format: v2
//! networks: [mainnet, testnet]
//! max_concurrent_fetches: 8
//! build_timeout_secs: 30
//! contracts:
//!   HelloWorld:
//!     testnet: "0xe15193734357cf5c"
//! ```
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use flix_core::BuildContext;
use flix_registry::{ContractOverrides, ContractRegistry};
use flix_schema::FormatVersion;

use crate::error::GeneratorError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Document generation to emit
    pub format: FormatVersion,
    /// Networks that get a network pin
    pub networks: Vec<String>,
    pub max_concurrent_fetches: usize,
    pub build_timeout_secs: Option<u64>,
    /// Caller registry entries, merged over the core contracts
    pub contracts: ContractOverrides,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            format: FormatVersion::V2,
            networks: vec!["mainnet".to_string(), "testnet".to_string()],
            max_concurrent_fetches: flix_pin::DEFAULT_MAX_CONCURRENT_FETCHES,
            build_timeout_secs: None,
            contracts: ContractOverrides::new(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, GeneratorError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| GeneratorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, GeneratorError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| GeneratorError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    fn validate(&self) -> Result<(), GeneratorError> {
        if self.max_concurrent_fetches == 0 {
            return Err(GeneratorError::Config("max_concurrent_fetches must be at least 1".to_string()));
        }
        if self.networks.iter().any(|n| n.trim().is_empty()) {
            return Err(GeneratorError::Config("empty network name".to_string()));
        }
        Ok(())
    }

    /// Core contracts with this config's entries on top.
    pub fn registry(&self) -> ContractRegistry {
        ContractRegistry::with_core(&self.contracts)
    }

    /// Fresh context carrying this config's deadline.
    pub fn context(&self) -> BuildContext {
        match self.build_timeout_secs {
            Some(secs) => BuildContext::new().with_timeout(Duration::from_secs(secs)),
            None => BuildContext::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::from_yaml("{}").unwrap();
        assert_eq!(config.format, FormatVersion::V2);
        assert_eq!(config.networks, vec!["mainnet", "testnet"]);
        assert_eq!(config.max_concurrent_fetches, 8);
    }

    #[test]
    fn test_overrides_reach_registry() {
        let yaml = r#"
format: v1
networks: [testnet]
contracts:
  HelloWorld:
    testnet: "E15193734357CF5C"
"#;
        let config = GeneratorConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.format, FormatVersion::V1);
        let registry = config.registry();
        assert_eq!(registry.entry("HelloWorld", "testnet").unwrap().address, "0xe15193734357cf5c");
        assert!(registry.contains("FlowToken"));
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let err = GeneratorConfig::from_yaml("max_concurrent_fetches: 0").unwrap_err();
        assert!(err.to_string().starts_with("CONFIG/"));
    }
}
