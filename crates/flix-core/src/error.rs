//! Unified Error Model
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlixError {
    #[error("RESOLVE/contract {contract} not found for network {network}")]
    UnresolvedDependency { contract: String, network: String },

    #[error("NETWORK/network {network} not found for contract {contract} in dependencies")]
    NetworkMismatch { contract: String, network: String },

    #[error("FETCH/{contract} at {address} on {network}: {reason}")]
    FetchFailure {
        contract: String,
        address: String,
        network: String,
        reason: String,
    },

    #[error("SOURCE/{0}")]
    MalformedSource(String),

    #[error("VERSION/unsupported template version: {0}")]
    UnsupportedFormatVersion(String),

    #[error("CYCLE/import cycle through {0}")]
    CyclicDependency(String),

    #[error("CANCEL/build cancelled")]
    Cancelled,

    #[error("SCHEMA/{0}")]
    Schema(String),
}

impl FlixError {
    pub fn fetch(
        contract: impl Into<String>,
        address: impl Into<String>,
        network: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::FetchFailure {
            contract: contract.into(),
            address: address.into(),
            network: network.into(),
            reason: reason.to_string(),
        }
    }
}
