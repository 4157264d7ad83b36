//! FLIX Registry: endereços de contratos por rede e resolução de imports
pub mod contracts;
pub mod resolver;

pub use contracts::{ContractOverrides, ContractRegistry, NetworkAddresses, RegistryEntry};
pub use resolver::{ImportResolver, ResolvedImport};
