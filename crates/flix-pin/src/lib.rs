//! FLIX Pin: pinagem de dependências por conteúdo
//!
//! - [`PinEngine`]: recursive pin trees over deployed contract code
//! - [`NetworkPinCalculator`]: per-network hash of the import-bound body

pub mod cache;
pub mod engine;
pub mod network_pin;

pub use cache::{identity_key, FetchedContract, PinCache};
pub use engine::{PinEngine, DEFAULT_MAX_CONCURRENT_FETCHES};
pub use network_pin::NetworkPinCalculator;
