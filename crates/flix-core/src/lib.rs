//! FLIX Core: hashing, erros, contexto de build e os contratos dos colaboradores externos
//!
//! Núcleo compartilhado pelo motor de pinagem e pelo gerador de templates.

pub mod address;
pub mod chain;
pub mod context;
pub mod error;
pub mod hashing;
pub mod source;
pub mod stage;

pub use address::{bare_address, normalize_address};
pub use chain::{ChainReader, InMemoryChain};
pub use context::BuildContext;
pub use error::FlixError;
pub use hashing::sha3_hex;
pub use source::{ImportRef, OperationKind, ParameterDecl, Pragma, PragmaParameter, SourceAnalyzer, SourceMetadata};
pub use stage::BuildState;

/// Tipo de documento gravado em todo template
pub const F_TYPE: &str = "InteractionTemplate";
