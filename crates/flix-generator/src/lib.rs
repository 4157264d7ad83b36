//! FLIX Generator: código-fonte -> template de interação selado
pub mod builder;
pub mod config;
pub mod error;

pub use builder::TemplateBuilder;
pub use config::GeneratorConfig;
pub use error::GeneratorError;
