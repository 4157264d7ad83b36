//! FLIX Schema: documentos de template versionados
//!
//! Two generations share one logical interface, [`TemplateView`]:
//! - `1.0.0` ([`v1`]): arguments keyed by name, pins inline per network
//! - `1.1.0` ([`v2`]): ordered parameters, recursive dependency pin trees
//!
//! ```ignore
//! use flix_schema::{parse_template_str, TemplateView};
//!
//! let template = parse_template_str(&json)?;
//! for dep in template.dependencies() {
//!     println!("{} on {} networks", dep.contract, dep.networks.len());
//! }
//! ```

pub mod codec;
pub mod error;
pub mod identity;
pub mod messages;
pub mod template;
pub mod v1;
pub mod v2;

pub use codec::{detect_version, parse_template, parse_template_str, to_json_bytes, to_json_pretty};
pub use error::SchemaError;
pub use identity::{canonical_bytes, compute_id, seal, verify_id};
pub use messages::{I18n, Message};
pub use template::{
    DependencyInfo, DependencyPin, FormatVersion, InteractionTemplate, NetworkEntry, NetworkPin, ParameterInfo,
    PinRecord, TemplateDraft, TemplateView,
};
