//! Template (de)serialization with version detection.
use serde::Deserialize;

use crate::error::SchemaError;
use crate::template::{FormatVersion, InteractionTemplate};
use crate::{v1, v2};

#[derive(Deserialize)]
struct VersionTag {
    #[serde(default)]
    f_version: Option<String>,
}

/// Reads the `f_version` tag without deserializing the rest.
pub fn detect_version(bytes: &[u8]) -> Result<FormatVersion, SchemaError> {
    let header: VersionTag = serde_json::from_slice(bytes).map_err(|source| SchemaError::Malformed {
        format: "unknown".to_string(),
        source,
    })?;
    match header.f_version.as_deref() {
        None | Some("") => Err(SchemaError::MissingVersion),
        Some(tag) => {
            FormatVersion::from_version_tag(tag).ok_or_else(|| SchemaError::UnsupportedVersion(tag.to_string()))
        }
    }
}

/// Parses a template of whichever generation its tag names.
pub fn parse_template(bytes: &[u8]) -> Result<InteractionTemplate, SchemaError> {
    let version = detect_version(bytes)?;
    let malformed = |source: serde_json::Error| SchemaError::Malformed {
        format: version.version_tag().to_string(),
        source,
    };
    let template = match version {
        FormatVersion::V1 => {
            InteractionTemplate::V1(serde_json::from_slice::<v1::FlowInteractionTemplate>(bytes).map_err(malformed)?)
        }
        FormatVersion::V2 => {
            InteractionTemplate::V2(serde_json::from_slice::<v2::InteractionTemplate>(bytes).map_err(malformed)?)
        }
    };
    Ok(template)
}

pub fn parse_template_str(json: &str) -> Result<InteractionTemplate, SchemaError> {
    parse_template(json.as_bytes())
}

/// Pretty JSON with four-space indentation, fields in declaration order.
pub fn to_json_pretty(template: &InteractionTemplate) -> Result<String, SchemaError> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    serde::Serialize::serialize(template, &mut ser)?;
    Ok(String::from_utf8_lossy(&out).to_string())
}

pub fn to_json_bytes(template: &InteractionTemplate) -> Result<Vec<u8>, SchemaError> {
    Ok(serde_json::to_vec(template)?)
}
