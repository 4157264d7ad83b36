//! Template identity: canonical encoding and the id hash.
//!
//! The canonical form is a compact JSON array, never an object, so its bytes
//! do not depend on map key ordering:
//!
//! ```text
//! [f_version, type, interface, messages, body, dependencies, parameters, network_pins]
//! ```
//!
//! Messages are sorted by key then tag, parameters by index with the output
//! last, dependency networks and network pins by network name. Dependencies
//! keep discovery order. A parameter with a balance (1.0.0 only) carries it as
//! a sixth element. The id itself and block heights are left out.
use serde_json::Value;

use flix_core::sha3_hex;

use crate::error::SchemaError;
use crate::messages::Message;
use crate::template::{FormatVersion, InteractionTemplate, ParameterInfo, TemplateView};

fn messages_value(messages: &[Message]) -> Value {
    let mut sorted: Vec<&Message> = messages.iter().collect();
    sorted.sort_by(|a, b| a.key.cmp(&b.key));
    let entries = sorted
        .into_iter()
        .map(|m| {
            let mut translations: Vec<_> = m.i18n.iter().collect();
            translations.sort_by(|a, b| a.tag.cmp(&b.tag));
            let translations: Vec<Value> = translations
                .into_iter()
                .map(|t| Value::from(vec![t.tag.clone(), t.translation.clone()]))
                .collect();
            Value::Array(vec![Value::from(m.key.clone()), Value::Array(translations)])
        })
        .collect();
    Value::Array(entries)
}

fn parameter_value(p: &ParameterInfo) -> Value {
    let mut value = vec![
        Value::from(p.label.clone()),
        Value::from(p.index as u64),
        Value::from(p.type_name.clone()),
        messages_value(&p.messages),
        Value::from(p.is_output),
    ];
    if let Some(balance) = &p.balance {
        value.push(Value::from(balance.clone()));
    }
    Value::Array(value)
}

/// Canonical value of a template, see the module docs for the layout.
pub fn canonical_value(template: &dyn TemplateView) -> Value {
    let dependencies: Vec<Value> = template
        .dependencies()
        .into_iter()
        .map(|dep| {
            let mut networks = dep.networks;
            networks.sort_by(|a, b| a.network.cmp(&b.network));
            let networks: Vec<Value> = networks
                .into_iter()
                .map(|n| {
                    let pin = n.pin.map(|p| p.pin).unwrap_or_default();
                    Value::from(vec![n.network, n.address, pin])
                })
                .collect();
            Value::Array(vec![Value::from(dep.contract), Value::Array(networks)])
        })
        .collect();

    let mut parameters: Vec<Value> = template.parameters().iter().map(parameter_value).collect();
    // v1 outputs are synthesized on read, not stored
    if template.format() == FormatVersion::V2 {
        if let Some(output) = template.output() {
            parameters.push(parameter_value(&output));
        }
    }

    let mut pins = template.network_pins();
    pins.sort_by(|a, b| a.network.cmp(&b.network));
    let pins: Vec<Value> = pins
        .into_iter()
        .map(|p| Value::from(vec![p.network, p.pin_self]))
        .collect();

    Value::Array(vec![
        Value::from(template.format().version_tag()),
        Value::from(template.kind().map(|k| k.as_str()).unwrap_or("")),
        Value::from(template.interface()),
        messages_value(&template.messages()),
        Value::from(template.raw_source()),
        Value::Array(dependencies),
        Value::Array(parameters),
        Value::Array(pins),
    ])
}

pub fn canonical_bytes(template: &dyn TemplateView) -> Result<Vec<u8>, SchemaError> {
    Ok(serde_json::to_vec(&canonical_value(template))?)
}

pub fn compute_id(template: &dyn TemplateView) -> Result<String, SchemaError> {
    Ok(sha3_hex(canonical_bytes(template)?))
}

/// Computes and stores the id. This is the last change made to a template.
pub fn seal(mut template: InteractionTemplate) -> Result<InteractionTemplate, SchemaError> {
    let id = compute_id(&template)?;
    template.set_id(id);
    Ok(template)
}

/// True when the stored id matches the template's contents.
pub fn verify_id(template: &InteractionTemplate) -> Result<bool, SchemaError> {
    Ok(compute_id(template)? == template.id())
}
