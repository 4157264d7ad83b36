//! Localised messages shared by both format generations.
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_LANGUAGE: &str = "en-US";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub i18n: Vec<I18n>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct I18n {
    pub tag: String,
    pub translation: String,
}

impl Message {
    pub fn new(key: impl Into<String>, tag: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            i18n: vec![I18n {
                tag: tag.into(),
                translation: translation.into(),
            }],
        }
    }
}

/// Looks up `key`, preferring the `en-US` translation and otherwise taking the
/// last translation seen. Falls back to `placeholder`.
pub fn message_value(messages: &[Message], key: &str, placeholder: &str) -> String {
    let mut value = placeholder;
    for msg in messages.iter().filter(|m| m.key == key) {
        for i18n in &msg.i18n {
            value = i18n.translation.as_str();
            if i18n.tag == DEFAULT_LANGUAGE {
                return value.trim().to_string();
            }
        }
    }
    value.trim().to_string()
}

pub fn title(messages: &[Message], placeholder: &str) -> String {
    message_value(messages, "title", placeholder)
}

pub fn description(messages: &[Message], placeholder: &str) -> String {
    message_value(messages, "description", placeholder)
}

/// Treats an explicit JSON `null` as the empty value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
