use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const EVENT_ID: &str = "eventId";
pub const SAMPLED_RATE: &str = "sampledRate";

/// A v1.0 CloudEvent reduced to its id plus extension attributes.
///
/// Extensions are written inline: every key other than `eventId` sits at the
/// top level of the JSON object and is collected back into `extensions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudEvent {
    #[serde(rename = "eventId", default)]
    pub event_id: String,
    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("malformed JSON: expected an object, found {0}")]
    NotAnObject(&'static str),

    #[error("unexpected field type: {0}")]
    FieldType(#[source] serde_json::Error),

    #[error("extension attribute `{}` collides with the named field", EVENT_ID)]
    Collision,

    #[error("cannot serialize event: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl CloudEvent {
    #[cfg(test)]
    pub fn new(event_id: impl Into<String>) -> Self {
        CloudEvent {
            event_id: event_id.into(),
            extensions: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    /// The `sampledRate` extension, but only when it was sent as a string.
    pub fn sampled_rate(&self) -> Option<&str> {
        self.extension(SAMPLED_RATE).and_then(Value::as_str)
    }
}

pub fn decode(bytes: &[u8]) -> Result<CloudEvent, CodecError> {
    let value: Value = serde_json::from_slice(bytes).map_err(CodecError::Parse)?;
    if !value.is_object() {
        return Err(CodecError::NotAnObject(json_kind(&value)));
    }
    serde_json::from_value(value).map_err(CodecError::FieldType)
}

pub fn encode(event: &CloudEvent) -> Result<Vec<u8>, CodecError> {
    check_collision(event)?;
    serde_json::to_vec(event).map_err(CodecError::Serialize)
}

fn check_collision(event: &CloudEvent) -> Result<(), CodecError> {
    if event.extensions.contains_key(EVENT_ID) {
        return Err(CodecError::Collision);
    }
    Ok(())
}

pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
