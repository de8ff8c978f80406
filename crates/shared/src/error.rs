use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body returned by the backend (`{"detail": ...}`).
///
/// `detail` is either a plain message or a list of validation entries, each
/// carrying a `msg` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub detail: Value,
}

impl ApiErrorBody {
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn message(&self) -> String {
        match &self.detail {
            Value::String(message) => message.clone(),
            Value::Array(entries) => entries
                .iter()
                .map(|entry| match entry.get("msg").and_then(Value::as_str) {
                    Some(msg) => msg.to_string(),
                    None => entry.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}
