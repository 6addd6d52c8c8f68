use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body the assistant API returns on non-success statuses.
///
/// `detail` is a plain string for handled failures and a list of field
/// errors for request validation failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(Value::String(detail.into())),
        }
    }

    /// Human-readable detail, if the server sent one.
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect();
                (!parts.is_empty()).then(|| parts.join("; "))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_detail_is_surfaced() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail":"User already registered"}"#).expect("body");
        assert_eq!(body.message().as_deref(), Some("User already registered"));
    }

    #[test]
    fn validation_detail_list_is_joined() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"detail":[{"loc":["body","email"],"msg":"field required"},{"msg":"too short"}]}"#,
        )
        .expect("body");
        assert_eq!(body.message().as_deref(), Some("field required; too short"));
    }

    #[test]
    fn missing_or_blank_detail_yields_none() {
        let body: ErrorBody = serde_json::from_str("{}").expect("body");
        assert!(body.message().is_none());
        assert!(ErrorBody::new("  ").message().is_none());
    }
}
