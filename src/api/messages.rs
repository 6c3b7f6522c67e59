use crate::report::AuditReport;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved cipher id for user-supplied source.
pub const CUSTOM_CIPHER_ID: &str = "custom";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CipherDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        CipherDescriptor {
            id: id.into(),
            name: name.into(),
            description: None,
        }
    }

    pub fn is_custom(&self) -> bool {
        self.id == CUSTOM_CIPHER_ID
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRequest {
    pub cipher_id: String,
    pub rounds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_code: Option<String>,
}

impl AuditRequest {
    /// Attaches `custom_source` only for the custom cipher id.
    pub fn new(cipher_id: &str, custom_source: &str, rounds: u32) -> Self {
        let custom_code = if cipher_id == CUSTOM_CIPHER_ID {
            Some(custom_source.to_string())
        } else {
            None
        };
        AuditRequest {
            cipher_id: cipher_id.to_string(),
            rounds,
            custom_code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cipher_name: Option<String>,
    pub report: AuditReport,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HealthResponse {
    #[serde(default)]
    pub message: String,
}

/// Error body as sent by the backend framework.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// Plain string details are used as-is; validation error lists are joined by message.
    pub fn into_detail(self) -> Option<String> {
        match self.detail? {
            Value::String(detail) if !detail.trim().is_empty() => Some(detail),
            Value::Array(items) => {
                let messages: Vec<String> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .map(str::to_owned)
                    .collect();
                if messages.is_empty() {
                    None
                } else {
                    Some(messages.join("; "))
                }
            }
            _ => None,
        }
    }

    pub fn parse(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(ErrorBody::into_detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn custom_code_only_sent_for_custom_cipher() {
        let builtin = AuditRequest::new("speck", "class X: pass", 1200);
        assert_eq!(
            serde_json::to_value(&builtin).unwrap(),
            json!({"cipher_id": "speck", "rounds": 1200})
        );

        let custom = AuditRequest::new(CUSTOM_CIPHER_ID, "class X: pass", 300);
        assert_eq!(
            serde_json::to_value(&custom).unwrap(),
            json!({"cipher_id": "custom", "rounds": 300, "custom_code": "class X: pass"})
        );
    }

    #[test]
    fn descriptor_accepts_backend_description() {
        let parsed: Vec<CipherDescriptor> = serde_json::from_value(json!([
            {"id": "ascon", "name": "Ascon-128 (NIST Standard)", "description": "Ascon-128 (NIST Standard)"},
            {"id": "custom", "name": "Custom (Paste Code)"}
        ]))
        .unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(!parsed[0].is_custom());
        assert!(parsed[1].is_custom());
        assert_eq!(parsed[1].description, None);
    }

    #[test]
    fn error_body_detail_variants() {
        assert_eq!(
            ErrorBody::parse(r#"{"detail": "bad key length"}"#).as_deref(),
            Some("bad key length")
        );
        assert_eq!(
            ErrorBody::parse(
                r#"{"detail": [{"loc": ["body", "rounds"], "msg": "field required"}, {"msg": "value is not a valid integer"}]}"#
            )
            .as_deref(),
            Some("field required; value is not a valid integer")
        );
        assert_eq!(ErrorBody::parse(r#"{"detail": 42}"#), None);
        assert_eq!(ErrorBody::parse(r#"{"detail": "  "}"#), None);
        assert_eq!(ErrorBody::parse(""), None);
        assert_eq!(ErrorBody::parse("<html>502</html>"), None);
    }
}
