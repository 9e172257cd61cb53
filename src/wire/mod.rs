use serde::{Deserialize, Serialize};
use serde_json::Value;

/// ========================================
/// Gemini generateContent wire protocol
/// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: WireRole,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: WireRole, text: impl Into<String>) -> Self {
        Self { role, parts: vec![Part { text: text.into() }] }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

// Response side is lenient: the provider omits fields freely.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, if the provider sent one.
    pub fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
    }
}

/// Error body read field by field, so one oddly typed field never hides the rest.
#[derive(Debug, Clone)]
pub struct ErrorBody(Value);

impl ErrorBody {
    /// `None` when the body is not JSON at all.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok().map(Self)
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.0.get("error").and_then(|e| e.get(name))
    }

    pub fn message(&self) -> Option<&str> {
        self.field("message").and_then(Value::as_str)
    }

    pub fn code(&self) -> Option<u64> {
        self.field("code").and_then(Value::as_u64)
    }

    pub fn status(&self) -> Option<&str> {
        self.field("status").and_then(Value::as_str)
    }

    /// True when `error.details` carries a `google.rpc.QuotaFailure` entry.
    pub fn reports_quota_failure(&self) -> bool {
        self.field("details")
            .and_then(Value::as_array)
            .map(|details| {
                details.iter().any(|d| {
                    d.get("@type")
                        .and_then(Value::as_str)
                        .is_some_and(|t| t.ends_with("google.rpc.QuotaFailure"))
                })
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_uses_camel_case_generation_config() {
        let req = GenerateContentRequest {
            contents: vec![Content::text(WireRole::User, "hi")],
            generation_config: GenerationConfig {
                temperature: 0.5,
                top_k: 32,
                top_p: 0.5,
                max_output_tokens: 10,
            },
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["contents"][0]["role"], "user");
        assert_eq!(v["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(v["generationConfig"]["topK"], 32);
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 10);
    }

    #[test]
    fn first_text_tolerates_missing_pieces() {
        let no_parts: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [{ "finishReason": "SAFETY" }] })).unwrap();
        assert_eq!(no_parts.first_text(), None);

        let missing: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(missing.candidates.is_empty());

        let ok: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": "<p>a</p>" }, { "text": "b" }] } }]
        }))
        .unwrap();
        assert_eq!(ok.first_text().as_deref(), Some("<p>a</p>"));
    }

    #[test]
    fn quota_failure_detail_is_recognised() {
        let body = json!({
            "error": {
                "code": 429,
                "message": "Resource has been exhausted",
                "status": "RESOURCE_EXHAUSTED",
                "details": [{ "@type": "type.googleapis.com/google.rpc.QuotaFailure", "violations": [] }]
            }
        })
        .to_string();
        let err = ErrorBody::parse(&body).unwrap();
        assert!(err.reports_quota_failure());
        assert_eq!(err.code(), Some(429));
        assert_eq!(err.status(), Some("RESOURCE_EXHAUSTED"));
        assert_eq!(err.message(), Some("Resource has been exhausted"));
    }

    #[test]
    fn error_body_tolerates_odd_shapes() {
        let null_details =
            ErrorBody::parse(r#"{"error":{"message":"You exceeded your current quota","details":null}}"#).unwrap();
        assert_eq!(null_details.message(), Some("You exceeded your current quota"));
        assert!(!null_details.reports_quota_failure());

        let string_error = ErrorBody::parse(r#"{"error":"quota exceeded"}"#).unwrap();
        assert_eq!(string_error.message(), None);
        assert_eq!(string_error.code(), None);

        let no_error = ErrorBody::parse(r#"{"message":"slow"}"#).unwrap();
        assert_eq!(no_error.message(), None);

        assert!(ErrorBody::parse("<html>busy</html>").is_none());
    }
}
