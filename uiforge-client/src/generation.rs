//! Generation Service client: proposes document edits from chat instructions
//! and produces hybrid generations. Replies are never trusted; the session
//! re-validates every proposed document.

use crate::config::Config;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use uiforge_dsl::UiDocument;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Generation service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Generation service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Generation service refused the request: {message}")]
    Rejected { message: String, raw: Option<String> },

    #[error("Malformed generation reply: {message}")]
    Malformed { message: String, raw: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssistRequest {
    pub document: UiDocument,
    pub instructions: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub document: UiDocument,
}

/// Proposed edit. `document` is raw and still has to pass validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssistReply {
    #[serde(alias = "dsl")]
    pub document: Value,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReply {
    #[serde(alias = "dsl")]
    pub document: Value,
    #[serde(default, alias = "tsx")]
    pub generated_code: Option<String>,
    #[serde(default, alias = "qa")]
    pub qa_text: Option<String>,
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn assist(&self, request: &AssistRequest) -> Result<AssistReply, ServiceError>;

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateReply, ServiceError>;
}

/// JSON-over-HTTP service: `POST {endpoint}/assist` and `POST {endpoint}/generate`.
pub struct HttpGenerationService {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpGenerationService {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, endpoint, api_key))
    }

    /// Use a preconfigured client (proxy, TLS, timeouts).
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ServiceError> {
        Self::new(
            config.generation_url.clone(),
            config.api_key.clone(),
            config.timeout,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(&self, route: &str, body: &B) -> Result<T, ServiceError> {
        let url = format!("{}/{}", self.endpoint, route);
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(%url, status = status.as_u16(), bytes = text.len(), "generation reply");

        if !status.is_success() {
            let message = error_message(&text).unwrap_or_else(|| truncate(&text, 200));
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message,
            });
        }
        decode_reply(&text)
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn assist(&self, request: &AssistRequest) -> Result<AssistReply, ServiceError> {
        self.post("assist", request).await
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateReply, ServiceError> {
        self.post("generate", request).await
    }
}

/// The span from the first `{` to the last `}`, if any.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Decode a reply body, tolerating prose around the JSON object.
/// A non-null top-level `error` field is a refusal; its model text comes from
/// `rawText` (or the older `raw`).
pub fn decode_reply<T: DeserializeOwned>(body: &str) -> Result<T, ServiceError> {
    let malformed = |message: String| ServiceError::Malformed {
        message,
        raw: body.to_string(),
    };

    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => {
            let block = extract_json_block(body).ok_or_else(|| malformed("no JSON object in reply".to_string()))?;
            serde_json::from_str(block).map_err(|e| malformed(e.to_string()))?
        }
    };

    if let Some(err) = value.get("error").filter(|e| !e.is_null()) {
        let message = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
        let raw = ["rawText", "raw"]
            .iter()
            .find_map(|k| value.get(*k).and_then(Value::as_str))
            .map(str::to_string);
        return Err(ServiceError::Rejected { message, raw });
    }

    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
}

fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("error").and_then(Value::as_str).map(str::to_string)
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((i, _)) => format!("{}…", &s[..i]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_json_block() {
        assert_eq!(extract_json_block("Sure! {\"a\": {\"b\": 1}} done"), Some("{\"a\": {\"b\": 1}}"));
        assert_eq!(extract_json_block("} nothing {"), None);
        assert_eq!(extract_json_block("no braces"), None);
    }

    #[test]
    fn test_decode_assist_reply_with_legacy_names() {
        let reply: AssistReply =
            decode_reply(r#"Here you go: {"dsl": {"version": "0.1"}, "summary": "added a title"}"#).unwrap();
        assert_eq!(reply.document, json!({"version": "0.1"}));
        assert_eq!(reply.summary.as_deref(), Some("added a title"));
    }

    #[test]
    fn test_decode_generate_reply() {
        let reply: GenerateReply = decode_reply(
            r#"{"document": {}, "generatedCode": "export default 1", "qaText": "- check focus"}"#,
        )
        .unwrap();
        assert_eq!(reply.generated_code.as_deref(), Some("export default 1"));
        assert_eq!(reply.qa_text.as_deref(), Some("- check focus"));
    }

    #[test]
    fn test_error_payload_is_rejection() {
        let err = decode_reply::<AssistReply>(r#"{"error": "model returned no JSON", "raw": "hmm"}"#).unwrap_err();
        match err {
            ServiceError::Rejected { message, raw } => {
                assert_eq!(message, "model returned no JSON");
                assert_eq!(raw.as_deref(), Some("hmm"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_rejection_carries_raw_text() {
        let err = decode_reply::<AssistReply>(r#"{"error": "bad model JSON", "rawText": "the model said hi"}"#)
            .unwrap_err();
        match err {
            ServiceError::Rejected { message, raw } => {
                assert_eq!(message, "bad model JSON");
                assert_eq!(raw.as_deref(), Some("the model said hi"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_null_error_field_is_ignored() {
        let reply: AssistReply =
            decode_reply(r#"{"document": {"version": "0.1"}, "summary": "ok", "error": null}"#).unwrap();
        assert_eq!(reply.document, json!({"version": "0.1"}));
        assert_eq!(reply.summary.as_deref(), Some("ok"));
    }

    #[test]
    fn test_missing_document_is_malformed() {
        let err = decode_reply::<AssistReply>(r#"{"summary": "nothing"}"#).unwrap_err();
        assert!(matches!(err, ServiceError::Malformed { .. }));
        let err = decode_reply::<AssistReply>("plain prose").unwrap_err();
        assert!(matches!(err, ServiceError::Malformed { .. }));
    }

    #[test]
    fn test_request_wire_shape() {
        let document = uiforge_dsl::validate(&json!({"version": "0.1", "root": {"type": "form", "id": "f"}})).unwrap();
        let request = AssistRequest {
            document,
            instructions: vec![ChatMessage::user("add a password field")],
        };
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["instructions"][0], json!({"role": "user", "text": "add a password field"}));
        assert_eq!(wire["document"]["root"]["type"], "form");
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let service = HttpGenerationService::new("http://localhost:8787/api/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(service.endpoint(), "http://localhost:8787/api");
    }
}
