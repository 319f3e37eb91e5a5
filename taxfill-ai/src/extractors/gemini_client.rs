//! Gemini Client
//!
//! HTTP client for a Gemini-style `generateContent` endpoint.
//!
//! # API Reference
//! - Endpoint: `{base}/models/{model}:generateContent`
//! - Auth: `x-goog-api-key` header
//! - Inline binary content is base64 encoded into `inline_data` parts
//!
//! # Status Mapping
//! - 429 → Quota
//! - 401/403 → Auth
//! - 5xx, connection failures → Transient
//! - client-side timeout → Timeout

use crate::extractors::generation::{GenerationClient, GenerationError, InlineContent};
use async_trait::async_trait;
use base64::Engine;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use taxfill_common::{Error, Result};
use tracing::debug;

/// User-Agent header sent with every request
const USER_AGENT: &str = concat!("taxfill-ai/", env!("CARGO_PKG_VERSION"));

/// Gemini Client
pub struct GeminiClient {
    http_client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Create a client; fails only if the HTTP client cannot be built
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT),
        );

        let http_client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    fn request_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn build_request(prompt: &str, inline: Option<InlineContent<'_>>) -> GenerateRequest {
        let mut parts = Vec::with_capacity(2);
        if let Some(content) = inline {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: content.mime_type.to_string(),
                    data: base64::engine::general_purpose::STANDARD.encode(content.data),
                },
            });
        }
        parts.push(Part::Text {
            text: prompt.to_string(),
        });

        GenerateRequest {
            contents: vec![Content { parts }],
        }
    }
}

/// Map a non-success status to the error taxonomy
fn classify_status(status: StatusCode, body: &str) -> GenerationError {
    let detail = format!("{}: {}", status, body.chars().take(200).collect::<String>());
    match status.as_u16() {
        429 => GenerationError::Quota(detail),
        401 | 403 => GenerationError::Auth(detail),
        408 => GenerationError::Timeout(detail),
        500..=599 => GenerationError::Transient(detail),
        _ => GenerationError::InvalidResponse(detail),
    }
}

fn classify_transport(err: reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout(err.to_string())
    } else {
        GenerationError::Transient(err.to_string())
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    async fn generate(
        &self,
        prompt: &str,
        inline: Option<InlineContent<'_>>,
    ) -> std::result::Result<String, GenerationError> {
        debug!(
            model = %self.model,
            inline_bytes = inline.map(|c| c.data.len()).unwrap_or(0),
            "Sending generateContent request"
        );

        let response = self
            .http_client
            .post(self.request_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::build_request(prompt, inline))
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let reply: GenerateResponse = response.json().await.map_err(|e| {
            GenerationError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        let text = reply.text();
        if text.trim().is_empty() {
            return Err(GenerationError::InvalidResponse(
                "Response contained no text".to_string(),
            ));
        }

        debug!(model = %self.model, chars = text.len(), "generateContent reply received");
        Ok(text)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_places_inline_data_before_prompt() {
        let request = GeminiClient::build_request(
            "extract",
            Some(InlineContent {
                mime_type: "application/pdf",
                data: b"%PDF-1.7",
            }),
        );
        let json = serde_json::to_value(&request).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["inline_data"]["mime_type"], "application/pdf");
        assert_eq!(parts[0]["inline_data"]["data"], "JVBERi0xLjc=");
        assert_eq!(parts[1]["text"], "extract");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let reply: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "```json\n"}, {"text": "{}\n```"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(reply.text(), "```json\n{}\n```");

        let empty: GenerateResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(empty.text(), "");
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            GenerationError::Quota(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, ""),
            GenerationError::Auth(_)
        ));
        assert!(classify_status(StatusCode::BAD_GATEWAY, "").is_transient());
        assert!(!classify_status(StatusCode::BAD_REQUEST, "").is_transient());
    }

    #[test]
    fn test_request_url_trims_trailing_slash() {
        let client = GeminiClient::new(
            "http://localhost:8080/v1beta/",
            "gemini-1.5-flash",
            "key",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.request_url(),
            "http://localhost:8080/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(client.name(), "Gemini");
    }
}
