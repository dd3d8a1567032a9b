//! The inference client abstraction and its bundled HTTP implementation.
//!
//! The orchestrator only needs one capability from the model-serving side:
//! `complete(image, prompt, sampling) -> (text, token_count)`. Defining that
//! as the narrow [`VisionClient`] trait keeps the retry and concurrency
//! logic testable against a deterministic stub — no live endpoint, no
//! network — while [`OpenAiCompatClient`] covers the common production case
//! of a vLLM or OpenAI-compatible server.

use crate::error::ClientError;
use crate::pipeline::encode;
use async_trait::async_trait;
use image::DynamicImage;
use serde::Deserialize;
use tracing::debug;

/// One inference request: a page image, a prompt, and sampling parameters.
///
/// Sampling parameters travel with the request (rather than living on the
/// client) because the orchestrator re-issues the same item with different
/// temperature/top-p when output is degenerate.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub image: &'a DynamicImage,
    pub prompt: &'a str,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

/// One inference response: the model text and its completion token count.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub text: String,
    pub token_count: u32,
}

/// Narrow capability interface to the model-serving endpoint.
///
/// The connection behind an implementation may be shared read-only across
/// workers; request construction is stateless.
#[async_trait]
pub trait VisionClient: Send + Sync {
    async fn complete(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<CompletionResponse, ClientError>;
}

// ── OpenAI-compatible client ─────────────────────────────────────────────

/// [`VisionClient`] for OpenAI-compatible chat-completion endpoints
/// (vLLM, llama.cpp server, the hosted APIs).
///
/// The page image travels as a base64 PNG data URI inside the user message,
/// after being scaled into the model's pixel budget.
pub struct OpenAiCompatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatClient {
    /// Create a client for the given endpoint.
    ///
    /// `base_url` may be given with or without the `/v1` suffix; it is
    /// normalised so `http://localhost:8000` and `http://localhost:8000/v1`
    /// behave identically.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into().trim_end_matches('/').to_string();
        if !base_url.ends_with("/v1") {
            base_url.push_str("/v1");
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl VisionClient for OpenAiCompatClient {
    async fn complete(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<CompletionResponse, ClientError> {
        let scaled = encode::scale_to_fit(request.image);
        let image_b64 = encode::to_base64_png(&scaled)?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image_url",
                        "image_url": { "url": format!("data:image/png;base64,{image_b64}") },
                    },
                    { "type": "text", "text": request.prompt },
                ],
            }],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "top_p": request.top_p,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Endpoint {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::MalformedResponse("no choices in response".into()))?;
        let token_count = completion
            .usage
            .map(|u| u.completion_tokens)
            .unwrap_or_default();
        debug!(tokens = token_count, "completion received");

        Ok(CompletionResponse {
            text: choice.message.content.unwrap_or_default(),
            token_count,
        })
    }
}

// Only the fields the pipeline consumes; everything else in the
// chat-completion body is ignored.
#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_v1_suffix() {
        let c = OpenAiCompatClient::new("http://localhost:8000", "EMPTY", "ocr");
        assert_eq!(c.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn base_url_with_v1_unchanged() {
        let c = OpenAiCompatClient::new("http://localhost:8000/v1/", "EMPTY", "ocr");
        assert_eq!(c.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn completion_body_parses_without_usage() {
        let json = r#"{"choices":[{"message":{"content":"<div></div>"}}]}"#;
        let parsed: ChatCompletion = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("<div></div>")
        );
        assert!(parsed.usage.is_none());
    }
}
