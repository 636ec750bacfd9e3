//! Text enhancement collaborator.
//!
//! The out-of-process rephrasing step between composing a message and
//! sealing it. One call per send, no retry here; every failure is treated
//! as a hard failure of the enclosing send and surfaces as
//! [`Error::Enhancement`].

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rewrites message text before it is sealed.
///
/// Implementations may suspend (network calls). Timeout policy belongs to
/// the implementation, not the store; a timeout surfaces as an ordinary
/// enhancement failure.
#[async_trait]
pub trait TextEnhancer: Send + Sync {
    /// Rewrite `text`, returning the enhanced form.
    async fn enhance(&self, text: &str) -> Result<String>;
}

/// Enhancer that returns the input unchanged.
///
/// Offline mode and tests; the pipeline shape stays identical.
pub struct PassthroughEnhancer;

#[async_trait]
impl TextEnhancer for PassthroughEnhancer {
    async fn enhance(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

/// Base URL of the Gemini `generateContent` endpoint family.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default generation model.
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Request timeout for enhancement calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "topK")]
    top_k: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

/// Enhancer backed by the Gemini API.
///
/// Rephrases messages to sound professional and formal before sealing.
pub struct GeminiEnhancer {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiEnhancer {
    /// Create an enhancer with the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Enhancement(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Override the generation model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn prompt_for(text: &str) -> String {
        format!(
            "You are a secure messaging assistant. Rephrase the following message \
             to sound more professional and formal. Return only the rephrased \
             message, without any preamble, explanation, or quotation marks.\n\n\
             Original message: \"{}\"",
            text
        )
    }
}

#[async_trait]
impl TextEnhancer for GeminiEnhancer {
    async fn enhance(&self, text: &str) -> Result<String> {
        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, self.model);

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Self::prompt_for(text),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                top_p: 1.0,
                top_k: 1,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Enhancement("request timed out".into())
                } else if e.is_connect() {
                    Error::Enhancement("unable to reach the enhancement service".into())
                } else {
                    Error::Enhancement("network error".into())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => Error::Enhancement("authentication with the service failed".into()),
                429 => Error::Enhancement("rate limit exceeded".into()),
                500..=599 => Error::Enhancement(format!("service error ({})", status)),
                _ => Error::Enhancement(format!("unexpected status {}", status)),
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|_| Error::Enhancement("unparseable service response".into()))?;

        let enhanced = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .unwrap_or_default();

        if enhanced.is_empty() {
            return Err(Error::Enhancement("service returned no content".into()));
        }

        Ok(enhanced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passthrough_returns_input() {
        let enhancer = PassthroughEnhancer;
        let out = enhancer.enhance("hello there").await.expect("enhance");
        assert_eq!(out, "hello there");
    }

    #[test]
    fn test_prompt_embeds_original_text() {
        let prompt = GeminiEnhancer::prompt_for("ship it tomorrow");
        assert!(prompt.contains("\"ship it tomorrow\""));
        assert!(prompt.contains("professional and formal"));
    }

    #[test]
    fn test_response_shape_parses() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":" Greetings. "}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(body).expect("parse");
        let text = parsed.candidates[0].content.parts[0].text.trim();
        assert_eq!(text, "Greetings.");
    }

    #[test]
    fn test_empty_candidates_parse_to_default() {
        let parsed: GenerateResponse = serde_json::from_str("{}").expect("parse");
        assert!(parsed.candidates.is_empty());
    }
}
