//! Google Gemini provider.
//!
//! Uses the `generateContent` REST endpoint directly.
//!
//! - `x-goog-api-key` header authentication
//! - the canned answer is replayed as a prior model turn:
//!   `[user: input, model: seed, user: input]`
//! - a single harassment safety setting; a blocked prompt or candidate comes
//!   back as [`Generation::SafetyBlocked`], not as an error

use aminochat_config::ProviderConfig;
use aminochat_core::error::ProviderError;
use aminochat_core::provider::{Generation, GenerationRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const HARASSMENT: &str = "HARM_CATEGORY_HARASSMENT";
const SAFETY_FINISH: &str = "SAFETY";

/// Gemini `generateContent` provider.
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    model: String,
    generation_config: GenerationConfig,
    safety_threshold: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: model.into(),
            generation_config: GenerationConfig::default(),
            safety_threshold: "BLOCK_LOW_AND_ABOVE".into(),
            client: build_client(Duration::from_secs(60)),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        let mut provider = Self::new(config.api_key.clone().unwrap_or_default(), &config.model);
        if let Some(url) = &config.api_url {
            provider = provider.with_base_url(url);
        }
        provider.generation_config = GenerationConfig {
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            max_output_tokens: config.max_output_tokens,
        };
        provider.safety_threshold = config.safety_threshold.clone();
        provider.client = build_client(Duration::from_secs(config.timeout_secs));
        provider
    }

    /// Override the endpoint (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_body(&self, request: &GenerationRequest) -> GenerateContentRequest {
        let mut contents = Vec::with_capacity(3);
        if request.has_seed() {
            contents.push(Content::user(&request.user_input));
            contents.push(Content::model(&request.seed_context));
        }
        contents.push(Content::user(&request.user_input));

        GenerateContentRequest {
            contents,
            generation_config: self.generation_config.clone(),
            safety_settings: vec![SafetySetting {
                category: HARASSMENT.into(),
                threshold: self.safety_threshold.clone(),
            }],
        }
    }

    /// Turn an API response into a generation outcome.
    fn interpret(resp: GenerateContentResponse) -> Result<Generation, ProviderError> {
        if let Some(reason) = resp.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_ref()) {
            warn!(reason = %reason, "Gemini blocked the prompt");
            return Ok(Generation::SafetyBlocked);
        }

        let Some(candidate) = resp.candidates.into_iter().next() else {
            return Err(ProviderError::ApiError {
                status_code: 200,
                message: "Gemini returned no candidates".into(),
            });
        };

        let rating_blocked = candidate.safety_ratings.iter().any(|r| r.blocked);
        if candidate.finish_reason.as_deref() == Some(SAFETY_FINISH) || rating_blocked {
            warn!(
                finish_reason = candidate.finish_reason.as_deref().unwrap_or(""),
                "Gemini blocked the response"
            );
            return Ok(Generation::SafetyBlocked);
        }

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        Ok(Generation::Text(text))
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

fn map_status(status: u16, body: String) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited {
            retry_after_secs: 5,
        },
        401 | 403 => ProviderError::AuthenticationFailed("Invalid Gemini API key".into()),
        _ => ProviderError::ApiError {
            status_code: status,
            message: body,
        },
    }
}

#[async_trait]
impl aminochat_core::Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<Generation, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured("Gemini API key is not set".into()));
        }

        let body = self.build_body(&request);
        debug!(
            provider = "gemini",
            model = %self.model,
            input_len = request.user_input.len(),
            turns = body.contents.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini API error");
            return Err(map_status(status, error_body));
        }

        let api_resp: GenerateContentResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse Gemini response: {e}"),
            })?;

        Self::interpret(api_resp)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        if self.api_key.is_empty() {
            return Ok(false);
        }

        let url = format!("{}/models/{}", self.base_url, self.model);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(map_status(status, String::new()));
        }
        Ok(response.status().is_success())
    }
}

// --- Gemini API types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn user(text: &str) -> Self {
        Self::with_role("user", text)
    }

    fn model(text: &str) -> Self {
        Self::with_role("model", text)
    }

    fn with_role(role: &str, text: &str) -> Self {
        Self {
            role: role.into(),
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    top_p: f32,
    max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_k: None,
            top_p: 1.0,
            max_output_tokens: 800,
        }
    }
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    safety_ratings: Vec<SafetyRating>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SafetyRating {
    #[serde(default)]
    blocked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use aminochat_core::Provider;

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn constructor_defaults() {
        let provider = GeminiProvider::new("key", "gemini-pro");
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(
            provider.endpoint(),
            format!("{DEFAULT_BASE_URL}/models/gemini-pro:generateContent")
        );
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let provider = GeminiProvider::new("key", "gemini-pro").with_base_url("http://localhost:8080/v1/");
        assert_eq!(
            provider.endpoint(),
            "http://localhost:8080/v1/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn from_config_copies_generation_settings() {
        let config = ProviderConfig {
            api_key: Some("k".into()),
            top_k: Some(40),
            max_output_tokens: 256,
            ..ProviderConfig::default()
        };
        let provider = GeminiProvider::from_config(&config);
        assert_eq!(provider.model(), "gemini-pro");
        assert_eq!(provider.generation_config.top_k, Some(40));
        assert_eq!(provider.generation_config.max_output_tokens, 256);
        assert_eq!(provider.safety_threshold, "BLOCK_LOW_AND_ABOVE");
    }

    #[test]
    fn body_replays_seed_as_model_turn() {
        let provider = GeminiProvider::new("key", "gemini-pro");
        let body = provider.build_body(&GenerationRequest::new("apa itu depresi", "Depresi adalah..."));
        let json = serde_json::to_value(&body).unwrap();

        let contents = json["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[0]["parts"][0]["text"], "apa itu depresi");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["text"], "Depresi adalah...");
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(contents[2]["parts"][0]["text"], "apa itu depresi");
    }

    #[test]
    fn body_without_seed_sends_single_turn() {
        let provider = GeminiProvider::new("key", "gemini-pro");
        let body = provider.build_body(&GenerationRequest::new("halo", "  "));
        assert_eq!(body.contents.len(), 1);
    }

    #[test]
    fn body_carries_generation_and_safety_settings() {
        let provider = GeminiProvider::new("key", "gemini-pro");
        let json = serde_json::to_value(provider.build_body(&GenerationRequest::new("x", ""))).unwrap();

        let gen_config = &json["generationConfig"];
        assert!((gen_config["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
        assert_eq!(gen_config["topP"], 1.0);
        assert_eq!(gen_config["maxOutputTokens"], 800);
        assert!(gen_config.get("topK").is_none());

        let safety = json["safetySettings"].as_array().unwrap();
        assert_eq!(safety.len(), 1);
        assert_eq!(safety[0]["category"], "HARM_CATEGORY_HARASSMENT");
        assert_eq!(safety[0]["threshold"], "BLOCK_LOW_AND_ABOVE");
    }

    #[test]
    fn parse_text_response() {
        let resp = parse(
            r#"{
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Depresi adalah "}, {"text": "gangguan suasana hati."}]},
                    "finishReason": "STOP",
                    "safetyRatings": [{"category": "HARM_CATEGORY_HARASSMENT", "probability": "NEGLIGIBLE"}]
                }]
            }"#,
        );
        assert_eq!(
            GeminiProvider::interpret(resp).unwrap(),
            Generation::Text("Depresi adalah gangguan suasana hati.".into())
        );
    }

    #[test]
    fn prompt_block_is_safety_blocked() {
        let resp = parse(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#);
        assert_eq!(GeminiProvider::interpret(resp).unwrap(), Generation::SafetyBlocked);
    }

    #[test]
    fn safety_finish_reason_is_safety_blocked() {
        let resp = parse(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#);
        assert_eq!(GeminiProvider::interpret(resp).unwrap(), Generation::SafetyBlocked);
    }

    #[test]
    fn blocked_rating_is_safety_blocked() {
        let resp = parse(
            r#"{"candidates": [{
                "content": {"role": "model", "parts": [{"text": "partial"}]},
                "finishReason": "STOP",
                "safetyRatings": [{"category": "HARM_CATEGORY_HARASSMENT", "probability": "HIGH", "blocked": true}]
            }]}"#,
        );
        assert_eq!(GeminiProvider::interpret(resp).unwrap(), Generation::SafetyBlocked);
    }

    #[test]
    fn no_candidates_is_api_error() {
        let resp = parse("{}");
        match GeminiProvider::interpret(resp) {
            Err(ProviderError::ApiError { status_code: 200, .. }) => {}
            other => panic!("Expected ApiError, got: {other:?}"),
        }
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(map_status(429, String::new()), ProviderError::RateLimited { .. }));
        assert!(matches!(map_status(401, String::new()), ProviderError::AuthenticationFailed(_)));
        assert!(matches!(map_status(403, String::new()), ProviderError::AuthenticationFailed(_)));
        match map_status(500, "boom".into()) {
            ProviderError::ApiError { status_code, message } => {
                assert_eq!(status_code, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("Expected ApiError, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let provider = GeminiProvider::new("", "gemini-pro");
        let err = provider.generate(GenerationRequest::new("halo", "")).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
        assert!(!provider.health_check().await.unwrap());
    }
}
