use super::{send_with_retry, HttpConfig};
use crate::llm_adapter::{CompletionOptions, LlmAdapter};
use crate::types::{OptimizerError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini `generateContent` backend.
pub struct GeminiAdapter {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    http: HttpConfig,
}

impl GeminiAdapter {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, http: HttpConfig) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(OptimizerError::Config("Gemini API key is empty".to_string()));
        }
        Ok(Self {
            client: http.build_client()?,
            api_key,
            model: model.into(),
            base_url: GEMINI_API_URL.to_string(),
            http,
        })
    }

    pub fn from_env(model: impl Into<String>, http: HttpConfig) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            OptimizerError::Config("GEMINI_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key, model, http)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
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
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if there is one.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        Some(content.parts.into_iter().filter_map(|p| p.text).collect())
    }
}

#[async_trait]
impl LlmAdapter for GeminiAdapter {
    fn adapter_name(&self) -> String {
        format!("gemini:{}", self.model)
    }

    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_output_tokens,
            },
        };

        debug!(model = %self.model, "Gemini generateContent request");

        let name = self.adapter_name();
        let response = send_with_retry(&name, &self.http, || {
            self.client
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
                .json(&request)
                .send()
        })
        .await?;

        let body: GenerateContentResponse = response.json().await?;
        body.text()
            .ok_or_else(|| OptimizerError::backend(name, "no candidates in response"))
    }
}
