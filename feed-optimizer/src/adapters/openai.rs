use super::{send_with_retry, HttpConfig};
use crate::llm_adapter::{CompletionOptions, LlmAdapter};
use crate::types::{OptimizerError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiAdapter {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    http: HttpConfig,
}

impl OpenAiAdapter {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, http: HttpConfig) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(OptimizerError::Config("OpenAI API key is empty".to_string()));
        }
        Ok(Self {
            client: http.build_client()?,
            api_key,
            model: model.into(),
            base_url: OPENAI_API_URL.to_string(),
            http,
        })
    }

    /// Reads `OPENAI_API_KEY`, and `OPENAI_BASE_URL` when set.
    pub fn from_env(model: impl Into<String>, http: HttpConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            OptimizerError::Config("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        let adapter = Self::new(api_key, model, http)?;
        Ok(match std::env::var("OPENAI_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => adapter.with_base_url(url),
            _ => adapter,
        })
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
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl LlmAdapter for OpenAiAdapter {
    fn adapter_name(&self) -> String {
        format!("openai:{}", self.model)
    }

    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![WireMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature,
            max_tokens: options.max_output_tokens,
        };

        debug!(model = %self.model, "OpenAI chat request");

        let name = self.adapter_name();
        let response = send_with_retry(&name, &self.http, || {
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
        })
        .await?;

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OptimizerError::backend(name, "no choices in response"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_key() {
        let result = OpenAiAdapter::new("", "gpt-4o-mini", HttpConfig::default());
        assert!(matches!(result, Err(OptimizerError::Config(_))));
    }

    #[test]
    fn custom_base_url() {
        let adapter = OpenAiAdapter::new("sk-test", "gpt-4o-mini", HttpConfig::default())
            .unwrap()
            .with_base_url("http://localhost:11434/v1/");
        assert_eq!(adapter.base_url, "http://localhost:11434/v1");
        assert_eq!(adapter.adapter_name(), "openai:gpt-4o-mini");
    }

    #[test]
    fn request_shape() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![WireMessage {
                role: "user",
                content: "rate this",
            }],
            temperature: 0.1,
            max_tokens: 64,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 64);
    }

    #[test]
    fn response_without_choices() {
        let body: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(body.choices.is_empty());
        let body: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"7|Solid"}}]}"#).unwrap();
        assert_eq!(body.choices[0].message.content.as_deref(), Some("7|Solid"));
    }
}
