use crate::config::Config;
use crate::error::{Text2SqlError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// Anything that turns a question into SQL text.
#[async_trait]
pub trait SqlGenerator: Send + Sync {
    /// Return the model's raw answer for `question`, whitespace-trimmed.
    async fn generate_sql(&self, question: &str, system_prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
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

/// Chat-completion client for an OpenAI-compatible endpoint (Groq by default).
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl LlmClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            Text2SqlError::Config("GROQ_API_KEY is not set (use --api-key or .env)".to_string())
        })?;

        Ok(Self::new(api_key, config.model.clone(), config.base_url.clone())
            .with_max_tokens(config.max_tokens))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn call_llm(&self, system_prompt: &str, question: &str) -> Result<String> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: question },
            ],
            temperature: 0.0,
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Text2SqlError::Generation(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let truncated: String = text.chars().take(200).collect();
            return Err(Text2SqlError::Generation(format!(
                "LLM API returned {}: {}",
                status, truncated
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Text2SqlError::Generation(format!("Failed to parse LLM response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Text2SqlError::Generation("No content in LLM response".to_string()))
    }
}

#[async_trait]
impl SqlGenerator for LlmClient {
    async fn generate_sql(&self, question: &str, system_prompt: &str) -> Result<String> {
        info!("Requesting SQL from model {}", self.model);
        let content = self.call_llm(system_prompt, question).await?;
        debug!("Raw model output: {}", content);
        Ok(content.trim().to_string())
    }
}
