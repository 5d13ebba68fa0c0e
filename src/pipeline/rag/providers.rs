//! HTTP generation providers.
//!
//! `OllamaProvider` talks to a local Ollama instance (`/api/generate`).
//! `OpenAiCompatibleProvider` talks to any server exposing the
//! `/v1/chat/completions` shape; it has no repetition penalty control.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::generation::{AnswerGenerator, CompletionRequest, GenerationProvider};
use super::RagError;
use crate::config::ServiceConfig;

fn http_client(timeout_secs: u64) -> Result<reqwest::blocking::Client, RagError> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| RagError::HttpClient(e.to_string()))
}

fn map_send_error(e: reqwest::Error, base_url: &str, timeout_secs: u64) -> RagError {
    if e.is_connect() {
        RagError::ProviderConnection(base_url.to_string())
    } else if e.is_timeout() {
        RagError::HttpClient(format!("Request timed out after {timeout_secs}s"))
    } else {
        RagError::HttpClient(e.to_string())
    }
}

// ── Ollama ─────────────────────────────────────────────────────────────────

pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaProvider {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, RagError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: http_client(timeout_secs)?,
            timeout_secs,
        })
    }
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: u32,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_penalty: Option<f32>,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl<'a> OllamaGenerateRequest<'a> {
    fn from_completion(model: &'a str, request: &CompletionRequest<'a>) -> Self {
        Self {
            model,
            prompt: request.prompt,
            system: request.system,
            stream: false,
            options: OllamaOptions {
                num_predict: request.max_tokens,
                temperature: request.temperature,
                top_p: request.top_p,
                repeat_penalty: request.repetition_penalty,
            },
        }
    }
}

impl GenerationProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, RagError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest::from_completion(&self.model, request);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| map_send_error(e, &self.base_url, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RagError::ProviderStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| RagError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }
}

// ── OpenAI-compatible ──────────────────────────────────────────────────────

pub struct OpenAiCompatibleProvider {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, RagError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            client: http_client(timeout_secs)?,
            timeout_secs,
        })
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_completion(model: &'a str, request: &CompletionRequest<'a>) -> Self {
        Self {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
            stream: false,
        }
    }
}

fn first_choice_text(parsed: ChatCompletionResponse) -> Result<String, RagError> {
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(RagError::EmptyResponse)
}

impl GenerationProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn supports_repetition_penalty(&self) -> bool {
        false
    }

    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, RagError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatCompletionRequest::from_completion(&self.model, request);

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .map_err(|e| map_send_error(e, &self.base_url, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RagError::ProviderStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .map_err(|e| RagError::ResponseParsing(e.to_string()))?;

        first_choice_text(parsed)
    }
}

/// Build the generator from service configuration.
///
/// The secondary provider is only configured when both a URL and a model
/// are set.
pub fn build_generator(config: &ServiceConfig) -> Result<AnswerGenerator, RagError> {
    let primary = OllamaProvider::new(
        &config.ollama_url,
        &config.ollama_model,
        config.provider_timeout_secs,
    )?;

    let secondary: Option<Box<dyn GenerationProvider>> =
        match (&config.fallback_url, &config.fallback_model) {
            (Some(url), Some(model)) => Some(Box::new(OpenAiCompatibleProvider::new(
                url,
                model,
                config.fallback_api_key.clone(),
                config.provider_timeout_secs,
            )?)),
            _ => None,
        };

    tracing::info!(
        primary = %config.ollama_url,
        model = %config.ollama_model,
        fallback = secondary.is_some(),
        "Generation providers configured"
    );

    Ok(AnswerGenerator::new(Box::new(primary), secondary))
}
