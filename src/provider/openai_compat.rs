// src/provider/openai_compat.rs — Generic OpenAI-compatible chat completions provider
//
// Serves both the hosted OpenAI endpoint and local servers that speak the same
// protocol (Ollama's /v1, llama.cpp, vLLM). Only `choices[0].message.content`
// is consumed from the response.

use async_trait::async_trait;

use super::{ChatRequest, ChatResponse, ModelProvider, TokenUsage};
use crate::infra::errors::ReflectError;

/// Provider for any OpenAI-compatible API endpoint.
pub struct OpenAICompatProvider {
    id_str: String,
    name_str: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAICompatProvider {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        api_key: String,
        base_url: String,
    ) -> Self {
        Self {
            id_str: id.into(),
            name_str: name.into(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn provider_error(&self, message: impl Into<String>, retriable: bool) -> ReflectError {
        ReflectError::Provider {
            provider: self.id_str.clone(),
            message: message.into(),
            retriable,
        }
    }
}

/// Map a non-success HTTP status onto the error taxonomy.
///
/// 429 becomes `RateLimited` (honoring `Retry-After` seconds when present),
/// 408 and 5xx are transient, everything else (400, 401, 403, 404, ...) is not.
fn classify_status(
    provider: &str,
    status: reqwest::StatusCode,
    retry_after: Option<&str>,
    body: String,
) -> ReflectError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_ms = retry_after
            .and_then(|v| v.trim().parse::<f64>().ok())
            .map(|secs| (secs * 1000.0) as u64)
            .unwrap_or(0);
        return ReflectError::RateLimited {
            provider: provider.to_string(),
            retry_after_ms,
        };
    }

    let retriable =
        status.is_server_error() || status == reqwest::StatusCode::REQUEST_TIMEOUT;
    ReflectError::Provider {
        provider: provider.to_string(),
        message: format!("HTTP {status}: {body}"),
        retriable,
    }
}

/// Pull the first choice's content and usage out of a completions response.
fn parse_completion(provider: &str, resp: &serde_json::Value) -> Result<ChatResponse, ReflectError> {
    let choice = resp["choices"]
        .as_array()
        .and_then(|choices| choices.first())
        .ok_or_else(|| ReflectError::Provider {
            provider: provider.to_string(),
            message: "response contained no choices".into(),
            retriable: false,
        })?;

    let content = choice["message"]["content"]
        .as_str()
        .unwrap_or("")
        .to_string();

    let usage = TokenUsage {
        input_tokens: resp["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        output_tokens: resp["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    };

    Ok(ChatResponse { content, usage })
}

#[async_trait]
impl ModelProvider for OpenAICompatProvider {
    fn id(&self) -> &str {
        &self.id_str
    }

    fn name(&self) -> &str {
        &self.name_str
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ReflectError> {
        let body = request_body(&request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header(
                "User-Agent",
                format!("reflection-agent/{}", env!("CARGO_PKG_VERSION")),
            )
            .json(&body)
            .send()
            .await
            // Network-level failures (connect, timeout, reset) are transient.
            .map_err(|e| self.provider_error(e.to_string(), true))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let error_body = response.text().await.unwrap_or_default();
            return Err(classify_status(
                &self.id_str,
                status,
                retry_after.as_deref(),
                error_body,
            ));
        }

        let resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| self.provider_error(e.to_string(), false))?;

        parse_completion(&self.id_str, &resp)
    }
}

/// `/chat/completions` body. Unset sampling fields are left out entirely.
fn request_body(request: &ChatRequest) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = request
        .messages
        .iter()
        .map(|m| {
            serde_json::json!({
                "role": m.role.as_str(),
                "content": m.content,
            })
        })
        .collect();

    let mut body = serde_json::json!({
        "model": request.model,
        "messages": messages,
    });
    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = serde_json::json!(max_tokens);
    }
    if let Some(temp) = request.temperature {
        body["temperature"] = serde_json::json!(temp);
    }
    body
}
