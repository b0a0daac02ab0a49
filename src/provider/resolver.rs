// src/provider/resolver.rs — Client construction: hosted vs local endpoint

use std::sync::Arc;

use super::openai_compat::OpenAICompatProvider;
use super::{ModelProvider, ModelRef};
use crate::infra::config::ModelConfig;

/// Resolved connection settings for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub id: &'static str,
    pub name: &'static str,
    pub base_url: String,
    pub api_key: String,
}

/// Pick the endpoint from config plus the `OPENAI_API_KEY` / `OPENAI_BASE_URL`
/// values. The local endpoint ignores both and uses the fixed placeholder key.
pub fn resolve_endpoint(
    config: &ModelConfig,
    api_key: Option<String>,
    base_url: Option<String>,
) -> anyhow::Result<Endpoint> {
    if config.local {
        return Ok(Endpoint {
            id: "local",
            name: "Local (OpenAI-compatible)",
            base_url: config.local_base_url.clone(),
            api_key: config.local_api_key.clone(),
        });
    }

    let api_key = api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
        anyhow::anyhow!("OPENAI_API_KEY is not set. Export it, add it to .env, or pass --local.")
    })?;

    Ok(Endpoint {
        id: "openai",
        name: "OpenAI",
        base_url: base_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| config.hosted_base_url.clone()),
        api_key,
    })
}

/// Build the provider once, before the loop starts.
pub fn build_provider(config: &ModelConfig) -> anyhow::Result<(Arc<dyn ModelProvider>, ModelRef)> {
    let endpoint = resolve_endpoint(
        config,
        std::env::var("OPENAI_API_KEY").ok(),
        std::env::var("OPENAI_BASE_URL").ok(),
    )?;

    tracing::debug!(
        provider = endpoint.id,
        base_url = %endpoint.base_url,
        "provider resolved"
    );

    let model_ref = ModelRef::new(endpoint.id, config.name.clone());
    let provider = OpenAICompatProvider::new(
        endpoint.id,
        endpoint.name,
        endpoint.api_key,
        endpoint.base_url,
    );
    Ok((Arc::new(provider), model_ref))
}
