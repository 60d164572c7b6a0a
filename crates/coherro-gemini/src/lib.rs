// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini provider adapter for Coherro.
//!
//! Implements [`ProviderAdapter`] on top of the `streamGenerateContent`
//! endpoint. The conversation history is sent in full with every request;
//! the resulting stream yields plain text deltas.

pub mod client;
pub mod prompt;
pub mod sse;
pub mod types;

use async_trait::async_trait;
use coherro_config::CoherroConfig;
use coherro_core::types::{AdapterType, CompletionRequest, HealthStatus, TurnRole};
use coherro_core::{CoherroError, DeltaStream, PluginAdapter, ProviderAdapter};
use secrecy::SecretString;
use tracing::{debug, info};

use crate::client::GeminiClient;
use crate::types::{Content, GenerateContentRequest, GenerationConfig};

/// Environment variable consulted when `model.api_key` is not configured.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Gemini provider implementing the Coherro provider adapter.
pub struct GeminiProvider {
    client: GeminiClient,
    system_prompt: String,
}

impl GeminiProvider {
    /// Creates a provider from configuration.
    ///
    /// Resolves the API key from config or the `GEMINI_API_KEY` environment
    /// variable, and loads the system prompt from file, inline config, or the
    /// built-in default.
    pub async fn new(config: &CoherroConfig) -> Result<Self, CoherroError> {
        let api_key = resolve_api_key(&config.model.api_key, |name| std::env::var(name).ok())?;
        let client = GeminiClient::new(
            api_key,
            config.model.model.clone(),
            config.model.base_url.clone(),
        )?;
        let system_prompt = prompt::load_system_prompt(
            &config.model.system_prompt,
            &config.model.system_prompt_file,
        )
        .await;

        info!(model = %config.model.model, "Gemini provider initialized");
        Ok(Self::with_client(client, system_prompt))
    }

    pub fn with_client(client: GeminiClient, system_prompt: String) -> Self {
        Self {
            client,
            system_prompt,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn to_api_request(&self, request: &CompletionRequest) -> GenerateContentRequest {
        let contents = request
            .turns
            .iter()
            .filter(|turn| !turn.content.trim().is_empty())
            .map(|turn| {
                let role = match turn.role {
                    TurnRole::User => "user",
                    TurnRole::Model => "model",
                };
                Content::text(Some(role), turn.content.clone())
            })
            .collect();

        let system = request
            .system_instruction
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.system_prompt);

        GenerateContentRequest {
            contents,
            system_instruction: Some(Content::text(None, system)),
            generation_config: GenerationConfig {
                max_output_tokens: request.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl PluginAdapter for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, CoherroError> {
        // Avoids spending tokens; a constructed client is considered healthy.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CoherroError> {
        debug!("Gemini provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for GeminiProvider {
    async fn stream_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<DeltaStream, CoherroError> {
        let api_request = self.to_api_request(&request);
        if api_request.contents.is_empty() {
            return Err(CoherroError::Provider {
                message: "conversation has no content to send".into(),
                source: None,
            });
        }
        debug!(
            turns = api_request.contents.len(),
            max_output_tokens = request.max_output_tokens,
            "opening Gemini stream"
        );
        self.client.stream_generate(&api_request).await
    }
}

/// Resolves the API key from config, then the environment.
fn resolve_api_key(
    config_key: &Option<String>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, CoherroError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(SecretString::from(key.clone()));
    }

    env(API_KEY_ENV)
        .filter(|key| !key.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| {
            CoherroError::Config(format!(
                "Gemini API key not found. Set model.api_key in config or the {API_KEY_ENV} environment variable."
            ))
        })
}
