//! OpenAI-compatible provider client

use super::{CompletionError, CompletionModel, ProviderConfig};
use crate::config::ConfigError;
use crate::message::{to_request_messages, ChatMessage};
use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionRequestMessage, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;

/// OpenAI-compatible client wrapper
#[derive(Clone)]
pub struct ProviderClient {
    config: ProviderConfig,
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl ProviderClient {
    /// Create a new provider client from config
    pub fn new(config: ProviderConfig) -> Result<Self, ConfigError> {
        let api_key = Self::get_api_key(&config)?;

        let openai_config = OpenAIConfig::new()
            .with_api_key(&api_key)
            .with_api_base(&config.base_url);

        Ok(Self {
            model: config.default_model.clone(),
            client: Client::with_config(openai_config),
            config,
            temperature: None,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Get API key from environment or XDG auth.json
    fn get_api_key(config: &ProviderConfig) -> Result<String, ConfigError> {
        // Try loading .env file
        let _ = dotenvy::dotenv();

        if let Ok(key) = std::env::var(&config.api_key_env) {
            return Ok(key);
        }

        if let Some(key) = Self::get_key_from_auth_json(&config.name) {
            return Ok(key);
        }

        Err(ConfigError::MissingApiKey(config.api_key_env.clone()))
    }

    /// Try to read API key from ~/.local/share/overseer/auth.json
    fn get_key_from_auth_json(provider_name: &str) -> Option<String> {
        let auth_path = dirs::data_dir()?.join("overseer").join("auth.json");

        let content = std::fs::read_to_string(&auth_path).ok()?;
        let auth: serde_json::Value = serde_json::from_str(&content).ok()?;

        auth.get(provider_name.to_lowercase())?
            .get("key")?
            .as_str()
            .map(|s| s.to_string())
    }

    /// Get the provider config
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Send a non-streaming chat completion request
    pub async fn chat(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<String, CompletionError> {
        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(&self.model).messages(messages);
        if let Some(temperature) = self.temperature {
            request_builder.temperature(temperature);
        }
        let request = request_builder.build()?;

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(CompletionError::EmptyResponse)
    }
}

#[async_trait]
impl CompletionModel for ProviderClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError> {
        let request = to_request_messages(messages)?;
        tracing::debug!(
            provider = %self.config.name,
            model = %self.model,
            messages = request.len(),
            "Sending chat completion request"
        );
        self.chat(request).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
