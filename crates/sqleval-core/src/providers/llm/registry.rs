use super::ollama::OllamaClient;
use super::openai::OpenAIClient;
use super::LlmClient;
use crate::config::{Backend, Config, ModelSpec, Settings};
use crate::errors::ConfigError;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Owns one client per model identifier. Clients are built on first use from
/// the configured backend and reused for the registry's lifetime.
pub struct ModelRegistry {
    settings: Settings,
    models: BTreeMap<String, ModelSpec>,
    clients: Mutex<HashMap<String, Arc<dyn LlmClient>>>,
}

impl ModelRegistry {
    pub fn new(settings: Settings, models: BTreeMap<String, ModelSpec>) -> Self {
        Self {
            settings,
            models,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.settings.clone(), cfg.models.clone())
    }

    /// Registers a client for a `custom` backend (or overrides any other one).
    pub fn register(&self, model: impl Into<String>, client: Arc<dyn LlmClient>) {
        self.clients.lock().unwrap().insert(model.into(), client);
    }

    pub fn backend(&self, model: &str) -> Backend {
        self.models.get(model).map(|s| s.backend).unwrap_or_default()
    }

    pub fn client(&self, model: &str) -> anyhow::Result<Arc<dyn LlmClient>> {
        let mut clients = self.clients.lock().unwrap();
        if let Some(c) = clients.get(model) {
            return Ok(c.clone());
        }
        let client = self.build(model)?;
        tracing::debug!(model, provider = client.provider_name(), "created model client");
        clients.insert(model.to_string(), client.clone());
        Ok(client)
    }

    fn build(&self, model: &str) -> Result<Arc<dyn LlmClient>, ConfigError> {
        let spec = self.models.get(model).cloned().unwrap_or_default();
        let served = spec.served_name.unwrap_or_else(|| model.to_string());
        let s = &self.settings;

        match spec.backend {
            Backend::HostedApi => {
                let key = std::env::var(&s.openai_api_key_env).map_err(|_| {
                    ConfigError(format!(
                        "model '{}' uses the hosted API but {} is not set",
                        model, s.openai_api_key_env
                    ))
                })?;
                let client = OpenAIClient::new(served, key, s.openai_base_url.clone(), s.temperature)
                    .with_max_tokens(s.max_tokens);
                Ok(Arc::new(client))
            }
            Backend::LocalInference => Ok(Arc::new(OllamaClient::new(
                served,
                s.ollama_url.clone(),
                s.temperature,
            ))),
            Backend::Custom => Err(ConfigError(format!(
                "model '{}' uses a custom backend but no client was registered",
                model
            ))),
        }
    }
}
