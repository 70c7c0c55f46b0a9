use std::sync::Arc;

use crate::config::Config;
use gemini_client::{GeminiClient, TextGenerator};

pub struct AppState {
    pub config: Config,
    pub generator: Arc<dyn TextGenerator>,
}

impl AppState {
    /// Builds the Gemini client once at startup.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = GeminiClient::from_config(&config)?;

        tracing::info!(
            "Gemini client ready: model={}, timeout={:?}, max_attempts={}",
            config.gemini_model,
            config.upstream_timeout(),
            config.upstream_max_attempts
        );

        Ok(Self::with_generator(config, Arc::new(client)))
    }

    pub fn with_generator(config: Config, generator: Arc<dyn TextGenerator>) -> Self {
        Self { config, generator }
    }
}

pub mod gemini_client;
pub mod hint_service;
pub mod prompt;
