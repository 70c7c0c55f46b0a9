#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use leetcode_hint_api::{
    config::Config,
    create_router,
    models::hint::OutputMode,
    services::{
        gemini_client::{GenerationParams, TextGenerator, UpstreamError},
        prompt::Prompt,
        AppState,
    },
};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

/// Scripted stand-in for the model provider that records every prompt it receives.
pub struct FakeGenerator {
    replies: Mutex<VecDeque<Result<String, UpstreamError>>>,
    calls: Mutex<Vec<(Prompt, GenerationParams)>>,
    delay: Option<Duration>,
}

impl FakeGenerator {
    pub fn scripted(replies: Vec<Result<String, UpstreamError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
            delay: None,
        })
    }

    pub fn replying(text: &str) -> Arc<Self> {
        Self::scripted(vec![Ok(text.to_string())])
    }

    pub fn failing(error: UpstreamError) -> Arc<Self> {
        Self::scripted(vec![Err(error)])
    }

    pub fn slow(text: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(vec![Ok(text.to_string())].into()),
            calls: Mutex::new(Vec::new()),
            delay: Some(delay),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(prompt, _)| prompt.clone())
            .collect()
    }

    pub fn params(&self) -> Vec<GenerationParams> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, params)| *params)
            .collect()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    fn provider(&self) -> &str {
        "Fake"
    }

    fn model(&self) -> &str {
        "fake-model"
    }

    async fn generate(
        &self,
        prompt: &Prompt,
        params: &GenerationParams,
    ) -> Result<String, UpstreamError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.clone(), *params));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(UpstreamError::EmptyResponse("no scripted reply".into())))
    }
}

pub fn test_config() -> Config {
    Config {
        gemini_api_key: "test-key".to_string(),
        gemini_model: "fake-model".to_string(),
        gemini_base_url: "http://127.0.0.1:9".to_string(),
        temperature: 0.2,
        max_output_tokens: 150,
        upstream_timeout_secs: 5,
        upstream_max_attempts: 2,
        output_mode: OutputMode::Lenient,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
    }
}

pub fn create_test_app(generator: Arc<FakeGenerator>) -> Router {
    create_test_app_with_config(test_config(), generator)
}

pub fn create_test_app_with_config(config: Config, generator: Arc<dyn TextGenerator>) -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    create_router(Arc::new(AppState::with_generator(config, generator)))
}

pub fn hint_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate-hint")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
