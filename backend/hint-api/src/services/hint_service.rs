use lazy_static::lazy_static;
use regex::Regex;
use std::{sync::Arc, time::Duration};

use crate::{
    error::HintError,
    metrics,
    models::hint::{HintRequest, HintResponse, OutputMode},
    services::{
        gemini_client::{GenerationParams, TextGenerator, UpstreamError},
        prompt::Prompt,
        AppState,
    },
    utils::retry::{retry_async_when, RetryConfig},
};

lazy_static! {
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)^```[A-Za-z0-9_-]*\s*\n(.*?)\n?\s*```$").unwrap();
}

pub struct HintService {
    generator: Arc<dyn TextGenerator>,
    params: GenerationParams,
    retry: RetryConfig,
    upstream_timeout: Duration,
    output_mode: OutputMode,
}

impl HintService {
    pub fn new(state: &AppState) -> Self {
        Self {
            generator: state.generator.clone(),
            params: GenerationParams::from(&state.config),
            retry: RetryConfig::with_attempts(state.config.upstream_max_attempts),
            upstream_timeout: state.config.upstream_timeout(),
            output_mode: state.config.output_mode,
        }
    }

    pub async fn generate_hint(&self, req: &HintRequest) -> Result<HintResponse, HintError> {
        tracing::info!(
            "Processing hint request: type={}, problem_len={}, code_len={}",
            req.hint_type,
            req.problem.len(),
            req.code_so_far.len()
        );

        let prompt = Prompt::from(req);

        let raw = match self.call_upstream(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                metrics::record_hint(req.hint_type.as_str(), "upstream_error");
                return Err(HintError::UpstreamFailure(format!(
                    "{} API error: {}",
                    self.generator.provider(),
                    e
                )));
            }
        };

        let text = match extract_hint_text(&raw, req.hint_type.output_field(), self.output_mode) {
            Ok(text) => text,
            Err(reason) => {
                metrics::record_hint(req.hint_type.as_str(), "malformed_output");
                return Err(HintError::UpstreamFailure(format!(
                    "{} API error: {}",
                    self.generator.provider(),
                    reason
                )));
            }
        };

        metrics::record_hint(req.hint_type.as_str(), "success");
        tracing::info!(
            "Hint generated: type={}, length={}",
            req.hint_type,
            text.len()
        );

        Ok(HintResponse::new(req.hint_type, text))
    }

    // Each attempt gets its own deadline; only transient failures are retried.
    async fn call_upstream(&self, prompt: &Prompt) -> Result<String, UpstreamError> {
        let generator = self.generator.as_ref();
        let params = &self.params;
        let timeout = self.upstream_timeout;

        retry_async_when(
            self.retry.clone(),
            move || async move {
                metrics::track_upstream_call(async {
                    match tokio::time::timeout(timeout, generator.generate(prompt, params)).await {
                        Ok(result) => result,
                        Err(_) => Err(UpstreamError::Timeout(timeout)),
                    }
                })
                .await
            },
            UpstreamError::is_retryable,
        )
        .await
    }
}

/// Pulls the hint out of the model's reply.
///
/// The reply is expected to be `{"<field>": "..."}`, optionally wrapped in a
/// markdown fence. Anything else is passed through trimmed in lenient mode and
/// rejected in strict mode.
pub fn extract_hint_text(raw: &str, field: &str, mode: OutputMode) -> Result<String, String> {
    let trimmed = raw.trim();

    if let Some(value) = parse_single_field(trimmed, field) {
        return Ok(value);
    }

    match mode {
        OutputMode::Lenient => Ok(trimmed.to_string()),
        OutputMode::Strict => Err(format!(
            "model output is not a JSON object with a \"{}\" string field",
            field
        )),
    }
}

fn parse_single_field(text: &str, field: &str) -> Option<String> {
    let body = CODE_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(text);

    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get(field)?
        .as_str()
        .map(|s| s.trim().to_string())
}
