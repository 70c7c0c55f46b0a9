use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    error::HintError,
    extractors::AppJson,
    metrics,
    models::hint::{GenerateHintPayload, HintRequest, HintResponse},
    services::{hint_service::HintService, AppState},
};

/// POST /generate-hint
pub async fn generate_hint(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<GenerateHintPayload>,
) -> Result<Json<HintResponse>, HintError> {
    let request = HintRequest::try_from(payload).inspect_err(|_| {
        metrics::record_hint("invalid", "invalid_argument");
    })?;

    let service = HintService::new(&state);
    let response = service.generate_hint(&request).await?;

    Ok(Json(response))
}
