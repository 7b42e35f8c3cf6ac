use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use super::dto::AnalyzeRequest;
use super::error::ApiError;
use super::AppState;
use crate::matcher::AnalyzeResult;

/// `POST /analyze`: match the text against every candidate, then store it.
pub(crate) async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResult>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let words = state.candidates.candidates().await?;
    let result = state.matcher.analyze(&request.text, &words);
    tracing::debug!(
        candidates = words.len(),
        value = ?result.value,
        lexical = ?result.lexical,
        "matched text"
    );

    persist_in_background(&state, request.text);

    Ok(Json(result))
}

/// `GET /analyze`: occurrence count per stored phrase.
pub(crate) async fn phrase_counts(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, u64>>, ApiError> {
    Ok(Json(state.store.phrase_counts().await?))
}

/// Store the submitted text without holding up the response. A failed insert
/// is only logged.
fn persist_in_background(state: &AppState, text: String) {
    let store = Arc::clone(&state.store);
    state.writes.spawn(async move {
        match store.insert_phrase(&text).await {
            Ok(()) => tracing::debug!(len = text.len(), "stored phrase"),
            Err(e) => tracing::error!(error = %e, "failed to save text in the phrase store"),
        }
    });
}
