use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use super::dto::ErrorBody;
use crate::candidates::CandidateError;
use crate::store::StorageError;

pub const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("candidate fetch failed: {0}")]
    Candidates(#[from] CandidateError),
    #[error("phrase store failed: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Candidates(_) | ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::BadRequest(message) => {
                tracing::debug!(%message, "rejected analyze request");
                (status, Json(ErrorBody { error: message })).into_response()
            }
            other => {
                // Server-side failures stay opaque to the client.
                tracing::error!(error = %other, "request failed");
                (status, INTERNAL_ERROR_BODY).into_response()
            }
        }
    }
}
