// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handler error type and its JSON rendering.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use herald_campaign::CampaignError;
use herald_core::HeraldError;
use serde_json::json;

/// Error returned by gateway handlers.
///
/// Renders as `{"error": <message>, "code": <code>}` with a matching status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Campaign(#[from] CampaignError),

    #[error(transparent)]
    Herald(#[from] HeraldError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::Campaign(err) => {
                let status = match err {
                    CampaignError::InvalidJob => StatusCode::BAD_REQUEST,
                    CampaignError::NotFound { .. } => StatusCode::NOT_FOUND,
                    CampaignError::AlreadyDriven { .. } => StatusCode::CONFLICT,
                    CampaignError::StoreCorruption { .. } => {
                        tracing::error!(error = %err, "job store corruption");
                        return (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "internal_error",
                            "An internal error occurred".to_string(),
                        );
                    }
                };
                (status, err.code(), err.to_string())
            }
            Self::Herald(HeraldError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "invalid_input", msg.clone())
            }
            Self::Herald(err) => {
                tracing::error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = json!({
            "error": message,
            "code": code,
        });
        (status, Json(body)).into_response()
    }
}
