//! Mapping of engine errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use quickeats_core::EngineError;

use crate::metrics::ENGINE_REJECTIONS;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

/// An engine error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            EngineError::NotAuthorized | EngineError::NotAssignedChef(_) => StatusCode::FORBIDDEN,
            EngineError::DuplicateTicket { .. }
            | EngineError::AlreadyClaimed(_)
            | EngineError::AlreadyCompleted(_)
            | EngineError::NotClaimed(_)
            | EngineError::ChefUnavailable(_)
            | EngineError::HasActiveTickets { .. } => StatusCode::CONFLICT,
            EngineError::ChannelUnavailable(_) => StatusCode::BAD_GATEWAY,
            EngineError::PersistenceFailure(_) | EngineError::InvalidConfig(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.0.code();
        ENGINE_REJECTIONS.with_label_values(&[code]).inc();

        if status.is_server_error() {
            tracing::error!(code, "Request failed: {}", self.0);
        } else {
            tracing::debug!(code, "Request rejected: {}", self.0);
        }

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code,
            }),
        )
            .into_response()
    }
}
