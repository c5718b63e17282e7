//! Envelope responses
//!
//! Every gateway reply, including failures, is an [`ApiEnvelope`] whose
//! `code` mirrors the HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use super::jwt::TokenError;
use super::provider::UpstreamError;
use crate::api::ApiEnvelope;

/// `200` envelope carrying `data`
pub fn ok<T: Serialize>(data: T) -> Response {
    Json(ApiEnvelope::success(data)).into_response()
}

/// `200` envelope carrying `data` under a custom message
pub fn ok_with<T: Serialize>(msg: &str, data: T) -> Response {
    let mut envelope = ApiEnvelope::success(data);
    envelope.msg = msg.to_string();
    Json(envelope).into_response()
}

/// `200` envelope with only a message
pub fn ok_message(msg: &str) -> Response {
    Json(ApiEnvelope::<()>::message(StatusCode::OK.as_u16().into(), msg)).into_response()
}

fn failure(status: StatusCode, msg: &str) -> Response {
    (
        status,
        Json(ApiEnvelope::<()>::message(status.as_u16().into(), msg)),
    )
        .into_response()
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("Internal server error")]
    Internal(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn invalid_body() -> Self {
        Self::BadRequest("Invalid request body".to_string())
    }
}

impl From<UpstreamError> for GatewayError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status { status, message } => Self::Upstream { status, message },
            e @ UpstreamError::ProviderNotFound(_) => Self::BadRequest(e.to_string()),
            UpstreamError::Internal(detail) => Self::Internal(detail),
        }
    }
}

impl From<TokenError> for GatewayError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(detail) => Self::Internal(detail),
            other => Self::Unauthorized(other.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            error!("Gateway request failed: {}", detail);
        }
        failure(self.status(), &self.to_string())
    }
}
