// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! Failure taxonomy shared by every endpoint.
//!
//! Exactly six outcomes exist. `Misconfigured` means a server-held
//! secret is absent — an operational fault requiring operator action —
//! and must never be presented as `Forbidden`, which asks the caller to
//! fix their credentials instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Schema or validation failure, caught before any provider call.
    #[error("{0}")]
    BadInput(String),

    /// Missing or invalid credential (bearer token or pre-shared key).
    #[error("{0}")]
    Unauthenticated(String),

    /// Valid credential, insufficient privilege.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Server secret absent. Operator action required, not caller action.
    #[error("{0}")]
    Misconfigured(String),

    /// An external provider call failed with no more specific outcome.
    #[error("{0}")]
    Provider(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Misconfigured(_) | ApiError::Provider(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Provider(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Misconfigured(reason) => tracing::error!("misconfiguration: {reason}"),
            ApiError::Provider(reason) => tracing::error!("provider failure: {reason}"),
            ApiError::Unauthenticated(reason) | ApiError::Forbidden(reason) => {
                tracing::warn!("request rejected: {reason}");
            }
            ApiError::BadInput(_) | ApiError::NotFound(_) => {}
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
