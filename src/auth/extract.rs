// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! Axum extractors composing the gate checks.
//!
//! Handlers declare these in argument order to fix the check sequence:
//! `ApiKey` before `AuthenticatedUser` guarantees a missing pre-shared
//! key rejects the request before the bearer credential is even looked
//! at.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use super::gate::{self, Identity};
use crate::error::ApiError;
use crate::gateway::AppState;

pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Pre-shared API key gate.
pub struct ApiKey;

impl FromRequestParts<AppState> for ApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        gate::authorize_api_key(provided, state.config.api_secret.as_deref())?;
        Ok(ApiKey)
    }
}

/// Bearer-authenticated caller. Trust is resolved fresh per request.
pub struct AuthenticatedUser(pub Identity);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let authorization = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let identity = gate::authenticate(state.oracle.as_ref(), authorization).await?;
        Ok(AuthenticatedUser(identity))
    }
}

/// Bearer-authenticated caller holding the `admin` claim.
pub struct AdminUser(pub Identity);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(identity) =
            AuthenticatedUser::from_request_parts(parts, state).await?;
        Ok(AdminUser(gate::require_admin(identity)?))
    }
}
