// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, patch, post},
    Router,
};

use super::types::{AdminProductsQuery, RoleChangeRequest, StatusUpdateRequest};
use crate::auth::{gate, AdminUser};
use crate::error::ApiError;
use crate::gateway::AppState;
use crate::store::Product;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/products", get(list_products))
        .route("/admin/products/{id}/status", patch(update_status))
        .route("/admin/set-admin-role", post(set_admin_role))
        .route("/admin/revoke-admin-role", post(revoke_admin_role))
}

/// GET /admin/products?status= — review queue, deleted excluded.
async fn list_products(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<AdminProductsQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.store.list_all(query.status).await?;
    Ok(Json(products))
}

/// PATCH /admin/products/{id}/status — moderate a listing.
async fn update_status(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // unfiltered lookup: moderation must reach listings the owner has
    // already soft-deleted
    let product = state
        .store
        .get_any(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    if !state.store.update_status(&id, body.status).await? {
        return Err(ApiError::Provider("Failed to update product status".into()));
    }

    tracing::info!(
        product_id = %id,
        admin = %admin.subject_id,
        from = %product.status,
        to = %body.status,
        "product status updated"
    );

    Ok(Json(serde_json::json!({
        "message": format!("Product status updated to {}", body.status),
        "product_id": id,
        "new_status": body.status,
    })))
}

/// POST /admin/set-admin-role — grant the admin claim. Gated by the
/// master secret alone; the bearer token plays no part here.
async fn set_admin_role(
    State(state): State<AppState>,
    Json(body): Json<RoleChangeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    gate::authorize_master_operation(&body.master_key, state.config.master_secret.as_deref())?;

    state.oracle.set_admin_claim(&body.user_id, true).await?;

    tracing::info!(user_id = %body.user_id, "admin role granted");
    Ok(Json(serde_json::json!({
        "message": "Admin role granted. The user must sign in again for the claim to take effect.",
        "user_id": body.user_id,
    })))
}

/// POST /admin/revoke-admin-role — revoke the admin claim.
async fn revoke_admin_role(
    State(state): State<AppState>,
    Json(body): Json<RoleChangeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    gate::authorize_master_operation(&body.master_key, state.config.master_secret.as_deref())?;

    state.oracle.set_admin_claim(&body.user_id, false).await?;

    tracing::info!(user_id = %body.user_id, "admin role revoked");
    Ok(Json(serde_json::json!({
        "message": "Admin role revoked. The user must sign in again for the claim to take effect.",
        "user_id": body.user_id,
    })))
}
