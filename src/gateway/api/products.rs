use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use base64::Engine;

use super::types::{
    CreateProductRequest, GenerateDescriptionRequest, GenerateDescriptionResponse,
    UpdateProductRequest,
};
use crate::auth::{gate, ApiKey, AuthenticatedUser};
use crate::error::ApiError;
use crate::gateway::AppState;
use crate::store::{NewProduct, Product, ProductPatch};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products/", post(create_product))
        .route("/products/my-products", get(my_products))
        .route("/products/generate-ai-description", post(generate_description))
        .route(
            "/products/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
}

const TITLE_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 2000;

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.is_empty() || title.chars().count() > TITLE_MAX {
        return Err(ApiError::BadInput(format!(
            "title must be 1-{TITLE_MAX} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), ApiError> {
    if description.is_empty() || description.chars().count() > DESCRIPTION_MAX {
        return Err(ApiError::BadInput(format!(
            "description must be 1-{DESCRIPTION_MAX} characters"
        )));
    }
    Ok(())
}

/// POST /products/ — create a listing owned by the caller.
/// Status is always forced to `pending`; clients cannot self-approve.
async fn create_product(
    _key: ApiKey,
    AuthenticatedUser(identity): AuthenticatedUser,
    State(state): State<AppState>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    validate_title(body.title.trim())?;
    validate_description(body.description.trim())?;
    if body.image_url.trim().is_empty() {
        return Err(ApiError::BadInput("image_url must not be empty".into()));
    }

    let id = state
        .store
        .create(NewProduct {
            title: body.title.trim().to_owned(),
            description: body.description.trim().to_owned(),
            keywords: body.keywords,
            image_url: body.image_url.trim().to_owned(),
            owner_subject_id: identity.subject_id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": id,
            "message": "Product created successfully",
            "status": "pending",
        })),
    ))
}

/// GET /products/my-products — the caller's listings, deleted excluded.
async fn my_products(
    _key: ApiKey,
    AuthenticatedUser(identity): AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.store.list_by_owner(&identity.subject_id).await?;
    Ok(Json(products))
}

/// GET /products/{id} — read rule: owner or admin.
async fn get_product(
    _key: ApiKey,
    AuthenticatedUser(identity): AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .store
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    gate::require_owner_or_admin(&identity, &product)?;
    Ok(Json(product))
}

/// PATCH /products/{id} — write rule: owner only. Never touches status.
async fn update_product(
    _key: ApiKey,
    AuthenticatedUser(identity): AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let product = state
        .store
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    gate::require_owner(&identity, &product)?;

    let patch = ProductPatch {
        title: body.title,
        description: body.description,
        keywords: body.keywords,
    };
    if patch.is_empty() {
        return Err(ApiError::BadInput("No update data provided".into()));
    }
    if let Some(title) = patch.title.as_deref() {
        validate_title(title.trim())?;
    }
    if let Some(description) = patch.description.as_deref() {
        validate_description(description.trim())?;
    }

    if !state.store.update(&id, patch).await? {
        return Err(ApiError::Provider("Failed to update product".into()));
    }

    Ok(Json(serde_json::json!({
        "message": "Product updated successfully",
    })))
}

/// DELETE /products/{id} — owner only; flags the record deleted.
async fn delete_product(
    _key: ApiKey,
    AuthenticatedUser(identity): AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // filtered lookup: a second delete sees the record as already gone
    let product = state
        .store
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    gate::require_owner(&identity, &product)?;

    if !state.store.soft_delete(&id).await? {
        return Err(ApiError::Provider("Failed to delete product".into()));
    }

    Ok(Json(serde_json::json!({
        "message": "Product deleted successfully",
    })))
}

/// POST /products/generate-ai-description — draft a listing from a
/// photo. Gated by the pre-shared key alone.
async fn generate_description(
    _key: ApiKey,
    State(state): State<AppState>,
    Json(body): Json<GenerateDescriptionRequest>,
) -> Result<Json<GenerateDescriptionResponse>, ApiError> {
    let generator = state
        .generator
        .as_ref()
        .ok_or_else(|| ApiError::Misconfigured("AI provider API key not configured".into()))?;

    if body.image_data.trim().is_empty() {
        return Err(ApiError::BadInput("image_data must not be empty".into()));
    }
    let payload = crate::providers::describe::strip_data_uri(body.image_data.trim());
    if base64::engine::general_purpose::STANDARD.decode(payload).is_err() {
        return Err(ApiError::BadInput("image_data must be base64-encoded".into()));
    }

    let draft = generator
        .describe(&body.image_data)
        .await
        .map_err(|err| ApiError::Provider(format!("AI generation failed: {err}")))?;

    Ok(Json(GenerateDescriptionResponse {
        title: draft.title,
        description: draft.description,
        keywords: draft.keywords,
    }))
}
