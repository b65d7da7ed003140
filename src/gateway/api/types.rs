use serde::{Deserialize, Serialize};

use crate::store::ProductStatus;

// ── Auth ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct UserView {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub is_admin: bool,
}

// ── Products ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub image_url: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateDescriptionRequest {
    /// Raw base64 or a `data:image/...;base64,` URI.
    pub image_data: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateDescriptionResponse {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
}

// ── Admin ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AdminProductsQuery {
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ProductStatus,
}

/// The master key travels in the body, not in a bearer header: this is
/// a capability check, not an identity check.
#[derive(Debug, Deserialize)]
pub struct RoleChangeRequest {
    pub user_id: String,
    pub master_key: String,
}
