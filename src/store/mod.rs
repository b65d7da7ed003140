// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! Product records and the document-store interface.
//!
//! The store is an external managed service; this module owns the
//! record shape, the trait the gateway programs against, and an
//! in-process implementation used by tests and local development.

pub mod firestore;

pub use firestore::FirestoreStore;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// Listing lifecycle status. Any admin may set any status in any order;
/// there is no enforced workflow ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Pending,
    Approved,
    Rejected,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Pending => "pending",
            ProductStatus::Approved => "approved",
            ProductStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ProductStatus::Pending),
            "approved" => Ok(ProductStatus::Approved),
            "rejected" => Ok(ProductStatus::Rejected),
            other => anyhow::bail!("unknown product status: {other}"),
        }
    }
}

/// A stored product listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub image_url: String,
    /// Immutable after creation.
    pub owner_subject_id: String,
    pub status: ProductStatus,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub is_deleted: bool,
}

/// Fields supplied when creating a listing. Status is always forced to
/// `pending` and the owner to the authenticated caller by the endpoint,
/// so neither appears here.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub image_url: String,
    pub owner_subject_id: String,
}

/// Partial update. Never carries `status`, `owner_subject_id`, or
/// `is_deleted`; those move only through their dedicated operations.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<Vec<String>>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.keywords.is_none()
    }
}

/// Interface to the product document collection.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert a new record with `status=pending`, fresh timestamps, and
    /// `is_deleted=false`. Returns the generated document id.
    async fn create(&self, product: NewProduct) -> Result<String>;

    /// Point lookup that hides soft-deleted records. The owner-facing
    /// endpoints pre-check through this variant, so a deleted listing
    /// reads as absent to its owner.
    async fn get(&self, id: &str) -> Result<Option<Product>>;

    /// Point lookup that does NOT hide soft-deleted records. Only the
    /// admin status-update pre-check uses this variant.
    async fn get_any(&self, id: &str) -> Result<Option<Product>>;

    /// Equality scan over the owner field, excluding deleted records.
    async fn list_by_owner(&self, owner_subject_id: &str) -> Result<Vec<Product>>;

    /// Full scan with optional status filter, excluding deleted records.
    async fn list_all(&self, status: Option<ProductStatus>) -> Result<Vec<Product>>;

    /// Partial update; refreshes `updated_at`. Returns false when the
    /// document does not exist.
    async fn update(&self, id: &str, patch: ProductPatch) -> Result<bool>;

    /// Set the lifecycle status (admin path, unconstrained transitions).
    async fn update_status(&self, id: &str, status: ProductStatus) -> Result<bool>;

    /// Flag the record deleted. The record stays in the collection.
    async fn soft_delete(&self, id: &str) -> Result<bool>;

    fn name(&self) -> &str;
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

// ══════════════════════════════════════════════════════════════════════════════
// In-memory store (tests, local development)
// ══════════════════════════════════════════════════════════════════════════════

/// HashMap-backed store with the same soft-delete visibility rules as
/// the managed service. No persistence.
#[derive(Default)]
pub struct MemoryStore {
    products: Mutex<HashMap<String, Product>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn create(&self, product: NewProduct) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_rfc3339();
        let record = Product {
            id: id.clone(),
            title: product.title,
            description: product.description,
            keywords: product.keywords,
            image_url: product.image_url,
            owner_subject_id: product.owner_subject_id,
            status: ProductStatus::Pending,
            created_at: now.clone(),
            updated_at: now,
            is_deleted: false,
        };

        self.products
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(id.clone(), record);
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<Product>> {
        Ok(self.get_any(id).await?.filter(|p| !p.is_deleted))
    }

    async fn get_any(&self, id: &str) -> Result<Option<Product>> {
        let products = self
            .products
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(products.get(id).cloned())
    }

    async fn list_by_owner(&self, owner_subject_id: &str) -> Result<Vec<Product>> {
        let products = self
            .products
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(products
            .values()
            .filter(|p| p.owner_subject_id == owner_subject_id && !p.is_deleted)
            .cloned()
            .collect())
    }

    async fn list_all(&self, status: Option<ProductStatus>) -> Result<Vec<Product>> {
        let products = self
            .products
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(products
            .values()
            .filter(|p| !p.is_deleted)
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect())
    }

    async fn update(&self, id: &str, patch: ProductPatch) -> Result<bool> {
        let mut products = self
            .products
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(record) = products.get_mut(id) else {
            return Ok(false);
        };

        if let Some(title) = patch.title {
            record.title = title;
        }
        if let Some(description) = patch.description {
            record.description = description;
        }
        if let Some(keywords) = patch.keywords {
            record.keywords = keywords;
        }
        record.updated_at = now_rfc3339();
        Ok(true)
    }

    async fn update_status(&self, id: &str, status: ProductStatus) -> Result<bool> {
        let mut products = self
            .products
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(record) = products.get_mut(id) else {
            return Ok(false);
        };
        record.status = status;
        record.updated_at = now_rfc3339();
        Ok(true)
    }

    async fn soft_delete(&self, id: &str) -> Result<bool> {
        let mut products = self
            .products
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(record) = products.get_mut(id) else {
            return Ok(false);
        };
        record.is_deleted = true;
        record.updated_at = now_rfc3339();
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
