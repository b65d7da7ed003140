// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! Document-store client speaking the Firestore REST surface.
//!
//! All the store-specific knowledge lives here: the typed field
//! encoding (`stringValue`, `booleanValue`, `arrayValue`), structured
//! queries for the filtered scans, and `updateMask` partial patches.
//! The rest of the crate only sees [`ProductStore`].

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use super::{NewProduct, Product, ProductPatch, ProductStatus, ProductStore};

const COLLECTION: &str = "products";
/// Single bounded attempt per call; the gateway performs no retries.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct FirestoreStore {
    client: Client,
    project_id: String,
    api_key: String,
}

impl FirestoreStore {
    pub fn new(project_id: &str, api_key: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            project_id: project_id.to_owned(),
            api_key: api_key.to_owned(),
        }
    }

    fn documents_url(&self) -> String {
        format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents",
            self.project_id
        )
    }

    async fn run_query(&self, query: Value) -> Result<Vec<Product>> {
        let url = format!("{}:runQuery", self.documents_url());
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "structuredQuery": query }))
            .send()
            .await
            .context("Failed to reach document store")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            bail!("Document store query error: {error_text}");
        }

        let rows: Vec<Value> = response
            .json()
            .await
            .context("Failed to parse document store query response")?;

        rows.iter()
            // rows without a `document` key carry readTime bookkeeping only
            .filter_map(|row| row.get("document"))
            .map(document_to_product)
            .collect()
    }

    async fn patch_fields(&self, id: &str, fields: Value) -> Result<bool> {
        if self.fetch_document(id).await?.is_none() {
            return Ok(false);
        }

        let mut fields = fields;
        fields["updated_at"] = string_value(&super::now_rfc3339());

        let mask: Vec<(&str, String)> = fields
            .as_object()
            .map(|map| {
                map.keys()
                    .map(|k| ("updateMask.fieldPaths", k.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let url = format!("{}/{}/{}", self.documents_url(), COLLECTION, id);
        let response = self
            .client
            .patch(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(&mask)
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .context("Failed to reach document store")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            bail!("Document store update error: {error_text}");
        }
        Ok(true)
    }

    async fn fetch_document(&self, id: &str) -> Result<Option<Product>> {
        let url = format!("{}/{}/{}", self.documents_url(), COLLECTION, id);
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .context("Failed to reach document store")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            bail!("Document store lookup error: {error_text}");
        }

        let document: Value = response
            .json()
            .await
            .context("Failed to parse document store response")?;
        document_to_product(&document).map(Some)
    }
}

#[async_trait]
impl ProductStore for FirestoreStore {
    async fn create(&self, product: NewProduct) -> Result<String> {
        let now = super::now_rfc3339();
        let fields = product_fields(&product, &now);

        let url = format!("{}/{}", self.documents_url(), COLLECTION);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .context("Failed to reach document store")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            bail!("Document store insert error: {error_text}");
        }

        let document: Value = response
            .json()
            .await
            .context("Failed to parse document store response")?;
        let name = document["name"]
            .as_str()
            .ok_or_else(|| anyhow!("Document store response missing document name"))?;
        Ok(id_from_name(name).to_owned())
    }

    async fn get(&self, id: &str) -> Result<Option<Product>> {
        Ok(self.fetch_document(id).await?.filter(|p| !p.is_deleted))
    }

    async fn get_any(&self, id: &str) -> Result<Option<Product>> {
        self.fetch_document(id).await
    }

    async fn list_by_owner(&self, owner_subject_id: &str) -> Result<Vec<Product>> {
        self.run_query(json!({
            "from": [{ "collectionId": COLLECTION }],
            "where": { "compositeFilter": {
                "op": "AND",
                "filters": [
                    field_equals("owner_subject_id", string_value(owner_subject_id)),
                    field_equals("is_deleted", json!({ "booleanValue": false })),
                ],
            }},
        }))
        .await
    }

    async fn list_all(&self, status: Option<ProductStatus>) -> Result<Vec<Product>> {
        let mut filters = vec![field_equals("is_deleted", json!({ "booleanValue": false }))];
        if let Some(status) = status {
            filters.push(field_equals("status", string_value(status.as_str())));
        }

        self.run_query(json!({
            "from": [{ "collectionId": COLLECTION }],
            "where": { "compositeFilter": { "op": "AND", "filters": filters } },
        }))
        .await
    }

    async fn update(&self, id: &str, patch: ProductPatch) -> Result<bool> {
        let mut fields = serde_json::Map::new();
        if let Some(title) = patch.title {
            fields.insert("title".into(), string_value(&title));
        }
        if let Some(description) = patch.description {
            fields.insert("description".into(), string_value(&description));
        }
        if let Some(keywords) = patch.keywords {
            fields.insert("keywords".into(), string_array_value(&keywords));
        }
        self.patch_fields(id, Value::Object(fields)).await
    }

    async fn update_status(&self, id: &str, status: ProductStatus) -> Result<bool> {
        self.patch_fields(id, json!({ "status": string_value(status.as_str()) }))
            .await
    }

    async fn soft_delete(&self, id: &str) -> Result<bool> {
        self.patch_fields(id, json!({ "is_deleted": { "booleanValue": true } }))
            .await
    }

    fn name(&self) -> &str {
        "firestore"
    }
}

// ── Field mapping ──────────────────────────────────────────────────

fn string_value(value: &str) -> Value {
    json!({ "stringValue": value })
}

fn string_array_value(values: &[String]) -> Value {
    let values: Vec<Value> = values.iter().map(|v| string_value(v)).collect();
    json!({ "arrayValue": { "values": values } })
}

fn field_equals(field: &str, value: Value) -> Value {
    json!({ "fieldFilter": {
        "field": { "fieldPath": field },
        "op": "EQUAL",
        "value": value,
    }})
}

fn product_fields(product: &NewProduct, now: &str) -> Value {
    json!({
        "title": string_value(&product.title),
        "description": string_value(&product.description),
        "keywords": string_array_value(&product.keywords),
        "image_url": string_value(&product.image_url),
        "owner_subject_id": string_value(&product.owner_subject_id),
        "status": string_value(ProductStatus::Pending.as_str()),
        "created_at": string_value(now),
        "updated_at": string_value(now),
        "is_deleted": { "booleanValue": false },
    })
}

/// Document names look like
/// `projects/<p>/databases/(default)/documents/products/<id>`.
fn id_from_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn get_string(fields: &Value, key: &str) -> String {
    fields[key]["stringValue"].as_str().unwrap_or_default().to_owned()
}

fn document_to_product(document: &Value) -> Result<Product> {
    let name = document["name"]
        .as_str()
        .ok_or_else(|| anyhow!("document missing name"))?;
    let fields = &document["fields"];

    let keywords = fields["keywords"]["arrayValue"]["values"]
        .as_array()
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v["stringValue"].as_str())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    let status = get_string(fields, "status")
        .parse()
        .unwrap_or(ProductStatus::Pending);

    Ok(Product {
        id: id_from_name(name).to_owned(),
        title: get_string(fields, "title"),
        description: get_string(fields, "description"),
        keywords,
        image_url: get_string(fields, "image_url"),
        owner_subject_id: get_string(fields, "owner_subject_id"),
        status,
        created_at: get_string(fields, "created_at"),
        updated_at: get_string(fields, "updated_at"),
        is_deleted: fields["is_deleted"]["booleanValue"].as_bool().unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> Value {
        json!({
            "name": "projects/p/databases/(default)/documents/products/abc123",
            "fields": {
                "title": { "stringValue": "Mug" },
                "description": { "stringValue": "A mug" },
                "keywords": { "arrayValue": { "values": [
                    { "stringValue": "kitchen" },
                    { "stringValue": "ceramic" },
                ]}},
                "image_url": { "stringValue": "http://x/y.jpg" },
                "owner_subject_id": { "stringValue": "u1" },
                "status": { "stringValue": "approved" },
                "created_at": { "stringValue": "2026-01-01T00:00:00+00:00" },
                "updated_at": { "stringValue": "2026-01-02T00:00:00+00:00" },
                "is_deleted": { "booleanValue": false },
            }
        })
    }

    #[test]
    fn document_maps_to_product() {
        let product = document_to_product(&sample_document()).unwrap();

        assert_eq!(product.id, "abc123");
        assert_eq!(product.title, "Mug");
        assert_eq!(product.keywords, vec!["kitchen", "ceramic"]);
        assert_eq!(product.status, ProductStatus::Approved);
        assert_eq!(product.owner_subject_id, "u1");
        assert!(!product.is_deleted);
    }

    #[test]
    fn document_without_name_is_an_error() {
        let document = json!({ "fields": {} });
        assert!(document_to_product(&document).is_err());
    }

    #[test]
    fn missing_optional_fields_fall_back() {
        let document = json!({
            "name": "projects/p/databases/(default)/documents/products/x",
            "fields": {
                "title": { "stringValue": "Bare" },
            }
        });
        let product = document_to_product(&document).unwrap();

        assert!(product.keywords.is_empty());
        assert_eq!(product.status, ProductStatus::Pending);
        assert!(!product.is_deleted);
    }

    #[test]
    fn new_product_encodes_typed_fields() {
        let product = NewProduct {
            title: "Mug".into(),
            description: "A mug".into(),
            keywords: vec!["kitchen".into()],
            image_url: "http://x/y.jpg".into(),
            owner_subject_id: "u1".into(),
        };
        let fields = product_fields(&product, "2026-01-01T00:00:00+00:00");

        assert_eq!(fields["title"]["stringValue"], "Mug");
        assert_eq!(fields["status"]["stringValue"], "pending");
        assert_eq!(fields["is_deleted"]["booleanValue"], false);
        assert_eq!(
            fields["keywords"]["arrayValue"]["values"][0]["stringValue"],
            "kitchen"
        );
        assert_eq!(fields["created_at"], fields["updated_at"]);
    }

    #[test]
    fn id_extraction_takes_last_path_segment() {
        assert_eq!(
            id_from_name("projects/p/databases/(default)/documents/products/abc"),
            "abc"
        );
        assert_eq!(id_from_name("bare-id"), "bare-id");
    }

    #[test]
    fn equality_filter_shape() {
        let filter = field_equals("status", string_value("pending"));
        assert_eq!(filter["fieldFilter"]["field"]["fieldPath"], "status");
        assert_eq!(filter["fieldFilter"]["op"], "EQUAL");
        assert_eq!(filter["fieldFilter"]["value"]["stringValue"], "pending");
    }
}
