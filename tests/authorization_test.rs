//! End-to-end tests for the authorization gate.
//! Drives the real router with the mock oracle, the in-memory store,
//! and the mock generator — no network, no real providers.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use listly_core::config::Config;
use listly_core::gateway::{build_router, AppState};
use listly_core::providers::{IdentityOracle, MockGenerator, MockIdentityOracle};
use listly_core::store::{MemoryStore, ProductStatus, ProductStore};
use std::sync::Arc;
use tower::ServiceExt;

const API_KEY: &str = "test-api-secret";
const MASTER_KEY: &str = "test-master-secret";

struct Harness {
    state: AppState,
    oracle: Arc<MockIdentityOracle>,
    store: Arc<MemoryStore>,
}

fn gated_config() -> Config {
    Config {
        api_secret: Some(API_KEY.into()),
        master_secret: Some(MASTER_KEY.into()),
        ..Config::default()
    }
}

/// Harness with both secrets configured and three known users:
/// `tok-u1`/`tok-u2` (plain) and `tok-admin` (admin claim granted in
/// the tests that need it).
fn harness() -> Harness {
    harness_with(gated_config())
}

fn harness_with(config: Config) -> Harness {
    let oracle = Arc::new(MockIdentityOracle::new());
    oracle.register_token("tok-u1", "u1", "u1@example.com", "User One");
    oracle.register_token("tok-u2", "u2", "u2@example.com", "User Two");
    oracle.register_token("tok-admin", "adm", "admin@example.com", "Admin");

    let store = Arc::new(MemoryStore::new());

    let state = AppState {
        config: Arc::new(config),
        oracle: Arc::clone(&oracle) as Arc<dyn IdentityOracle>,
        store: Arc::clone(&store) as Arc<dyn ProductStore>,
        generator: Some(Arc::new(MockGenerator::new(
            "Ceramic Mug",
            "A handmade ceramic mug.",
        ))),
    };

    Harness {
        state,
        oracle,
        store,
    }
}

impl Harness {
    async fn grant_admin(&self, subject_id: &str) {
        self.oracle.set_admin_claim(subject_id, true).await.unwrap();
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        api_key: Option<&str>,
        bearer: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = api_key {
            builder = builder.header("X-Api-Key", key);
        }
        if let Some(token) = bearer {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = build_router(self.state.clone())
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let parsed = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, parsed)
    }

    async fn create_product_as(&self, token: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/products/",
                Some(API_KEY),
                Some(token),
                Some(serde_json::json!({
                    "title": "Mug",
                    "description": "A mug",
                    "image_url": "http://x/y.jpg",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_owned()
    }
}

// ── Property: API key precedes bearer on gated endpoints ──────────

#[tokio::test]
async fn missing_api_key_is_unauthenticated_regardless_of_bearer() {
    let h = harness();

    for bearer in [Some("tok-u1"), Some("garbage"), None] {
        let (status, body) = h
            .send("GET", "/products/my-products", None, bearer, None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "bearer {bearer:?}");
        assert_eq!(body["error"], "Invalid or missing API key");
    }
}

#[tokio::test]
async fn wrong_api_key_is_unauthenticated() {
    let h = harness();
    let (status, _) = h
        .send("GET", "/products/my-products", Some("nope"), Some("tok-u1"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unconfigured_api_secret_is_misconfigured_not_forbidden() {
    let h = harness_with(Config {
        master_secret: Some(MASTER_KEY.into()),
        ..Config::default()
    });

    let (status, body) = h
        .send(
            "GET",
            "/products/my-products",
            Some(API_KEY),
            Some("tok-u1"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "API secret key not configured");
}

// ── Property: admin claim mirrors the live claim set ──────────────

#[tokio::test]
async fn is_admin_rereads_claims_between_requests() {
    let h = harness();

    let (status, body) = h.send("GET", "/auth/me", None, Some("tok-u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_admin"], false);

    h.grant_admin("u1").await;
    let (_, body) = h.send("GET", "/auth/me", None, Some("tok-u1"), None).await;
    assert_eq!(body["is_admin"], true);

    h.oracle.set_admin_claim("u1", false).await.unwrap();
    let (_, body) = h.send("GET", "/auth/me", None, Some("tok-u1"), None).await;
    assert_eq!(body["is_admin"], false);
}

#[tokio::test]
async fn invalid_bearer_is_unauthenticated() {
    let h = harness();

    let (status, _) = h.send("GET", "/auth/me", None, Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = h.send("GET", "/auth/me", None, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ── Property: owner-write / admin-read asymmetry ──────────────────

#[tokio::test]
async fn admin_may_read_but_not_mutate_others_listing() {
    let h = harness();
    h.grant_admin("adm").await;
    let id = h.create_product_as("tok-u1").await;

    let (status, body) = h
        .send(
            "GET",
            &format!("/products/{id}"),
            Some(API_KEY),
            Some("tok-admin"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner_subject_id"], "u1");

    let (status, _) = h
        .send(
            "PATCH",
            &format!("/products/{id}"),
            Some(API_KEY),
            Some("tok-admin"),
            Some(serde_json::json!({ "title": "Hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = h
        .send(
            "DELETE",
            &format!("/products/{id}"),
            Some(API_KEY),
            Some("tok-admin"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn stranger_cannot_read_or_mutate() {
    let h = harness();
    let id = h.create_product_as("tok-u1").await;

    for method in ["GET", "PATCH", "DELETE"] {
        let body = (method == "PATCH").then(|| serde_json::json!({ "title": "X" }));
        let (status, _) = h
            .send(
                method,
                &format!("/products/{id}"),
                Some(API_KEY),
                Some("tok-u2"),
                body,
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} should be denied");
    }
}

// ── Property: soft-delete visibility split ────────────────────────

#[tokio::test]
async fn second_delete_is_not_found() {
    let h = harness();
    let id = h.create_product_as("tok-u1").await;

    let (status, _) = h
        .send(
            "DELETE",
            &format!("/products/{id}"),
            Some(API_KEY),
            Some("tok-u1"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = h
        .send(
            "DELETE",
            &format!("/products/{id}"),
            Some(API_KEY),
            Some("tok-u1"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_status_update_reaches_deleted_listing() {
    let h = harness();
    h.grant_admin("adm").await;
    let id = h.create_product_as("tok-u1").await;

    h.send(
        "DELETE",
        &format!("/products/{id}"),
        Some(API_KEY),
        Some("tok-u1"),
        None,
    )
    .await;

    // the moderation pre-check uses the unfiltered lookup
    let (status, body) = h
        .send(
            "PATCH",
            &format!("/admin/products/{id}/status"),
            None,
            Some("tok-admin"),
            Some(serde_json::json!({ "status": "rejected" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_status"], "rejected");

    let raw = h.store.get_any(&id).await.unwrap().unwrap();
    assert!(raw.is_deleted);
    assert_eq!(raw.status, ProductStatus::Rejected);
}

#[tokio::test]
async fn deleted_listings_vanish_from_scans() {
    let h = harness();
    let keep = h.create_product_as("tok-u1").await;
    let gone = h.create_product_as("tok-u1").await;

    h.send(
        "DELETE",
        &format!("/products/{gone}"),
        Some(API_KEY),
        Some("tok-u1"),
        None,
    )
    .await;

    let (status, body) = h
        .send(
            "GET",
            "/products/my-products",
            Some(API_KEY),
            Some("tok-u1"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let listings = body.as_array().unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0]["id"], keep.as_str());
}

// ── Property: master-key endpoints ────────────────────────────────

#[tokio::test]
async fn master_key_mismatch_is_forbidden() {
    let h = harness();

    let (status, _) = h
        .send(
            "POST",
            "/admin/set-admin-role",
            None,
            None,
            Some(serde_json::json!({ "user_id": "u2", "master_key": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(h.oracle.admin_claim("u2"), None);
}

#[tokio::test]
async fn unset_master_secret_is_misconfigured_even_with_plausible_key() {
    let h = harness_with(Config {
        api_secret: Some(API_KEY.into()),
        ..Config::default()
    });

    let (status, body) = h
        .send(
            "POST",
            "/admin/set-admin-role",
            None,
            None,
            Some(serde_json::json!({ "user_id": "u2", "master_key": MASTER_KEY })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Master admin key not configured");
}

#[tokio::test]
async fn master_key_grants_and_revokes_admin() {
    let h = harness();

    let (status, _) = h
        .send(
            "POST",
            "/admin/set-admin-role",
            None,
            None,
            Some(serde_json::json!({ "user_id": "u2", "master_key": MASTER_KEY })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.oracle.admin_claim("u2"), Some(true));

    let (status, _) = h
        .send(
            "POST",
            "/admin/revoke-admin-role",
            None,
            None,
            Some(serde_json::json!({ "user_id": "u2", "master_key": MASTER_KEY })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.oracle.admin_claim("u2"), Some(false));
}

#[tokio::test]
async fn api_key_does_not_open_the_master_gate() {
    let h = harness();

    let (status, _) = h
        .send(
            "POST",
            "/admin/set-admin-role",
            None,
            None,
            Some(serde_json::json!({ "user_id": "u2", "master_key": API_KEY })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ── Property: lifecycle example ───────────────────────────────────

#[tokio::test]
async fn approve_then_owner_edit_keeps_status() {
    let h = harness();
    h.grant_admin("adm").await;

    let id = h.create_product_as("tok-u1").await;
    let stored = h.store.get_any(&id).await.unwrap().unwrap();
    assert_eq!(stored.status, ProductStatus::Pending);
    assert_eq!(stored.owner_subject_id, "u1");

    let (status, _) = h
        .send(
            "PATCH",
            &format!("/admin/products/{id}/status"),
            None,
            Some("tok-admin"),
            Some(serde_json::json!({ "status": "approved" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = h
        .send(
            "PATCH",
            &format!("/products/{id}"),
            Some(API_KEY),
            Some("tok-u1"),
            Some(serde_json::json!({ "title": "Big Mug" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let stored = h.store.get_any(&id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Big Mug");
    assert_eq!(stored.status, ProductStatus::Approved, "edit must not reset status");
}

#[tokio::test]
async fn empty_patch_is_bad_input() {
    let h = harness();
    let id = h.create_product_as("tok-u1").await;

    let (status, body) = h
        .send(
            "PATCH",
            &format!("/products/{id}"),
            Some(API_KEY),
            Some("tok-u1"),
            Some(serde_json::json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No update data provided");
}

// ── Admin listing endpoints ───────────────────────────────────────

#[tokio::test]
async fn admin_listing_requires_the_claim() {
    let h = harness();

    let (status, _) = h
        .send("GET", "/admin/products", None, Some("tok-u1"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    h.grant_admin("adm").await;
    let (status, body) = h
        .send("GET", "/admin/products", None, Some("tok-admin"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn admin_listing_filters_by_status() {
    let h = harness();
    h.grant_admin("adm").await;

    let a = h.create_product_as("tok-u1").await;
    let _b = h.create_product_as("tok-u2").await;
    h.send(
        "PATCH",
        &format!("/admin/products/{a}/status"),
        None,
        Some("tok-admin"),
        Some(serde_json::json!({ "status": "approved" })),
    )
    .await;

    let (status, body) = h
        .send(
            "GET",
            "/admin/products?status=approved",
            None,
            Some("tok-admin"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let listings = body.as_array().unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0]["id"], a.as_str());
}

// ── Registration ──────────────────────────────────────────────────

#[tokio::test]
async fn registration_validates_before_the_oracle() {
    let h = harness();

    let (status, _) = h
        .send(
            "POST",
            "/auth/register",
            None,
            None,
            Some(serde_json::json!({ "email": "not-an-email", "password": "hunter22" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = h
        .send(
            "POST",
            "/auth/register",
            None,
            None,
            Some(serde_json::json!({ "email": "new@example.com", "password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password must be at least 6 characters");

    let (status, body) = h
        .send(
            "POST",
            "/auth/register",
            None,
            None,
            Some(serde_json::json!({ "email": "new@example.com", "password": "hunter22" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uid"], "uid-new@example.com");
}

#[tokio::test]
async fn oracle_rejected_registration_is_bad_input() {
    let oracle = Arc::new(MockIdentityOracle::rejecting_registrations());
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        config: Arc::new(gated_config()),
        oracle: Arc::clone(&oracle) as Arc<dyn IdentityOracle>,
        store: Arc::clone(&store) as Arc<dyn ProductStore>,
        generator: None,
    };
    let h = Harness {
        state,
        oracle,
        store,
    };

    let (status, body) = h
        .send(
            "POST",
            "/auth/register",
            None,
            None,
            Some(serde_json::json!({ "email": "dup@example.com", "password": "hunter22" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("EMAIL_EXISTS"));
}

// ── AI description endpoint ───────────────────────────────────────

#[tokio::test]
async fn description_endpoint_is_key_gated() {
    let h = harness();

    let (status, _) = h
        .send(
            "POST",
            "/products/generate-ai-description",
            None,
            None,
            Some(serde_json::json!({ "image_data": "AAAA" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = h
        .send(
            "POST",
            "/products/generate-ai-description",
            Some(API_KEY),
            None,
            Some(serde_json::json!({ "image_data": "AAAA" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Ceramic Mug");
    assert_eq!(body["keywords"], serde_json::json!(["product"]));
}

#[tokio::test]
async fn description_rejects_non_base64_payloads() {
    let h = harness();

    let (status, body) = h
        .send(
            "POST",
            "/products/generate-ai-description",
            Some(API_KEY),
            None,
            Some(serde_json::json!({ "image_data": "not base64!!" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "image_data must be base64-encoded");

    // data-URI payloads are unwrapped before validation
    let (status, _) = h
        .send(
            "POST",
            "/products/generate-ai-description",
            Some(API_KEY),
            None,
            Some(serde_json::json!({ "image_data": "data:image/png;base64,AAAA" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn description_without_ai_key_is_misconfigured() {
    let mut h = harness();
    h.state.generator = None;

    let (status, body) = h
        .send(
            "POST",
            "/products/generate-ai-description",
            Some(API_KEY),
            None,
            Some(serde_json::json!({ "image_data": "AAAA" })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "AI provider API key not configured");
}
