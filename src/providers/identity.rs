// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! Identity-provider client.
//!
//! The provider is an opaque oracle: it verifies bearer credentials and
//! owns the per-subject role-claim sets. ID tokens are validated
//! locally against the provider's published JWKS (RS256, pinned
//! audience and issuer); account management goes through the provider's
//! REST surface.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const ACCOUNTS_URL: &str = "https://identitytoolkit.googleapis.com/v1";
/// Single bounded attempt per call; no retries anywhere in the gateway.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Verified subject returned by the oracle.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub subject_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Freshly registered account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub subject_id: String,
    pub email: String,
}

/// Interface to the external identity provider.
#[async_trait]
pub trait IdentityOracle: Send + Sync {
    /// Verify a bearer ID token. Any failure means the credential is
    /// invalid or expired — the caller maps it to `Unauthenticated`.
    async fn verify_token(&self, id_token: &str) -> Result<VerifiedToken>;

    /// Fetch the subject's custom role claims. `admin` is the only
    /// claim this system reads.
    async fn role_claims(&self, subject_id: &str) -> Result<Map<String, Value>>;

    /// Grant or revoke the `admin` role claim.
    async fn set_admin_claim(&self, subject_id: &str, is_admin: bool) -> Result<()>;

    /// Create an account with email/password credentials.
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<NewUser>;

    fn name(&self) -> &str;
}

// ══════════════════════════════════════════════════════════════════════════════
// Google Identity Platform implementation
// ══════════════════════════════════════════════════════════════════════════════

/// ID token claims we care about.
#[derive(Debug, Deserialize)]
struct TokenClaims {
    sub: String,
    #[allow(dead_code)]
    aud: String,
    #[allow(dead_code)]
    iss: String,
    email: Option<String>,
    name: Option<String>,
}

/// JWKS cache so we don't fetch the signing keys on every request.
struct JwksCache {
    keys: HashMap<String, DecodingKey>,
    last_update: SystemTime,
}

pub struct GoogleIdentityOracle {
    client: Client,
    project_id: String,
    api_key: String,
    jwks_cache: Arc<Mutex<JwksCache>>,
}

impl GoogleIdentityOracle {
    pub fn new(project_id: &str, api_key: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            project_id: project_id.to_owned(),
            api_key: api_key.to_owned(),
            jwks_cache: Arc::new(Mutex::new(JwksCache {
                keys: HashMap::new(),
                last_update: UNIX_EPOCH,
            })),
        }
    }

    /// Refresh the JWKS if the cache is stale (> 1 hour).
    async fn refresh_jwks(&self) -> Result<()> {
        {
            let cache = self
                .jwks_cache
                .lock()
                .map_err(|_| anyhow!("Lock poisoned"))?;
            let age = SystemTime::now()
                .duration_since(cache.last_update)
                .unwrap_or_default();
            if age < Duration::from_secs(3600) && !cache.keys.is_empty() {
                return Ok(());
            }
        }

        let jwks: Value = self
            .client
            .get(JWKS_URL)
            .send()
            .await
            .context("Failed to fetch identity-provider JWKS")?
            .json()
            .await
            .context("Failed to parse identity-provider JWKS")?;

        let mut cache = self
            .jwks_cache
            .lock()
            .map_err(|_| anyhow!("Lock poisoned"))?;
        if let Some(keys) = jwks["keys"].as_array() {
            cache.keys.clear();
            for key in keys {
                if let (Some(kid), Some(n), Some(e)) =
                    (key["kid"].as_str(), key["n"].as_str(), key["e"].as_str())
                {
                    if let Ok(decoding_key) = DecodingKey::from_rsa_components(n, e) {
                        cache.keys.insert(kid.to_owned(), decoding_key);
                    }
                }
            }
            cache.last_update = SystemTime::now();
        }

        Ok(())
    }

    fn accounts_endpoint(&self, operation: &str) -> String {
        format!("{ACCOUNTS_URL}/accounts:{operation}")
    }

    async fn accounts_call(&self, operation: &str, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(self.accounts_endpoint(operation))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach identity provider ({operation})"))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            bail!("Identity provider error: {}", provider_error_message(&error_text));
        }

        response
            .json()
            .await
            .context("Failed to parse identity provider response")
    }
}

/// Pull the human-readable message out of a provider error body, or
/// fall back to the raw text.
fn provider_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_owned))
        .unwrap_or_else(|| body.to_owned())
}

#[async_trait]
impl IdentityOracle for GoogleIdentityOracle {
    async fn verify_token(&self, id_token: &str) -> Result<VerifiedToken> {
        let header = decode_header(id_token).context("Failed to decode token header")?;
        let kid = header
            .kid
            .ok_or_else(|| anyhow!("Token header missing 'kid'"))?;

        self.refresh_jwks().await.context("Failed to refresh JWKS")?;

        let cache = self
            .jwks_cache
            .lock()
            .map_err(|_| anyhow!("Lock poisoned"))?;
        let key = cache
            .keys
            .get(&kid)
            .ok_or_else(|| anyhow!("Unknown key ID: {kid}"))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!(
            "https://securetoken.google.com/{}",
            self.project_id
        )]);

        let token_data =
            decode::<TokenClaims>(id_token, key, &validation).context("Token validation failed")?;

        Ok(VerifiedToken {
            subject_id: token_data.claims.sub,
            email: token_data.claims.email,
            display_name: token_data.claims.name,
        })
    }

    async fn role_claims(&self, subject_id: &str) -> Result<Map<String, Value>> {
        let response = self
            .accounts_call("lookup", serde_json::json!({ "localId": [subject_id] }))
            .await?;

        // customAttributes is a JSON-encoded string on the user record
        let attributes = response["users"][0]["customAttributes"].as_str();
        Ok(parse_claim_attributes(attributes))
    }

    async fn set_admin_claim(&self, subject_id: &str, is_admin: bool) -> Result<()> {
        let attributes = serde_json::json!({ "admin": is_admin }).to_string();
        self.accounts_call(
            "update",
            serde_json::json!({
                "localId": subject_id,
                "customAttributes": attributes,
            }),
        )
        .await?;
        Ok(())
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<NewUser> {
        let mut body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": false,
        });
        if let Some(name) = display_name {
            body["displayName"] = Value::String(name.to_owned());
        }

        let response = self.accounts_call("signUp", body).await?;
        let subject_id = response["localId"]
            .as_str()
            .ok_or_else(|| anyhow!("Identity provider response missing localId"))?
            .to_owned();
        let email = response["email"].as_str().unwrap_or(email).to_owned();

        Ok(NewUser { subject_id, email })
    }

    fn name(&self) -> &str {
        "google-identity"
    }
}

/// Decode a claim-set string into a map; malformed or absent input
/// yields an empty claim set.
fn parse_claim_attributes(attributes: Option<&str>) -> Map<String, Value> {
    attributes
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .and_then(|v| v.as_object().cloned())
        .unwrap_or_default()
}

// ══════════════════════════════════════════════════════════════════════════════
// Mock oracle (for testing)
// ══════════════════════════════════════════════════════════════════════════════

/// In-process oracle with a token table and a mutable claim store, so
/// tests can flip claims between two authentications and observe the
/// gate re-reading them. Never calls a real API.
#[derive(Default)]
pub struct MockIdentityOracle {
    tokens: Mutex<HashMap<String, VerifiedToken>>,
    claims: Mutex<HashMap<String, Map<String, Value>>>,
    reject_registrations: bool,
}

impl MockIdentityOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oracle that refuses every `create_user` call.
    pub fn rejecting_registrations() -> Self {
        Self {
            reject_registrations: true,
            ..Self::default()
        }
    }

    /// Map a bearer token to a verified subject.
    pub fn register_token(&self, token: &str, subject_id: &str, email: &str, display_name: &str) {
        self.tokens
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(
                token.to_owned(),
                VerifiedToken {
                    subject_id: subject_id.to_owned(),
                    email: Some(email.to_owned()),
                    display_name: Some(display_name.to_owned()),
                },
            );
    }

    pub fn admin_claim(&self, subject_id: &str) -> Option<bool> {
        self.claims
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(subject_id)
            .and_then(|claims| claims.get("admin"))
            .and_then(Value::as_bool)
    }
}

#[async_trait]
impl IdentityOracle for MockIdentityOracle {
    async fn verify_token(&self, id_token: &str) -> Result<VerifiedToken> {
        self.tokens
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(id_token)
            .cloned()
            .ok_or_else(|| anyhow!("invalid token"))
    }

    async fn role_claims(&self, subject_id: &str) -> Result<Map<String, Value>> {
        Ok(self
            .claims
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(subject_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_admin_claim(&self, subject_id: &str, is_admin: bool) -> Result<()> {
        self.claims
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entry(subject_id.to_owned())
            .or_default()
            .insert("admin".into(), Value::Bool(is_admin));
        Ok(())
    }

    async fn create_user(
        &self,
        email: &str,
        _password: &str,
        _display_name: Option<&str>,
    ) -> Result<NewUser> {
        if self.reject_registrations {
            bail!("EMAIL_EXISTS");
        }
        Ok(NewUser {
            subject_id: format!("uid-{email}"),
            email: email.to_owned(),
        })
    }

    fn name(&self) -> &str {
        "mock-identity"
    }
}
