// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! The authorization gate.
//!
//! Every mutating endpoint runs through here before it touches the
//! store. Trust is resolved fresh per request from the bearer
//! credential and the live role-claim set; nothing is cached across
//! requests. Checks compose in a fixed order — pre-shared key, then
//! bearer authentication, then ownership/privilege — and short-circuit
//! on the first failure, so no side effect can precede a passed gate.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::providers::identity::IdentityOracle;
use crate::store::Product;

/// Per-request caller privilege ranking. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrustLevel {
    Anonymous,
    ApiKeyHolder,
    AuthenticatedUser,
    ResourceOwner,
    Admin,
    MasterKeyHolder,
}

impl TrustLevel {
    pub fn level(self) -> u8 {
        match self {
            TrustLevel::Anonymous => 0,
            TrustLevel::ApiKeyHolder => 1,
            TrustLevel::AuthenticatedUser => 2,
            TrustLevel::ResourceOwner => 3,
            TrustLevel::Admin => 4,
            TrustLevel::MasterKeyHolder => 5,
        }
    }
}

impl std::fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TrustLevel::Anonymous => "Anonymous",
            TrustLevel::ApiKeyHolder => "ApiKeyHolder",
            TrustLevel::AuthenticatedUser => "AuthenticatedUser",
            TrustLevel::ResourceOwner => "ResourceOwner",
            TrustLevel::Admin => "Admin",
            TrustLevel::MasterKeyHolder => "MasterKeyHolder",
        };
        f.write_str(name)
    }
}

/// Verified caller identity. Constructed at request time from the
/// bearer credential and the live claim set; discarded after the
/// response. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub subject_id: String,
    pub email: String,
    pub display_name: String,
    pub is_admin: bool,
}

impl Identity {
    /// Trust this identity carries toward a specific resource.
    pub fn trust_for(&self, product: &Product) -> TrustLevel {
        if self.is_admin {
            TrustLevel::Admin
        } else if product.owner_subject_id == self.subject_id {
            TrustLevel::ResourceOwner
        } else {
            TrustLevel::AuthenticatedUser
        }
    }
}

/// Constant-time string comparison for shared secrets. Length mismatch
/// folds into the accumulator so it costs the same as a byte mismatch.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();

    let mut diff = a.len() ^ b.len();
    for i in 0..a.len().min(b.len()) {
        diff |= usize::from(a[i] ^ b[i]);
    }
    diff == 0
}

/// Resolve the caller's identity from an `Authorization` header value.
///
/// The credential must be `Bearer <token>`-shaped; the token is handed
/// to the identity oracle for verification, then the subject's role
/// claims are fetched fresh and `admin` folded into the identity. A
/// claim-set fetch failure degrades to a non-admin identity — the
/// verified token stays valid.
pub async fn authenticate(
    oracle: &dyn IdentityOracle,
    authorization: Option<&str>,
) -> Result<Identity, ApiError> {
    let header = authorization
        .ok_or_else(|| ApiError::Unauthenticated("Authorization header missing".into()))?;
    let token = header
        .strip_prefix("Bearer ")
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthenticated("Invalid authorization format".into()))?;

    let verified = oracle.verify_token(token).await.map_err(|err| {
        tracing::warn!("token verification failed: {err}");
        ApiError::Unauthenticated("Invalid or expired token".into())
    })?;

    let claims = oracle
        .role_claims(&verified.subject_id)
        .await
        .unwrap_or_else(|err| {
            tracing::warn!("role claim lookup failed for {}: {err}", verified.subject_id);
            serde_json::Map::new()
        });
    let is_admin = claims.get("admin").and_then(|v| v.as_bool()).unwrap_or(false);

    Ok(Identity {
        subject_id: verified.subject_id,
        email: verified.email.unwrap_or_default(),
        display_name: verified.display_name.unwrap_or_default(),
        is_admin,
    })
}

/// Exact-match check of the pre-shared key against the server secret.
/// An unconfigured secret is an operational fault, not a caller fault.
pub fn authorize_api_key(
    provided: Option<&str>,
    configured: Option<&str>,
) -> Result<(), ApiError> {
    let secret = configured
        .ok_or_else(|| ApiError::Misconfigured("API secret key not configured".into()))?;

    match provided {
        Some(key) if constant_time_eq(key, secret) => Ok(()),
        _ => Err(ApiError::Unauthenticated("Invalid or missing API key".into())),
    }
}

pub fn require_admin(identity: Identity) -> Result<Identity, ApiError> {
    if identity.is_admin {
        Ok(identity)
    } else {
        Err(ApiError::Forbidden("Admin access required".into()))
    }
}

/// Read rule: the owner or any admin may see the resource.
pub fn require_owner_or_admin(identity: &Identity, product: &Product) -> Result<(), ApiError> {
    if product.owner_subject_id == identity.subject_id || identity.is_admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Access denied".into()))
    }
}

/// Write rule: owner only. An admin may read anyone's product but may
/// not mutate one they do not own.
pub fn require_owner(identity: &Identity, product: &Product) -> Result<(), ApiError> {
    if product.owner_subject_id == identity.subject_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Access denied".into()))
    }
}

/// Gate for the two claim-mutation operations. The master secret is a
/// capability distinct from the API key; neither check ever falls back
/// to the other secret.
pub fn authorize_master_operation(
    provided: &str,
    configured: Option<&str>,
) -> Result<(), ApiError> {
    let secret = configured
        .ok_or_else(|| ApiError::Misconfigured("Master admin key not configured".into()))?;

    if constant_time_eq(provided, secret) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Invalid master key".into()))
    }
}
