// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! Environment-derived configuration. Loaded once at startup and held
//! immutable (`Arc<Config>`) for the process lifetime.

use anyhow::{bail, Context, Result};

/// Process-wide configuration.
///
/// The two gate secrets are `Option` on purpose: an unset secret is an
/// operational fault that every gated endpoint must answer with a
/// 500-class "misconfigured" response — never a silent bypass and never
/// a startup crash that would take the public endpoints down with it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key gating the product endpoints (`X-Api-Key`).
    pub api_secret: Option<String>,
    /// Higher-privilege key for admin-claim mutation. Distinct
    /// capability from `api_secret`; the two are never interchangeable.
    pub master_secret: Option<String>,
    /// Identity-provider project id (JWT audience / issuer suffix).
    pub identity_project: String,
    /// Identity-provider REST API key.
    pub identity_api_key: String,
    /// Bucket name surfaced to clients for image uploads.
    pub storage_bucket: Option<String>,
    /// CORS allow-origin for the browser frontend.
    pub allow_origin: String,
    /// AI-provider API key for listing-draft generation.
    pub ai_api_key: Option<String>,
}

pub const DEFAULT_ALLOW_ORIGIN: &str = "http://localhost:5000";

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary lookup function.
    /// Whitespace-only values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        // identity credentials come either as one JSON blob (inline or a
        // file path) or as the two individual variables
        let (mut identity_project, mut identity_api_key) = (None, None);
        if let Some(credentials) = get("LISTLY_IDENTITY_CREDENTIALS") {
            let (project, key) = parse_identity_credentials(&credentials)?;
            identity_project = Some(project);
            identity_api_key = Some(key);
        }
        let Some(identity_project) = identity_project.or_else(|| get("LISTLY_IDENTITY_PROJECT"))
        else {
            bail!("LISTLY_IDENTITY_PROJECT (or LISTLY_IDENTITY_CREDENTIALS) is required");
        };
        let Some(identity_api_key) = identity_api_key.or_else(|| get("LISTLY_IDENTITY_API_KEY"))
        else {
            bail!("LISTLY_IDENTITY_API_KEY (or LISTLY_IDENTITY_CREDENTIALS) is required");
        };

        Ok(Self {
            api_secret: get("LISTLY_API_SECRET"),
            master_secret: get("LISTLY_MASTER_SECRET"),
            identity_project,
            identity_api_key,
            storage_bucket: get("LISTLY_STORAGE_BUCKET"),
            allow_origin: get("LISTLY_ALLOW_ORIGIN")
                .unwrap_or_else(|| DEFAULT_ALLOW_ORIGIN.to_owned()),
            ai_api_key: get("LISTLY_AI_API_KEY"),
        })
    }
}

/// Accepts either an inline JSON object or a path to one. The blob must
/// carry `project_id` and `api_key`.
fn parse_identity_credentials(value: &str) -> Result<(String, String)> {
    let raw = if value.trim_start().starts_with('{') {
        value.to_owned()
    } else {
        std::fs::read_to_string(value)
            .with_context(|| format!("failed to read identity credentials file {value}"))?
    };

    let parsed: serde_json::Value =
        serde_json::from_str(&raw).context("identity credentials are not valid JSON")?;
    let project = parsed["project_id"]
        .as_str()
        .context("identity credentials missing project_id")?;
    let api_key = parsed["api_key"]
        .as_str()
        .context("identity credentials missing api_key")?;
    Ok((project.to_owned(), api_key.to_owned()))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_secret: None,
            master_secret: None,
            identity_project: "listly-dev".into(),
            identity_api_key: "dev-key".into(),
            storage_bucket: None,
            allow_origin: DEFAULT_ALLOW_ORIGIN.into(),
            ai_api_key: None,
        }
    }
}
