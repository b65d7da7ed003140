// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! Listing-draft generation from a product photo.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Structured draft produced from an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
}

/// Interface for image-to-listing generators.
#[async_trait]
pub trait DescriptionGenerator: Send + Sync {
    /// Produce a draft from image data — raw base64 or a
    /// `data:image/...;base64,` URI.
    async fn describe(&self, image_data: &str) -> Result<ListingDraft>;

    fn name(&self) -> &str;
}

// ══════════════════════════════════════════════════════════════════════════════
// OpenAI vision implementation
// ══════════════════════════════════════════════════════════════════════════════

const DESCRIBE_PROMPT: &str = "Analyze this product image and provide:\n\
1. A concise, compelling product title (5-10 words)\n\
2. A detailed product description (2-3 sentences)\n\
3. 3-5 relevant keywords for categorization\n\
\n\
Format your response as:\n\
TITLE: [product title]\n\
DESCRIPTION: [detailed description]\n\
KEYWORDS: [keyword1, keyword2, keyword3]";

pub struct OpenAiVisionGenerator {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiVisionGenerator {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            model: "gpt-4o".to_string(),
        }
    }
}

#[async_trait]
impl DescriptionGenerator for OpenAiVisionGenerator {
    async fn describe(&self, image_data: &str) -> Result<ListingDraft> {
        let base64_data = strip_data_uri(image_data);

        let body = json!({
            "model": self.model,
            "max_tokens": 500,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": DESCRIBE_PROMPT },
                    { "type": "image_url", "image_url": {
                        "url": format!("data:image/jpeg;base64,{base64_data}"),
                    }},
                ],
            }],
        });

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("Failed to send request to vision API")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            bail!("Vision API error: {error_text}");
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse vision API response")?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default();

        Ok(parse_draft(content))
    }

    fn name(&self) -> &str {
        "OpenAI Vision"
    }
}

/// Strip a `data:image/...;base64,` prefix, if present.
pub fn strip_data_uri(image_data: &str) -> &str {
    if image_data.starts_with("data:image") {
        image_data
            .split_once(',')
            .map_or(image_data, |(_, rest)| rest)
    } else {
        image_data
    }
}

/// Parse `TITLE:`/`DESCRIPTION:`/`KEYWORDS:` lines out of the model
/// output. Missing title or description falls back to a generic title
/// plus the truncated raw content; empty keywords fall back to
/// `["product"]`.
fn parse_draft(content: &str) -> ListingDraft {
    let mut title = String::new();
    let mut description = String::new();
    let mut keywords: Vec<String> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("TITLE:") {
            title = rest.trim().to_owned();
        } else if let Some(rest) = line.strip_prefix("DESCRIPTION:") {
            description = rest.trim().to_owned();
        } else if let Some(rest) = line.strip_prefix("KEYWORDS:") {
            keywords = rest
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_owned)
                .collect();
        }
    }

    if title.is_empty() || description.is_empty() {
        title = "Product".to_owned();
        description = content.chars().take(200).collect();
    }
    if keywords.is_empty() {
        keywords = vec!["product".to_owned()];
    }

    ListingDraft {
        title,
        description,
        keywords,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Mock generator (for testing)
// ══════════════════════════════════════════════════════════════════════════════

/// Returns a pre-configured draft. Used for unit and integration tests
/// so we never call a real API.
pub struct MockGenerator {
    pub draft: ListingDraft,
}

impl MockGenerator {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            draft: ListingDraft {
                title: title.into(),
                description: description.into(),
                keywords: vec!["product".into()],
            },
        }
    }
}

#[async_trait]
impl DescriptionGenerator for MockGenerator {
    async fn describe(&self, _image_data: &str) -> Result<ListingDraft> {
        Ok(self.draft.clone())
    }

    fn name(&self) -> &str {
        "Mock Generator"
    }
}
