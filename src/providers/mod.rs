// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! External managed services: the identity oracle and the listing
//! description generator. The document store lives in `crate::store`.

pub mod describe;
pub mod identity;

pub use describe::{DescriptionGenerator, ListingDraft, MockGenerator, OpenAiVisionGenerator};
pub use identity::{GoogleIdentityOracle, IdentityOracle, MockIdentityOracle};

use crate::config::Config;
use std::sync::Arc;

pub fn create_identity_oracle(config: &Config) -> Arc<dyn IdentityOracle> {
    Arc::new(GoogleIdentityOracle::new(
        &config.identity_project,
        &config.identity_api_key,
    ))
}

/// `None` when no AI key is configured; the generation endpoint then
/// answers with the misconfiguration error instead of a silent bypass.
pub fn create_description_generator(config: &Config) -> Option<Arc<dyn DescriptionGenerator>> {
    config
        .ai_api_key
        .as_ref()
        .map(|key| Arc::new(OpenAiVisionGenerator::new(key.clone())) as Arc<dyn DescriptionGenerator>)
}
