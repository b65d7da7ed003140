// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

pub mod schema;

pub use schema::{Config, DEFAULT_ALLOW_ORIGIN};
