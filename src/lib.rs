// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! Listly Core — backend for the Listly product-listing platform.
//!
//! Thin HTTP gateway in front of three managed services: an identity
//! provider (bearer-token verification and role claims), a document
//! store (product records), and an AI vision API (listing drafts from
//! product photos). The code that lives here is request validation,
//! the authorization gate, and field mapping between API payloads and
//! store documents.

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod providers;
pub mod store;
