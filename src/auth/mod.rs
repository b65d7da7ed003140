// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

pub mod extract;
pub mod gate;

pub use extract::{AdminUser, ApiKey, AuthenticatedUser, API_KEY_HEADER};
pub use gate::{
    authenticate, authorize_api_key, authorize_master_operation, constant_time_eq,
    require_admin, require_owner, require_owner_or_admin, Identity, TrustLevel,
};
