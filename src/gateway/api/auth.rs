use axum::{
    extract::{Json, State},
    routing::{get, post},
    Router,
};

use super::types::{RegisterRequest, UserView};
use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::gateway::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/verify-token", post(verify_token))
}

/// POST /auth/register — create an account via the identity provider.
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let email = body.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadInput("Invalid email address".into()));
    }
    if body.password.chars().count() < 6 {
        return Err(ApiError::BadInput(
            "Password must be at least 6 characters".into(),
        ));
    }

    // provider rejection (duplicate email, weak password) is caller error
    let user = state
        .oracle
        .create_user(email, &body.password, body.display_name.as_deref())
        .await
        .map_err(|err| ApiError::BadInput(err.to_string()))?;

    tracing::info!(uid = %user.subject_id, "account registered");
    Ok(Json(serde_json::json!({
        "message": "User created successfully",
        "uid": user.subject_id,
        "email": user.email,
    })))
}

/// POST /auth/login — documentation stub. Sign-in happens against the
/// identity provider's client SDK; this backend only verifies tokens,
/// so any posted credentials are ignored.
async fn login() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Please use the identity provider SDK for login",
        "info": "This endpoint is for documentation purposes. Sign in on the frontend and send the ID token as a bearer credential.",
    }))
}

/// GET /auth/me — identity behind the bearer credential.
async fn me(AuthenticatedUser(identity): AuthenticatedUser) -> Json<UserView> {
    Json(UserView {
        uid: identity.subject_id,
        email: identity.email,
        display_name: identity.display_name,
        is_admin: identity.is_admin,
    })
}

/// POST /auth/verify-token — explicit token check for clients.
async fn verify_token(AuthenticatedUser(identity): AuthenticatedUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "valid": true,
        "uid": identity.subject_id,
        "email": identity.email,
        "is_admin": identity.is_admin,
    }))
}
