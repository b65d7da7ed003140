pub mod admin;
pub mod auth;
pub mod products;
pub mod types;

use crate::gateway::AppState;
use axum::Router;

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(products::router())
        .merge(admin::router())
}
