use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod identity;
pub mod jwt;
pub mod password;
pub mod policy;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
