mod handlers;
pub mod jwt;
mod password;
mod repo;

use axum::Router;

use crate::state::AppState;

pub use jwt::AuthUser;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
