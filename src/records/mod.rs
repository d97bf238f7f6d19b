pub mod dto;
pub mod handlers;
pub mod memory;
pub mod pagination;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::rpc_routes())
}
