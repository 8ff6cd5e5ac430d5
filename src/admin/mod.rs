use axum::Router;

use crate::state::AppState;

mod dto;
pub mod guard;
pub mod handlers;

pub fn router() -> Router<AppState> {
    handlers::admin_routes()
}
