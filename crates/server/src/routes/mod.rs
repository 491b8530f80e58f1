use axum::Router;

use crate::state::AppState;

pub mod habits;
pub mod health;
pub mod workspaces;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(workspaces::router())
        .merge(habits::router())
}
