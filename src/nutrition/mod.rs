pub mod aggregator;
pub mod aliases;
pub mod balance;
pub mod dates;
pub mod derivation;
pub mod dto;
pub mod handlers;
pub(crate) mod payload;
pub mod repo;
pub mod rounding;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::goal_routes())
        .merge(handlers::balance_routes())
}
