use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    create_cycle, get_current_cycle, list_cycles, set_current_cycle, update_cycle,
};

pub fn init_cycles_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cycles).post(create_cycle))
        .route("/current", get(get_current_cycle))
        .route("/{cycle_id}", patch(update_cycle))
        .route("/{cycle_id}/current", post(set_current_cycle))
}
