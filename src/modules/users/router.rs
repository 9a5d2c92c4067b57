use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{invite_user, list_users, me, update_permissions};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(me))
        .route("/{user_id}/permissions", patch(update_permissions))
        .route("/invitations", post(invite_user))
}
