use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{invite_student, list_students, me};

pub fn init_students_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students))
        .route("/me", get(me))
        .route("/invitations", post(invite_student))
}
