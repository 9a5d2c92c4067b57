use axum::{Router, routing::post};

use crate::state::AppState;

use super::controller::{
    accept_student_invite, accept_user_invite, forgot_student_password, forgot_user_password,
    login_student, login_user, reset_student_password, reset_user_password,
};

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login_user))
        .route("/forgot-password", post(forgot_user_password))
        .route("/reset-password", post(reset_user_password))
        .route("/invitations/accept", post(accept_user_invite))
        .route("/students/login", post(login_student))
        .route("/students/forgot-password", post(forgot_student_password))
        .route("/students/reset-password", post(reset_student_password))
        .route("/students/invitations/accept", post(accept_student_invite))
}
