use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::instrument;

use practia_core::AppError;

use crate::middleware::auth::{AuthStudent, RequireInviteUser, RequireViewStudent};
use crate::modules::auth::model::MessageResponse;
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::validator::ValidatedJson;

use super::model::{InviteStudentDto, Student};
use super::service::StudentService;

/// List all students.
#[instrument(skip(state, _auth))]
pub async fn list_students(
    State(state): State<AppState>,
    _auth: RequireViewStudent,
) -> Result<Json<Vec<Student>>, AppError> {
    let students = StudentService::list_students(&state.db).await?;
    Ok(Json(students))
}

/// The authenticated student's own profile.
#[instrument(skip(auth_student))]
pub async fn me(auth_student: AuthStudent) -> Json<Student> {
    Json(auth_student.student)
}

/// Issue a student invitation and mail it to the invitee.
#[instrument(skip(state, _auth, dto))]
pub async fn invite_student(
    State(state): State<AppState>,
    _auth: RequireInviteUser,
    ValidatedJson(dto): ValidatedJson<InviteStudentDto>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let email = dto.email.clone();
    let token =
        StudentService::invite_student(&state.db, &state.token_service, &state.jwt_config, dto)
            .await?;

    EmailService::new(state.email_config.clone())
        .send_invitation(&email, &token)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("Invitation sent to {email}"),
        }),
    ))
}
