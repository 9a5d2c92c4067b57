use axum::Json;
use axum::extract::State;
use tracing::instrument;

use practia_core::AppError;

use crate::middleware::auth::RecoveryBearer;
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::validator::ValidatedJson;

use super::model::{
    AcceptStudentInviteRequest, AcceptUserInviteRequest, ForgotPasswordRequest, LoginRequest,
    LoginResponse, MessageResponse, ResetPasswordRequest, StudentLoginResponse,
};
use super::service::AuthService;

#[instrument(skip(state, dto))]
pub async fn login_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response =
        AuthService::login_user(&state.db, dto, &state.token_service, &state.jwt_config).await?;
    Ok(Json(response))
}

#[instrument(skip(state, dto))]
pub async fn login_student(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<StudentLoginResponse>, AppError> {
    let response =
        AuthService::login_student(&state.db, dto, &state.token_service, &state.jwt_config)
            .await?;
    Ok(Json(response))
}

#[instrument(skip(state, dto))]
pub async fn forgot_user_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let mailer = EmailService::new(state.email_config.clone());
    AuthService::forgot_user_password(
        &state.db,
        &dto.email,
        &state.token_service,
        &state.jwt_config,
        &mailer,
    )
    .await?;

    Ok(Json(MessageResponse {
        message: "If an account exists with that email, a password reset link has been sent."
            .to_string(),
    }))
}

#[instrument(skip(state, dto))]
pub async fn forgot_student_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let mailer = EmailService::new(state.email_config.clone());
    AuthService::forgot_student_password(
        &state.db,
        &dto.email,
        &state.token_service,
        &state.jwt_config,
        &mailer,
    )
    .await?;

    Ok(Json(MessageResponse {
        message: "If an account exists with that email, a password reset link has been sent."
            .to_string(),
    }))
}

/// Redeem a recovery token (strict `Bearer` header) against a new password.
#[instrument(skip(state, token, dto))]
pub async fn reset_user_password(
    State(state): State<AppState>,
    RecoveryBearer(token): RecoveryBearer,
    ValidatedJson(dto): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::reset_user_password(&state.db, &token, &dto.password, &state.token_service)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password has been reset. You can now log in with your new password."
            .to_string(),
    }))
}

#[instrument(skip(state, token, dto))]
pub async fn reset_student_password(
    State(state): State<AppState>,
    RecoveryBearer(token): RecoveryBearer,
    ValidatedJson(dto): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::reset_student_password(&state.db, &token, &dto.password, &state.token_service)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password has been reset. You can now log in with your new password."
            .to_string(),
    }))
}

#[instrument(skip(state, dto))]
pub async fn accept_user_invite(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<AcceptUserInviteRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response =
        AuthService::accept_user_invite(&state.db, dto, &state.token_service, &state.jwt_config)
            .await?;
    Ok(Json(response))
}

#[instrument(skip(state, dto))]
pub async fn accept_student_invite(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<AcceptStudentInviteRequest>,
) -> Result<Json<StudentLoginResponse>, AppError> {
    let response = AuthService::accept_student_invite(
        &state.db,
        dto,
        &state.token_service,
        &state.jwt_config,
    )
    .await?;
    Ok(Json(response))
}
