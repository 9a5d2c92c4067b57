use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::instrument;
use uuid::Uuid;

use practia_core::AppError;

use crate::middleware::auth::{AuthUser, RequireEditUser, RequireInviteUser, RequireViewUser};
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::validator::ValidatedJson;

use super::model::{InviteUserDto, UpdatePermissionsDto, User};
use super::service::UserService;
use crate::modules::auth::model::MessageResponse;

/// List all staff users.
#[instrument(skip(state, _auth))]
pub async fn list_users(
    State(state): State<AppState>,
    _auth: RequireViewUser,
) -> Result<Json<Vec<User>>, AppError> {
    let users = UserService::list_users(&state.db).await?;
    Ok(Json(users))
}

/// The authenticated user's own profile.
#[instrument(skip(auth_user))]
pub async fn me(auth_user: AuthUser) -> Json<User> {
    Json(auth_user.user)
}

/// Replace a user's explicit permission grants.
#[instrument(skip(state, _auth))]
pub async fn update_permissions(
    State(state): State<AppState>,
    _auth: RequireEditUser,
    Path(user_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdatePermissionsDto>,
) -> Result<Json<User>, AppError> {
    let user = UserService::update_permissions(&state.db, user_id, dto).await?;
    Ok(Json(user))
}

/// Issue a user invitation and mail it to the invitee.
#[instrument(skip(state, _auth, dto))]
pub async fn invite_user(
    State(state): State<AppState>,
    _auth: RequireInviteUser,
    ValidatedJson(dto): ValidatedJson<InviteUserDto>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let email = dto.email.clone();
    let token =
        UserService::invite_user(&state.db, &state.token_service, &state.jwt_config, dto).await?;

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
