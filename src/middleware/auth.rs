use std::collections::HashSet;

use anyhow::anyhow;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use practia_core::errors::codes;
use practia_core::{AppError, Permission};

use crate::modules::students::model::Student;
use crate::modules::students::service::StudentService;
use crate::modules::users::model::User;
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::token::TokenPayload;

/// Pull the bearer token out of the `Authorization` header.
///
/// Deliberately loose: split on whitespace and take the second token, no
/// check of the `Bearer` word itself. Only the recovery redemption path
/// ([`RecoveryBearer`]) enforces the strict prefix; the divergence is
/// inherited behavior and kept as is.
fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::unauthorized(codes::MISSING_TOKEN, anyhow!("missing authorization header"))
        })?;

    value.split_whitespace().nth(1).ok_or_else(|| {
        AppError::unauthorized(codes::INVALID_TOKEN, anyhow!("malformed authorization header"))
    })
}

/// Authenticated staff user, with the effective permission set computed
/// from the freshly loaded row. The token's embedded permission snapshot
/// may be hours old and is never trusted here; an admin revoking a grant
/// takes effect on the next request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub permissions: HashSet<Permission>,
}

impl AuthUser {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Require every permission in `required`, or reject with `FORBIDDEN`.
    pub fn require(&self, required: &[Permission]) -> Result<(), AppError> {
        let missing: Vec<&str> = required
            .iter()
            .filter(|p| !self.permissions.contains(p))
            .map(|p| p.as_str())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::forbidden(anyhow!(
                "missing required permission(s): {}",
                missing.join(", ")
            )))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let claims = state
            .token_service
            .verify(token)
            .map_err(|e| e.into_app_error())?;

        let user_id = match claims.payload {
            TokenPayload::User(user_claims) => user_claims.id,
            other => {
                return Err(AppError::unauthorized(
                    codes::INVALID_SCOPE,
                    anyhow!("expected a user token, got scope {}", other.scope()),
                ));
            }
        };

        // Token was valid, but the account may have been deleted since.
        let user = UserService::find_by_id(&state.db, user_id)
            .await?
            .ok_or_else(|| {
                AppError::unauthorized(codes::UNAUTHORIZED, anyhow!("account no longer exists"))
            })?;

        let permissions = user.effective_permissions()?;

        Ok(AuthUser { user, permissions })
    }
}

/// Authenticated student. Students carry no permission model; a valid
/// `student`-scoped token for an existing account is all there is.
#[derive(Debug, Clone)]
pub struct AuthStudent {
    pub student: Student,
}

impl FromRequestParts<AppState> for AuthStudent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let claims = state
            .token_service
            .verify(token)
            .map_err(|e| e.into_app_error())?;

        let student_id = match claims.payload {
            TokenPayload::Student(student_claims) => student_claims.id,
            other => {
                return Err(AppError::unauthorized(
                    codes::INVALID_SCOPE,
                    anyhow!("expected a student token, got scope {}", other.scope()),
                ));
            }
        };

        let student = StudentService::find_by_id(&state.db, student_id)
            .await?
            .ok_or_else(|| {
                AppError::unauthorized(codes::UNAUTHORIZED, anyhow!("account no longer exists"))
            })?;

        Ok(AuthStudent { student })
    }
}

/// Raw bearer token for the password reset endpoints. Unlike the session
/// guards this requires the exact `Bearer ` prefix; the token itself is
/// verified by the auth service, which also checks the recovery scope.
#[derive(Debug, Clone)]
pub struct RecoveryBearer(pub String);

impl<S> FromRequestParts<S> for RecoveryBearer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::unauthorized(
                    codes::MISSING_TOKEN,
                    anyhow!("missing authorization header"),
                )
            })?;

        let token = value.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized(
                codes::INVALID_TOKEN,
                anyhow!("invalid authorization header format"),
            )
        })?;

        Ok(RecoveryBearer(token.to_string()))
    }
}

/// Generate a typed extractor that authenticates a user and requires a
/// fixed permission list.
#[macro_export]
macro_rules! require_permissions {
    ($name:ident, $($permission:expr),+ $(,)?) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = practia_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user =
                    <$crate::middleware::auth::AuthUser as axum::extract::FromRequestParts<
                        $crate::state::AppState,
                    >>::from_request_parts(parts, state)
                    .await?;

                auth_user.require(&[$($permission),+])?;

                Ok($name(auth_user))
            }
        }
    };
}

// Route-level permission extractors

require_permissions!(RequireViewUser, Permission::ViewUser);
require_permissions!(RequireEditUser, Permission::EditUser);
require_permissions!(RequireInviteUser, Permission::InviteUser);
require_permissions!(RequireViewStudent, Permission::ViewStudent);
require_permissions!(RequireViewCycle, Permission::ViewCycle);
require_permissions!(RequireEditCycle, Permission::EditCycle);
