use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use practia_core::errors::codes;
use practia_core::{AppError, Role, hash_password, verify_password};

use crate::config::jwt::JwtConfig;
use crate::modules::students::model::Student;
use crate::modules::users::model::User;
use crate::modules::users::service::permission_tags;
use crate::utils::email::EmailService;
use crate::utils::token::{
    Scope, StudentClaims, TokenPayload, TokenService, UserClaims,
};

use super::model::{
    AcceptStudentInviteRequest, AcceptUserInviteRequest, LoginRequest, LoginResponse,
    StudentLoginResponse,
};

fn wrong_credentials() -> AppError {
    AppError::unauthorized(codes::WRONG_CREDENTIALS, anyhow!("Invalid email or password"))
}

fn invalid_scope(expected: Scope, got: Scope) -> AppError {
    AppError::unauthorized(
        codes::INVALID_SCOPE,
        anyhow!("expected a {expected} token, got scope {got}"),
    )
}

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, dto, tokens, jwt_config))]
    pub async fn login_user(
        db: &PgPool,
        dto: LoginRequest,
        tokens: &TokenService,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        #[derive(sqlx::FromRow)]
        struct UserWithPassword {
            id: Uuid,
            name: String,
            email: String,
            password: String,
            role: Role,
            permissions: Vec<String>,
            created_at: chrono::DateTime<chrono::Utc>,
            updated_at: chrono::DateTime<chrono::Utc>,
        }

        let row = sqlx::query_as::<_, UserWithPassword>(
            "SELECT id, name, email, password, role, permissions, created_at, updated_at
             FROM users WHERE email = $1",
        )
        .bind(&dto.email)
        .fetch_optional(db)
        .await?
        .ok_or_else(wrong_credentials)?;

        if !verify_password(&dto.password, &row.password)? {
            return Err(wrong_credentials());
        }

        let user = User {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role,
            permissions: row.permissions,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };

        // the snapshot is informational; guards re-derive on every request
        let permissions = user.effective_permissions()?.into_iter().collect();

        let token = tokens.sign(
            TokenPayload::User(UserClaims {
                id: user.id,
                name: user.name.clone(),
                email: user.email.clone(),
                role: user.role,
                permissions,
                created_at: user.created_at,
                updated_at: user.updated_at,
            }),
            jwt_config.session_ttl,
        )?;

        Ok(LoginResponse { token, user })
    }

    #[instrument(skip(db, dto, tokens, jwt_config))]
    pub async fn login_student(
        db: &PgPool,
        dto: LoginRequest,
        tokens: &TokenService,
        jwt_config: &JwtConfig,
    ) -> Result<StudentLoginResponse, AppError> {
        #[derive(sqlx::FromRow)]
        struct StudentWithPassword {
            id: Uuid,
            name: String,
            code: String,
            password: String,
            career_id: Uuid,
            email: String,
            telephone: String,
            created_at: chrono::DateTime<chrono::Utc>,
            updated_at: chrono::DateTime<chrono::Utc>,
        }

        let row = sqlx::query_as::<_, StudentWithPassword>(
            "SELECT id, name, code, password, career_id, email, telephone, created_at, updated_at
             FROM students WHERE email = $1",
        )
        .bind(&dto.email)
        .fetch_optional(db)
        .await?
        .ok_or_else(wrong_credentials)?;

        if !verify_password(&dto.password, &row.password)? {
            return Err(wrong_credentials());
        }

        let student = Student {
            id: row.id,
            name: row.name,
            code: row.code,
            career_id: row.career_id,
            email: row.email,
            telephone: row.telephone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };

        let token = tokens.sign(
            TokenPayload::Student(StudentClaims {
                id: student.id,
                name: student.name.clone(),
                code: student.code.clone(),
                career_id: student.career_id,
                email: student.email.clone(),
                telephone: student.telephone.clone(),
                created_at: student.created_at,
                updated_at: student.updated_at,
            }),
            jwt_config.session_ttl,
        )?;

        Ok(StudentLoginResponse { token, student })
    }

    /// Issue a recovery token and mail it. The caller's response is the
    /// same whether or not the account exists.
    #[instrument(skip(db, tokens, jwt_config, mailer))]
    pub async fn forgot_user_password(
        db: &PgPool,
        email: &str,
        tokens: &TokenService,
        jwt_config: &JwtConfig,
        mailer: &EmailService,
    ) -> Result<(), AppError> {
        let row = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, name FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(db)
        .await?;

        let Some((user_id, name)) = row else {
            tracing::info!("password recovery requested for unknown user email");
            return Ok(());
        };

        let token = tokens.sign(
            TokenPayload::RecoverUserPassword { id: user_id },
            jwt_config.recovery_ttl,
        )?;

        mailer.send_password_recovery(email, &name, &token).await
    }

    #[instrument(skip(db, tokens, jwt_config, mailer))]
    pub async fn forgot_student_password(
        db: &PgPool,
        email: &str,
        tokens: &TokenService,
        jwt_config: &JwtConfig,
        mailer: &EmailService,
    ) -> Result<(), AppError> {
        let row = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, name FROM students WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(db)
        .await?;

        let Some((student_id, name)) = row else {
            tracing::info!("password recovery requested for unknown student email");
            return Ok(());
        };

        let token = tokens.sign(
            TokenPayload::RecoverStudentPassword { id: student_id },
            jwt_config.recovery_ttl,
        )?;

        mailer.send_password_recovery(email, &name, &token).await
    }

    /// Redeem a `recover-user-password` token. The password hash is the
    /// only field this path may mutate. Tokens are not revoked after use;
    /// they stay redeemable until expiry.
    #[instrument(skip(db, token, new_password, tokens))]
    pub async fn reset_user_password(
        db: &PgPool,
        token: &str,
        new_password: &str,
        tokens: &TokenService,
    ) -> Result<(), AppError> {
        let claims = tokens.verify(token).map_err(|e| e.into_app_error())?;

        let user_id = match claims.payload {
            TokenPayload::RecoverUserPassword { id } => id,
            other => return Err(invalid_scope(Scope::RecoverUserPassword, other.scope())),
        };

        let hashed = hash_password(new_password)?;

        let result = sqlx::query(
            "UPDATE users SET password = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(&hashed)
        .bind(user_id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::unauthorized(
                codes::UNAUTHORIZED,
                anyhow!("account no longer exists"),
            ));
        }

        Ok(())
    }

    #[instrument(skip(db, token, new_password, tokens))]
    pub async fn reset_student_password(
        db: &PgPool,
        token: &str,
        new_password: &str,
        tokens: &TokenService,
    ) -> Result<(), AppError> {
        let claims = tokens.verify(token).map_err(|e| e.into_app_error())?;

        let student_id = match claims.payload {
            TokenPayload::RecoverStudentPassword { id } => id,
            other => return Err(invalid_scope(Scope::RecoverStudentPassword, other.scope())),
        };

        let hashed = hash_password(new_password)?;

        let result = sqlx::query(
            "UPDATE students SET password = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(&hashed)
        .bind(student_id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::unauthorized(
                codes::UNAUTHORIZED,
                anyhow!("account no longer exists"),
            ));
        }

        Ok(())
    }

    /// Redeem an `invite-user` token: create the account from the token's
    /// proposed data plus the newly supplied password, and log it in.
    /// The unique constraint on email is what blocks a second redemption.
    #[instrument(skip(db, dto, tokens, jwt_config))]
    pub async fn accept_user_invite(
        db: &PgPool,
        dto: AcceptUserInviteRequest,
        tokens: &TokenService,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let claims = tokens.verify(&dto.token).map_err(|e| e.into_app_error())?;

        let invite = match claims.payload {
            TokenPayload::InviteUser(invite) => invite,
            other => return Err(invalid_scope(Scope::InviteUser, other.scope())),
        };

        let hashed = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password, role, permissions)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, name, email, role, permissions, created_at, updated_at",
        )
        .bind(&invite.name)
        .bind(&invite.email)
        .bind(&hashed)
        .bind(invite.role)
        .bind(permission_tags(&invite.permissions))
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::conflict(anyhow!(
                        "This invitation was already redeemed"
                    ));
                }
            }
            AppError::from(e)
        })?;

        let permissions = user.effective_permissions()?.into_iter().collect();

        let token = tokens.sign(
            TokenPayload::User(UserClaims {
                id: user.id,
                name: user.name.clone(),
                email: user.email.clone(),
                role: user.role,
                permissions,
                created_at: user.created_at,
                updated_at: user.updated_at,
            }),
            jwt_config.session_ttl,
        )?;

        Ok(LoginResponse { token, user })
    }

    /// Redeem an `invite-student` token. The email comes from the token;
    /// everything else is supplied at redemption.
    #[instrument(skip(db, dto, tokens, jwt_config))]
    pub async fn accept_student_invite(
        db: &PgPool,
        dto: AcceptStudentInviteRequest,
        tokens: &TokenService,
        jwt_config: &JwtConfig,
    ) -> Result<StudentLoginResponse, AppError> {
        let claims = tokens.verify(&dto.token).map_err(|e| e.into_app_error())?;

        let email = match claims.payload {
            TokenPayload::InviteStudent { email } => email,
            other => return Err(invalid_scope(Scope::InviteStudent, other.scope())),
        };

        let hashed = hash_password(&dto.password)?;

        let student = sqlx::query_as::<_, Student>(
            "INSERT INTO students (name, code, password, career_id, email, telephone)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, name, code, career_id, email, telephone, created_at, updated_at",
        )
        .bind(&dto.name)
        .bind(&dto.code)
        .bind(&hashed)
        .bind(dto.career_id)
        .bind(&email)
        .bind(&dto.telephone)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::conflict(anyhow!(
                        "This invitation was already redeemed"
                    ));
                }
                if db_err.is_foreign_key_violation() {
                    return AppError::bad_request(anyhow!("Unknown career"));
                }
            }
            AppError::from(e)
        })?;

        let token = tokens.sign(
            TokenPayload::Student(StudentClaims {
                id: student.id,
                name: student.name.clone(),
                code: student.code.clone(),
                career_id: student.career_id,
                email: student.email.clone(),
                telephone: student.telephone.clone(),
                created_at: student.created_at,
                updated_at: student.updated_at,
            }),
            jwt_config.session_ttl,
        )?;

        Ok(StudentLoginResponse { token, student })
    }
}
