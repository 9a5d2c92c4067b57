use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use practia_core::{AppError, Permission};

use crate::config::jwt::JwtConfig;
use crate::utils::token::{TokenPayload, TokenService, UserInvite};

use super::model::{InviteUserDto, UpdatePermissionsDto, User};

const USER_COLUMNS: &str = "id, name, email, role, permissions, created_at, updated_at";

pub struct UserService;

impl UserService {
    #[instrument(skip(db))]
    pub async fn list_users(db: &PgPool) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY name"
        ))
        .fetch_all(db)
        .await?;

        Ok(users)
    }

    #[instrument(skip(db))]
    pub async fn find_by_id(db: &PgPool, user_id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?;

        Ok(user)
    }

    /// Replace a user's explicit grants. Grants only ever add to the role
    /// defaults, so this cannot lock a user out of their role's baseline.
    #[instrument(skip(db))]
    pub async fn update_permissions(
        db: &PgPool,
        user_id: Uuid,
        dto: UpdatePermissionsDto,
    ) -> Result<User, AppError> {
        let tags = permission_tags(&dto.permissions);

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET permissions = $1, updated_at = NOW()
             WHERE id = $2
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&tags)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        Ok(user)
    }

    /// Issue a user invitation token carrying the proposed account data.
    /// The account itself is only created when the invite is redeemed.
    /// Returns the signed token so the controller can mail it out.
    #[instrument(skip(db, tokens, jwt_config))]
    pub async fn invite_user(
        db: &PgPool,
        tokens: &TokenService,
        jwt_config: &JwtConfig,
        dto: InviteUserDto,
    ) -> Result<String, AppError> {
        let existing = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(&dto.email)
        .fetch_one(db)
        .await?;

        if existing {
            return Err(AppError::conflict(anyhow::anyhow!(
                "A user with this email already exists"
            )));
        }

        let payload = TokenPayload::InviteUser(UserInvite {
            name: dto.name,
            email: dto.email,
            role: dto.role,
            permissions: dto.permissions,
        });

        tokens.sign(payload, jwt_config.invite_ttl)
    }
}

/// Convert typed permissions to their stored tag form.
pub fn permission_tags(permissions: &[Permission]) -> Vec<String> {
    permissions.iter().map(|p| p.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use practia_core::Role;

    fn test_jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test_secret_key_for_testing_purposes".to_string(),
            session_ttl: 86400,
            recovery_ttl: 3600,
            invite_ttl: 604800,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_permissions_replaces_grants(pool: PgPool) {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password, role, permissions)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, name, email, role, permissions, created_at, updated_at",
        )
        .bind("Grant Target")
        .bind("grants@example.com")
        .bind("irrelevant-hash")
        .bind(Role::Base)
        .bind(vec!["VIEW_USER".to_string()])
        .fetch_one(&pool)
        .await
        .unwrap();

        let updated = UserService::update_permissions(
            &pool,
            user.id,
            UpdatePermissionsDto {
                permissions: vec![Permission::EditVacancy, Permission::InviteUser],
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.permissions, vec!["EDIT_VACANCY", "INVITE_USER"]);
        let effective = updated.effective_permissions().unwrap();
        assert!(effective.contains(&Permission::EditVacancy));
        // the replaced VIEW_USER grant is gone; base defaults remain
        assert!(!effective.contains(&Permission::ViewUser));
        assert!(effective.contains(&Permission::ViewCycle));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_invite_rejects_taken_email(pool: PgPool) {
        sqlx::query(
            "INSERT INTO users (name, email, password, role) VALUES ($1, $2, $3, $4)",
        )
        .bind("Existing")
        .bind("taken@example.com")
        .bind("irrelevant-hash")
        .bind(Role::Base)
        .execute(&pool)
        .await
        .unwrap();

        let jwt_config = test_jwt_config();
        let tokens = TokenService::new(&jwt_config);

        let result = UserService::invite_user(
            &pool,
            &tokens,
            &jwt_config,
            InviteUserDto {
                name: "Dup".to_string(),
                email: "taken@example.com".to_string(),
                role: Role::Base,
                permissions: vec![],
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(result.unwrap_err().status, axum::http::StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_invite_token_carries_proposed_account(pool: PgPool) {
        let jwt_config = test_jwt_config();
        let tokens = TokenService::new(&jwt_config);

        let token = UserService::invite_user(
            &pool,
            &tokens,
            &jwt_config,
            InviteUserDto {
                name: "Invitee".to_string(),
                email: "invitee@example.com".to_string(),
                role: Role::Member,
                permissions: vec![Permission::InviteUser],
            },
        )
        .await
        .unwrap();

        let claims = tokens.verify(&token).unwrap();
        match claims.payload {
            TokenPayload::InviteUser(invite) => {
                assert_eq!(invite.name, "Invitee");
                assert_eq!(invite.email, "invitee@example.com");
                assert_eq!(invite.role, Role::Member);
                assert_eq!(invite.permissions, vec![Permission::InviteUser]);
            }
            other => panic!("expected an invite-user payload, got {:?}", other.scope()),
        }
    }
}
