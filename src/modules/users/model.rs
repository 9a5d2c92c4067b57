//! Staff user models and DTOs.

use std::collections::HashSet;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use practia_core::permissions::parse_grants;
use practia_core::{AppError, Permission, Role, effective_permissions};

/// A staff user. `permissions` holds the explicit grants as stored; the
/// role's defaults are not materialized into the row.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub permissions: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// Parse the stored grant tags. An unknown tag is a data-integrity
    /// defect and surfaces as an internal error.
    pub fn grants(&self) -> Result<Vec<Permission>, AppError> {
        parse_grants(&self.permissions)
            .map_err(|e| AppError::internal(anyhow!("corrupt permission grant: {e}")))
    }

    /// Role defaults united with explicit grants.
    pub fn effective_permissions(&self) -> Result<HashSet<Permission>, AppError> {
        Ok(effective_permissions(self.role, &self.grants()?))
    }
}

/// DTO for issuing a user invitation. Carries the proposed account data;
/// nothing is persisted until the invite is redeemed.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InviteUserDto {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// DTO for replacing a user's explicit grants.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePermissionsDto {
    pub permissions: Vec<Permission>,
}
