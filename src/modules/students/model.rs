//! Student models and DTOs.
//!
//! Students are principals without a role/permission model; a student
//! token is their single capability scope.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub career_id: Uuid,
    pub email: String,
    pub telephone: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for issuing a student invitation. Only the email is proposed up
/// front; the rest of the record is supplied at redemption.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InviteStudentDto {
    #[validate(email)]
    pub email: String,
}
