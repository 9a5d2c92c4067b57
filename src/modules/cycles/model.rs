//! Cycle models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// An enrollment cycle, e.g. `2025A`. At most one cycle is current at any
/// committed point in time.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct Cycle {
    pub id: Uuid,
    pub slug: String,
    pub is_current: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCycleDto {
    #[validate(length(min = 1))]
    pub slug: String,
    /// When true, the new cycle is promoted after the insert through the
    /// same atomic flip used everywhere else.
    #[serde(default)]
    pub is_current: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCycleDto {
    #[validate(length(min = 1))]
    pub slug: Option<String>,
    pub is_current: Option<bool>,
}
