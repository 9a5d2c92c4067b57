use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use practia_core::AppError;

use crate::config::jwt::JwtConfig;
use crate::utils::token::{TokenPayload, TokenService};

use super::model::{InviteStudentDto, Student};

const STUDENT_COLUMNS: &str =
    "id, name, code, career_id, email, telephone, created_at, updated_at";

pub struct StudentService;

impl StudentService {
    #[instrument(skip(db))]
    pub async fn list_students(db: &PgPool) -> Result<Vec<Student>, AppError> {
        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students ORDER BY name"
        ))
        .fetch_all(db)
        .await?;

        Ok(students)
    }

    #[instrument(skip(db))]
    pub async fn find_by_id(db: &PgPool, student_id: Uuid) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
        ))
        .bind(student_id)
        .fetch_optional(db)
        .await?;

        Ok(student)
    }

    /// Issue a student invitation token carrying only the proposed email.
    #[instrument(skip(db, tokens, jwt_config))]
    pub async fn invite_student(
        db: &PgPool,
        tokens: &TokenService,
        jwt_config: &JwtConfig,
        dto: InviteStudentDto,
    ) -> Result<String, AppError> {
        let existing = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM students WHERE email = $1)",
        )
        .bind(&dto.email)
        .fetch_one(db)
        .await?;

        if existing {
            return Err(AppError::conflict(anyhow::anyhow!(
                "A student with this email already exists"
            )));
        }

        tokens.sign(
            TokenPayload::InviteStudent { email: dto.email },
            jwt_config.invite_ttl,
        )
    }
}
