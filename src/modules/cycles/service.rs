//! Cycle storage and the current-cycle invariant.
//!
//! At most one cycle may have `is_current = TRUE` at any committed point
//! in time. [`CycleService::set_current`] is the only write path for that
//! flag: it unsets every current row and promotes the target inside one
//! transaction, so concurrent promotions serialize against each other and
//! a reader never observes two current cycles. The partial unique index
//! `cycles_single_current_idx` is the backstop against any write that
//! bypasses the flip; hitting it surfaces as `CYCLE_CONFLICT` and is not
//! retried here. Retry policy, if any, belongs to the caller.

use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use practia_core::AppError;
use practia_core::errors::codes;

use super::model::{CreateCycleDto, Cycle, UpdateCycleDto};

const CYCLE_COLUMNS: &str = "id, slug, is_current, created_at, updated_at";

fn map_cycle_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if db_err.constraint() == Some("cycles_single_current_idx") {
                return AppError::new(
                    axum::http::StatusCode::CONFLICT,
                    codes::CYCLE_CONFLICT,
                    anyhow::anyhow!("another cycle is already current"),
                );
            }
            return AppError::conflict(anyhow::anyhow!(
                "A cycle with this slug already exists"
            ));
        }
    }
    AppError::from(e)
}

pub struct CycleService;

impl CycleService {
    /// Create a cycle. The insert never sets `is_current` directly; when
    /// the caller wants the new cycle current, it is promoted through
    /// [`Self::set_current`] so there is a single write path for the flag.
    #[instrument(skip(db))]
    pub async fn create_cycle(db: &PgPool, dto: CreateCycleDto) -> Result<Cycle, AppError> {
        let cycle = sqlx::query_as::<_, Cycle>(&format!(
            "INSERT INTO cycles (slug) VALUES ($1) RETURNING {CYCLE_COLUMNS}"
        ))
        .bind(&dto.slug)
        .fetch_one(db)
        .await
        .map_err(map_cycle_error)?;

        if dto.is_current {
            return Self::set_current(db, cycle.id).await;
        }

        Ok(cycle)
    }

    #[instrument(skip(db))]
    pub async fn list_cycles(db: &PgPool) -> Result<Vec<Cycle>, AppError> {
        let cycles = sqlx::query_as::<_, Cycle>(&format!(
            "SELECT {CYCLE_COLUMNS} FROM cycles ORDER BY slug DESC"
        ))
        .fetch_all(db)
        .await?;

        Ok(cycles)
    }

    #[instrument(skip(db))]
    pub async fn find_by_id(db: &PgPool, cycle_id: Uuid) -> Result<Cycle, AppError> {
        let cycle = sqlx::query_as::<_, Cycle>(&format!(
            "SELECT {CYCLE_COLUMNS} FROM cycles WHERE id = $1"
        ))
        .bind(cycle_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Cycle not found")))?;

        Ok(cycle)
    }

    /// The (at most one) current cycle.
    #[instrument(skip(db))]
    pub async fn find_current(db: &PgPool) -> Result<Option<Cycle>, AppError> {
        let cycle = sqlx::query_as::<_, Cycle>(&format!(
            "SELECT {CYCLE_COLUMNS} FROM cycles WHERE is_current = TRUE"
        ))
        .fetch_optional(db)
        .await?;

        Ok(cycle)
    }

    /// Atomically promote a cycle to current.
    ///
    /// Both statements run on the one transaction connection: unsetting
    /// the previous current row and promoting the target commit together
    /// or not at all.
    #[instrument(skip(db))]
    pub async fn set_current(db: &PgPool, cycle_id: Uuid) -> Result<Cycle, AppError> {
        let mut tx = db.begin().await?;

        sqlx::query(
            "UPDATE cycles SET is_current = FALSE, updated_at = NOW() WHERE is_current = TRUE",
        )
        .execute(&mut *tx)
        .await?;

        let cycle = sqlx::query_as::<_, Cycle>(&format!(
            "UPDATE cycles SET is_current = TRUE, updated_at = NOW()
             WHERE id = $1
             RETURNING {CYCLE_COLUMNS}"
        ))
        .bind(cycle_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_cycle_error)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Cycle not found")))?;

        tx.commit().await?;

        Ok(cycle)
    }

    /// Rename a cycle and optionally promote it. Promotion goes through
    /// [`Self::set_current`]; there is no direct `is_current` write here.
    /// Passing `is_current = false` is ignored rather than demoting, so
    /// an update can never leave the program without a current cycle by
    /// accident.
    #[instrument(skip(db))]
    pub async fn update_cycle(
        db: &PgPool,
        cycle_id: Uuid,
        dto: UpdateCycleDto,
    ) -> Result<Cycle, AppError> {
        let existing = Self::find_by_id(db, cycle_id).await?;

        let slug = dto.slug.unwrap_or(existing.slug);

        let cycle = sqlx::query_as::<_, Cycle>(&format!(
            "UPDATE cycles SET slug = $1, updated_at = NOW()
             WHERE id = $2
             RETURNING {CYCLE_COLUMNS}"
        ))
        .bind(&slug)
        .bind(cycle_id)
        .fetch_one(db)
        .await
        .map_err(map_cycle_error)?;

        if dto.is_current == Some(true) && !cycle.is_current {
            return Self::set_current(db, cycle_id).await;
        }

        Ok(cycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create(pool: &PgPool, slug: &str, current: bool) -> Cycle {
        CycleService::create_cycle(
            pool,
            CreateCycleDto {
                slug: slug.to_string(),
                is_current: current,
            },
        )
        .await
        .unwrap()
    }

    async fn count_current(pool: &PgPool) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cycles WHERE is_current = TRUE")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_cycle_is_not_current_by_default(pool: PgPool) {
        let cycle = create(&pool, "2024A", false).await;
        assert_eq!(cycle.slug, "2024A");
        assert!(!cycle.is_current);
        assert!(CycleService::find_current(&pool).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_slug_is_a_conflict(pool: PgPool) {
        create(&pool, "2024A", false).await;

        let result = CycleService::create_cycle(
            &pool,
            CreateCycleDto {
                slug: "2024A".to_string(),
                is_current: false,
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(result.unwrap_err().status, axum::http::StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_promote_then_repromote(pool: PgPool) {
        // create "2024A" (not current), then "2024B" as current via
        // create-then-promote
        let a = create(&pool, "2024A", false).await;
        let b = create(&pool, "2024B", true).await;
        assert!(b.is_current);

        let current = CycleService::find_current(&pool).await.unwrap().unwrap();
        assert_eq!(current.id, b.id);

        // promoting "2024A" afterward demotes "2024B"
        CycleService::set_current(&pool, a.id).await.unwrap();

        let current = CycleService::find_current(&pool).await.unwrap().unwrap();
        assert_eq!(current.id, a.id);

        let b_after = CycleService::find_by_id(&pool, b.id).await.unwrap();
        assert!(!b_after.is_current);
        assert_eq!(count_current(&pool).await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_set_current_unknown_id_is_not_found(pool: PgPool) {
        create(&pool, "2024A", true).await;

        let result = CycleService::set_current(&pool, uuid::Uuid::new_v4()).await;
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().status,
            axum::http::StatusCode::NOT_FOUND
        );

        // the failed flip rolled back; the previous current cycle survives
        assert_eq!(count_current(&pool).await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_concurrent_promotions_leave_one_current(pool: PgPool) {
        let a = create(&pool, "2025A", false).await;
        let b = create(&pool, "2025B", false).await;

        let (ra, rb) = tokio::join!(
            CycleService::set_current(&pool, a.id),
            CycleService::set_current(&pool, b.id),
        );

        // either both flips serialize cleanly, or the second committer
        // hits the unique-index backstop; never two current cycles
        let successes = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
        assert!(successes >= 1);
        assert_eq!(count_current(&pool).await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_unique_index_backstops_raw_writes(pool: PgPool) {
        create(&pool, "2025A", true).await;

        // a write that bypasses the flip must hit the partial unique index
        let result = sqlx::query("INSERT INTO cycles (slug, is_current) VALUES ('2025B', TRUE)")
            .execute(&pool)
            .await;

        assert!(result.is_err());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_promotes_via_flip(pool: PgPool) {
        let a = create(&pool, "2025A", true).await;
        let b = create(&pool, "2025B", false).await;

        let updated = CycleService::update_cycle(
            &pool,
            b.id,
            UpdateCycleDto {
                slug: None,
                is_current: Some(true),
            },
        )
        .await
        .unwrap();

        assert!(updated.is_current);
        assert_eq!(count_current(&pool).await, 1);

        let a_after = CycleService::find_by_id(&pool, a.id).await.unwrap();
        assert!(!a_after.is_current);
    }
}
