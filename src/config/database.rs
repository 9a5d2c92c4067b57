//! PostgreSQL connection pool initialization.
//!
//! The pool is created once during startup and shared process-wide through
//! [`crate::state::AppState`]. Transaction-scoped work (the current-cycle
//! flip) checks a connection out of this pool for the whole unit of work.
//!
//! # Panics
//!
//! [`init_db_pool`] panics when `DATABASE_URL` is unset or the database is
//! unreachable.

use sqlx::PgPool;
use std::env;

pub async fn init_db_pool() -> PgPool {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database")
}
