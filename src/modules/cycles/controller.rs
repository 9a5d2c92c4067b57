use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::instrument;
use uuid::Uuid;

use practia_core::AppError;

use crate::middleware::auth::{RequireEditCycle, RequireViewCycle};
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{CreateCycleDto, Cycle, UpdateCycleDto};
use super::service::CycleService;

#[instrument(skip(state, _auth))]
pub async fn list_cycles(
    State(state): State<AppState>,
    _auth: RequireViewCycle,
) -> Result<Json<Vec<Cycle>>, AppError> {
    let cycles = CycleService::list_cycles(&state.db).await?;
    Ok(Json(cycles))
}

#[instrument(skip(state, _auth))]
pub async fn get_current_cycle(
    State(state): State<AppState>,
    _auth: RequireViewCycle,
) -> Result<Json<Cycle>, AppError> {
    let cycle = CycleService::find_current(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("No current cycle")))?;
    Ok(Json(cycle))
}

#[instrument(skip(state, _auth))]
pub async fn create_cycle(
    State(state): State<AppState>,
    _auth: RequireEditCycle,
    ValidatedJson(dto): ValidatedJson<CreateCycleDto>,
) -> Result<(StatusCode, Json<Cycle>), AppError> {
    let cycle = CycleService::create_cycle(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(cycle)))
}

#[instrument(skip(state, _auth))]
pub async fn update_cycle(
    State(state): State<AppState>,
    _auth: RequireEditCycle,
    Path(cycle_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateCycleDto>,
) -> Result<Json<Cycle>, AppError> {
    let cycle = CycleService::update_cycle(&state.db, cycle_id, dto).await?;
    Ok(Json(cycle))
}

/// Promote a cycle to current.
#[instrument(skip(state, _auth))]
pub async fn set_current_cycle(
    State(state): State<AppState>,
    _auth: RequireEditCycle,
    Path(cycle_id): Path<Uuid>,
) -> Result<Json<Cycle>, AppError> {
    let cycle = CycleService::set_current(&state.db, cycle_id).await?;
    Ok(Json(cycle))
}
