//! Routes for habits and their completion records.
//!
//! Completion mutations route through `HabitStatsService` so the cached
//! streak fields on the habit row are never stale relative to the
//! completion set.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get},
};
use db::models::{
    habit::{CreateHabit, Habit, UpdateHabit},
    habit_completion::{CreateHabitCompletion, HabitCompletion},
    workspace::Workspace,
};
use services::services::{habit_stats::HabitStatsService, streak::StreakStats};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// List the active habits of a workspace, cached stats included.
pub async fn list_habits(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Habit>>>, ApiError> {
    let habits = Habit::find_by_workspace_id(&state.db().pool, workspace_id).await?;
    Ok(ResponseJson(ApiResponse::success(habits)))
}

pub async fn create_habit(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    axum::Json(payload): axum::Json<CreateHabit>,
) -> Result<ResponseJson<ApiResponse<Habit>>, ApiError> {
    Workspace::find_by_id(&state.db().pool, workspace_id)
        .await?
        .ok_or(ApiError::NotFound("workspace"))?;

    let habit = Habit::create(&state.db().pool, workspace_id, &payload, Uuid::new_v4()).await?;

    tracing::info!(habit_id = %habit.id, workspace_id = %workspace_id, "created habit");

    Ok(ResponseJson(ApiResponse::success(habit)))
}

pub async fn get_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Habit>>, ApiError> {
    let habit = Habit::find_by_id(&state.db().pool, habit_id)
        .await?
        .ok_or(ApiError::NotFound("habit"))?;
    Ok(ResponseJson(ApiResponse::success(habit)))
}

/// Update habit metadata. Absent fields keep their current values.
pub async fn update_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateHabit>,
) -> Result<ResponseJson<ApiResponse<Habit>>, ApiError> {
    let existing = Habit::find_by_id(&state.db().pool, habit_id)
        .await?
        .ok_or(ApiError::NotFound("habit"))?;

    let habit = Habit::update(
        &state.db().pool,
        habit_id,
        payload.title.unwrap_or(existing.title),
        payload.category.or(existing.category),
        payload.frequency.unwrap_or(existing.frequency),
    )
    .await?;

    Ok(ResponseJson(ApiResponse::success(habit)))
}

/// Archive a habit (soft delete). Completion history is kept.
pub async fn delete_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let archived = Habit::archive(&state.db().pool, habit_id).await?;
    if archived == 0 {
        return Err(ApiError::NotFound("habit"));
    }

    tracing::info!(habit_id = %habit_id, "archived habit");

    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn list_completions(
    State(state): State<AppState>,
    Path(habit_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<HabitCompletion>>>, ApiError> {
    Habit::find_by_id(&state.db().pool, habit_id)
        .await?
        .ok_or(ApiError::NotFound("habit"))?;

    let completions = HabitCompletion::find_by_habit_id(&state.db().pool, habit_id).await?;
    Ok(ResponseJson(ApiResponse::success(completions)))
}

/// Mark the habit done: insert a completion and refresh the cached stats
/// in one transaction.
pub async fn record_completion(
    State(state): State<AppState>,
    Path(habit_id): Path<Uuid>,
    axum::Json(payload): axum::Json<CreateHabitCompletion>,
) -> Result<ResponseJson<ApiResponse<HabitCompletion>>, ApiError> {
    let completion =
        HabitStatsService::record_completion(&state.db().pool, habit_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(completion)))
}

/// Undo a completion. Returns the recomputed stats triple.
pub async fn remove_completion(
    State(state): State<AppState>,
    Path((habit_id, completion_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<StreakStats>>, ApiError> {
    let stats =
        HabitStatsService::remove_completion(&state.db().pool, habit_id, completion_id).await?;
    Ok(ResponseJson(ApiResponse::success(stats)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/workspaces/{workspace_id}/habits",
            get(list_habits).post(create_habit),
        )
        .route(
            "/habits/{habit_id}",
            get(get_habit).put(update_habit).delete(delete_habit),
        )
        .route(
            "/habits/{habit_id}/completions",
            get(list_completions).post(record_completion),
        )
        .route(
            "/habits/{habit_id}/completions/{completion_id}",
            delete(remove_completion),
        )
}
