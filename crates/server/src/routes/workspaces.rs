//! Routes for workspaces (tenant containers for habits).

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::workspace::{CreateWorkspace, Workspace};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

pub async fn list_workspaces(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Workspace>>>, ApiError> {
    let workspaces = Workspace::find_all(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(workspaces)))
}

pub async fn get_workspace(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Workspace>>, ApiError> {
    let workspace = Workspace::find_by_id(&state.db().pool, workspace_id)
        .await?
        .ok_or(ApiError::NotFound("workspace"))?;
    Ok(ResponseJson(ApiResponse::success(workspace)))
}

pub async fn create_workspace(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<CreateWorkspace>,
) -> Result<ResponseJson<ApiResponse<Workspace>>, ApiError> {
    let workspace = Workspace::create(&state.db().pool, &payload, Uuid::new_v4()).await?;

    tracing::info!(workspace_id = %workspace.id, "created workspace");

    Ok(ResponseJson(ApiResponse::success(workspace)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/workspaces", get(list_workspaces).post(create_workspace))
        .route("/workspaces/{workspace_id}", get(get_workspace))
}
