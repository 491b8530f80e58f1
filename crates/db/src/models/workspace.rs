use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Tenant boundary: every habit belongs to exactly one workspace.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateWorkspace {
    pub name: String,
}

impl Workspace {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<Sqlite, Workspace>(
            "SELECT id, name, created_at, updated_at FROM workspaces WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<Sqlite, Workspace>(
            "SELECT id, name, created_at, updated_at FROM workspaces ORDER BY created_at ASC",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateWorkspace,
        workspace_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<Sqlite, Workspace>(
            r#"INSERT INTO workspaces (id, name)
               VALUES ($1, $2)
               RETURNING id, name, created_at, updated_at"#,
        )
        .bind(workspace_id)
        .bind(&data.name)
        .fetch_one(pool)
        .await
    }
}
