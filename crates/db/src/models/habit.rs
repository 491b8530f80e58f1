use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// How often the habit is meant to be performed. Streak math is day-granular
/// regardless; the frequency only drives front-end presentation and targets.
#[derive(
    Debug, Clone, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "habit_frequency", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HabitFrequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

/// A tracked habit. `streak_count`, `longest_streak`, and `total_completions`
/// are a materialized view over the habit's completion set: always rewritten
/// in full by the stats service, never a source of truth on their own.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Habit {
    pub id: Uuid,
    pub workspace_id: Uuid, // Foreign key to Workspace
    pub user_id: Uuid,      // Owning user; identity is issued by the auth layer
    pub title: String,
    pub category: Option<String>,
    pub frequency: HabitFrequency,
    pub streak_count: i64,
    pub longest_streak: i64,
    pub total_completions: i64,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateHabit {
    pub user_id: Uuid,
    pub title: String,
    pub category: Option<String>,
    pub frequency: Option<HabitFrequency>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct UpdateHabit {
    pub title: Option<String>,
    pub category: Option<String>,
    pub frequency: Option<HabitFrequency>,
}

const HABIT_COLUMNS: &str = "id, workspace_id, user_id, title, category, frequency, \
     streak_count, longest_streak, total_completions, archived, created_at, updated_at";

impl Habit {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<Sqlite, Habit>(&format!(
            "SELECT {HABIT_COLUMNS} FROM habits WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Active (non-archived) habits of a workspace, cached stats included,
    /// so the board view renders without touching the completions table.
    pub async fn find_by_workspace_id(
        pool: &SqlitePool,
        workspace_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<Sqlite, Habit>(&format!(
            "SELECT {HABIT_COLUMNS} FROM habits
             WHERE workspace_id = $1 AND archived = 0
             ORDER BY created_at ASC"
        ))
        .bind(workspace_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        workspace_id: Uuid,
        data: &CreateHabit,
        habit_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let frequency = data.frequency.clone().unwrap_or_default();
        sqlx::query_as::<Sqlite, Habit>(&format!(
            "INSERT INTO habits (id, workspace_id, user_id, title, category, frequency)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {HABIT_COLUMNS}"
        ))
        .bind(habit_id)
        .bind(workspace_id)
        .bind(data.user_id)
        .bind(&data.title)
        .bind(&data.category)
        .bind(frequency)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        title: String,
        category: Option<String>,
        frequency: HabitFrequency,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<Sqlite, Habit>(&format!(
            "UPDATE habits
             SET title = $2, category = $3, frequency = $4, updated_at = CURRENT_TIMESTAMP
             WHERE id = $1
             RETURNING {HABIT_COLUMNS}"
        ))
        .bind(id)
        .bind(title)
        .bind(category)
        .bind(frequency)
        .fetch_one(pool)
        .await
    }

    /// Overwrite the three derived stats fields in full. Executor-generic so
    /// the stats service can pair it with a completion write in one
    /// transaction.
    pub async fn update_stats<'e, E>(
        executor: E,
        id: Uuid,
        streak_count: i64,
        longest_streak: i64,
        total_completions: i64,
    ) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE habits
             SET streak_count = $2, longest_streak = $3, total_completions = $4,
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = $1",
        )
        .bind(id)
        .bind(streak_count)
        .bind(longest_streak)
        .bind(total_completions)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Soft delete: archived habits drop out of workspace listings but keep
    /// their completion history.
    pub async fn archive(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE habits SET archived = 1, updated_at = CURRENT_TIMESTAMP WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Cheap existence probe used inside completion transactions.
    pub async fn exists<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let found: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM habits WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(found.is_some())
    }
}
