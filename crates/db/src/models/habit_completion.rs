use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// One recorded instance of performing a habit. Several completions may land
/// on the same calendar day (count-based habits incremented repeatedly); the
/// streak calculator collapses them to one day, the total does not.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct HabitCompletion {
    pub id: Uuid,
    pub habit_id: Uuid, // Foreign key to Habit
    pub completed_at: DateTime<Utc>,
    pub count: i64, // Multiplier for sub-daily targets; irrelevant to streaks
    pub note: Option<String>,
    pub mood: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateHabitCompletion {
    pub completed_at: Option<DateTime<Utc>>,
    pub count: Option<i64>,
    pub note: Option<String>,
    pub mood: Option<String>,
}

impl HabitCompletion {
    pub async fn create<'e, E>(
        executor: E,
        habit_id: Uuid,
        data: &CreateHabitCompletion,
        completion_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let completed_at = data.completed_at.unwrap_or(now);
        let count = data.count.unwrap_or(1);
        sqlx::query_as::<Sqlite, HabitCompletion>(
            r#"INSERT INTO habit_completions (id, habit_id, completed_at, count, note, mood)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, habit_id, completed_at, count, note, mood, created_at"#,
        )
        .bind(completion_id)
        .bind(habit_id)
        .bind(completed_at)
        .bind(count)
        .bind(&data.note)
        .bind(&data.mood)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_habit_id(
        pool: &SqlitePool,
        habit_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<Sqlite, HabitCompletion>(
            r#"SELECT id, habit_id, completed_at, count, note, mood, created_at
               FROM habit_completions
               WHERE habit_id = $1
               ORDER BY completed_at DESC"#,
        )
        .bind(habit_id)
        .fetch_all(pool)
        .await
    }

    /// Every completion instant for the habit, unordered and unpaginated.
    /// The streak calculator sorts internally.
    pub async fn list_timestamps<'e, E>(
        executor: E,
        habit_id: Uuid,
    ) -> Result<Vec<DateTime<Utc>>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar::<Sqlite, DateTime<Utc>>(
            "SELECT completed_at FROM habit_completions WHERE habit_id = $1",
        )
        .bind(habit_id)
        .fetch_all(executor)
        .await
    }

    /// Hard delete, scoped to the owning habit. Executor-generic so the undo
    /// path can pair it with the stats rewrite in one transaction.
    pub async fn delete<'e, E>(executor: E, habit_id: Uuid, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM habit_completions WHERE id = $1 AND habit_id = $2")
            .bind(id)
            .bind(habit_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
