//! Keeps the cached stats fields on a habit in sync with its completion set.
//!
//! Every completion insert or delete goes through here so the habit row and
//! the completion table change in one transaction. Stats are always rebuilt
//! from the full history, never patched incrementally; a concurrent
//! recomputation racing on the same habit is last-write-wins and self-heals
//! on the next completion change.

use chrono::Utc;
use db::models::{
    habit::Habit,
    habit_completion::{CreateHabitCompletion, HabitCompletion},
};
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::streak::{StreakStats, compute_streaks};

#[derive(Debug, Error)]
pub enum HabitStatsError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("habit {0} not found")]
    HabitNotFound(Uuid),
    #[error("completion {0} not found")]
    CompletionNotFound(Uuid),
}

pub struct HabitStatsService;

impl HabitStatsService {
    /// Record one completion and refresh the habit's cached stats. Both
    /// writes commit together or not at all.
    pub async fn record_completion(
        pool: &SqlitePool,
        habit_id: Uuid,
        data: &CreateHabitCompletion,
    ) -> Result<HabitCompletion, HabitStatsError> {
        let mut tx = pool.begin().await?;

        if !Habit::exists(&mut *tx, habit_id).await? {
            return Err(HabitStatsError::HabitNotFound(habit_id));
        }

        let completion =
            HabitCompletion::create(&mut *tx, habit_id, data, Uuid::new_v4(), Utc::now()).await?;
        let stats = Self::recompute_stats(&mut tx, habit_id).await?;

        tx.commit().await?;

        debug!(
            habit_id = %habit_id,
            completion_id = %completion.id,
            current_streak = stats.current_streak,
            "recorded habit completion"
        );

        Ok(completion)
    }

    /// Undo a completion (hard delete) and refresh the habit's cached stats.
    pub async fn remove_completion(
        pool: &SqlitePool,
        habit_id: Uuid,
        completion_id: Uuid,
    ) -> Result<StreakStats, HabitStatsError> {
        let mut tx = pool.begin().await?;

        if !Habit::exists(&mut *tx, habit_id).await? {
            return Err(HabitStatsError::HabitNotFound(habit_id));
        }

        let deleted = HabitCompletion::delete(&mut *tx, habit_id, completion_id).await?;
        if deleted == 0 {
            return Err(HabitStatsError::CompletionNotFound(completion_id));
        }

        let stats = Self::recompute_stats(&mut tx, habit_id).await?;

        tx.commit().await?;

        debug!(
            habit_id = %habit_id,
            completion_id = %completion_id,
            current_streak = stats.current_streak,
            "removed habit completion"
        );

        Ok(stats)
    }

    /// Reload the habit's full completion history, run the streak
    /// calculator with `today` bound to the current UTC date, and overwrite
    /// the three stats fields. Idempotent: repeating it without an
    /// intervening completion change writes the same values.
    pub async fn recompute_stats(
        conn: &mut SqliteConnection,
        habit_id: Uuid,
    ) -> Result<StreakStats, HabitStatsError> {
        let timestamps = HabitCompletion::list_timestamps(&mut *conn, habit_id).await?;
        let stats = compute_streaks(&timestamps, Utc::now().date_naive());

        let updated = Habit::update_stats(
            &mut *conn,
            habit_id,
            stats.current_streak,
            stats.longest_streak,
            stats.total_completions,
        )
        .await?;
        if updated == 0 {
            return Err(HabitStatsError::HabitNotFound(habit_id));
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use db::{
        DBService,
        models::{
            habit::{CreateHabit, Habit},
            workspace::{CreateWorkspace, Workspace},
        },
    };

    use super::*;

    async fn seeded_habit() -> (DBService, Habit) {
        let db = DBService::new_in_memory().await.unwrap();
        let workspace = Workspace::create(
            &db.pool,
            &CreateWorkspace {
                name: "personal".to_string(),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        let habit = Habit::create(
            &db.pool,
            workspace.id,
            &CreateHabit {
                user_id: Uuid::new_v4(),
                title: "morning run".to_string(),
                category: None,
                frequency: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        (db, habit)
    }

    fn completion_at(ts: DateTime<Utc>) -> CreateHabitCompletion {
        CreateHabitCompletion {
            completed_at: Some(ts),
            count: None,
            note: None,
            mood: None,
        }
    }

    async fn stats_of(db: &DBService, habit_id: Uuid) -> (i64, i64, i64) {
        let habit = Habit::find_by_id(&db.pool, habit_id).await.unwrap().unwrap();
        (
            habit.streak_count,
            habit.longest_streak,
            habit.total_completions,
        )
    }

    #[tokio::test]
    async fn new_habit_starts_with_zeroed_stats() {
        let (db, habit) = seeded_habit().await;
        assert_eq!(stats_of(&db, habit.id).await, (0, 0, 0));
    }

    #[tokio::test]
    async fn recording_completions_updates_cached_stats() {
        let (db, habit) = seeded_habit().await;
        let now = Utc::now();

        HabitStatsService::record_completion(&db.pool, habit.id, &completion_at(now))
            .await
            .unwrap();
        HabitStatsService::record_completion(
            &db.pool,
            habit.id,
            &completion_at(now - Duration::days(1)),
        )
        .await
        .unwrap();

        assert_eq!(stats_of(&db, habit.id).await, (2, 2, 2));
    }

    #[tokio::test]
    async fn same_day_completions_count_once_for_streaks() {
        let (db, habit) = seeded_habit().await;
        let now = Utc::now();

        for _ in 0..3 {
            HabitStatsService::record_completion(&db.pool, habit.id, &completion_at(now))
                .await
                .unwrap();
        }

        assert_eq!(stats_of(&db, habit.id).await, (1, 1, 3));
    }

    #[tokio::test]
    async fn completion_count_multiplier_does_not_affect_totals() {
        let (db, habit) = seeded_habit().await;
        let data = CreateHabitCompletion {
            completed_at: Some(Utc::now()),
            count: Some(5),
            note: Some("five sets".to_string()),
            mood: None,
        };

        let completion = HabitStatsService::record_completion(&db.pool, habit.id, &data)
            .await
            .unwrap();

        assert_eq!(completion.count, 5);
        // total_completions counts records, not multipliers.
        assert_eq!(stats_of(&db, habit.id).await, (1, 1, 1));
    }

    #[tokio::test]
    async fn gap_breaks_current_streak_but_not_longest() {
        let (db, habit) = seeded_habit().await;
        let now = Utc::now();

        for offset in [5, 6, 7] {
            HabitStatsService::record_completion(
                &db.pool,
                habit.id,
                &completion_at(now - Duration::days(offset)),
            )
            .await
            .unwrap();
        }

        assert_eq!(stats_of(&db, habit.id).await, (0, 3, 3));
    }

    #[tokio::test]
    async fn recomputation_is_idempotent() {
        let (db, habit) = seeded_habit().await;
        HabitStatsService::record_completion(&db.pool, habit.id, &completion_at(Utc::now()))
            .await
            .unwrap();

        let mut conn = db.pool.acquire().await.unwrap();
        let first = HabitStatsService::recompute_stats(&mut conn, habit.id)
            .await
            .unwrap();
        let second = HabitStatsService::recompute_stats(&mut conn, habit.id)
            .await
            .unwrap();
        drop(conn);

        assert_eq!(first, second);
        assert_eq!(stats_of(&db, habit.id).await, (1, 1, 1));
    }

    #[tokio::test]
    async fn deleting_a_completion_restores_previous_stats() {
        let (db, habit) = seeded_habit().await;
        let now = Utc::now();

        HabitStatsService::record_completion(&db.pool, habit.id, &completion_at(now))
            .await
            .unwrap();
        let before = stats_of(&db, habit.id).await;

        let extra = HabitStatsService::record_completion(
            &db.pool,
            habit.id,
            &completion_at(now - Duration::days(1)),
        )
        .await
        .unwrap();
        assert_ne!(stats_of(&db, habit.id).await, before);

        HabitStatsService::remove_completion(&db.pool, habit.id, extra.id)
            .await
            .unwrap();
        assert_eq!(stats_of(&db, habit.id).await, before);
    }

    #[tokio::test]
    async fn recording_against_missing_habit_fails() {
        let (db, _habit) = seeded_habit().await;
        let err =
            HabitStatsService::record_completion(&db.pool, Uuid::new_v4(), &completion_at(Utc::now()))
                .await
                .unwrap_err();
        assert!(matches!(err, HabitStatsError::HabitNotFound(_)));
    }

    #[tokio::test]
    async fn removing_missing_completion_fails_and_changes_nothing() {
        let (db, habit) = seeded_habit().await;
        HabitStatsService::record_completion(&db.pool, habit.id, &completion_at(Utc::now()))
            .await
            .unwrap();
        let before = stats_of(&db, habit.id).await;

        let err = HabitStatsService::remove_completion(&db.pool, habit.id, Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, HabitStatsError::CompletionNotFound(_)));
        assert_eq!(stats_of(&db, habit.id).await, before);
    }

    #[tokio::test]
    async fn completion_scoped_to_owning_habit_on_delete() {
        let (db, habit) = seeded_habit().await;
        let other = Habit::create(
            &db.pool,
            habit.workspace_id,
            &CreateHabit {
                user_id: habit.user_id,
                title: "read".to_string(),
                category: None,
                frequency: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let completion =
            HabitStatsService::record_completion(&db.pool, habit.id, &completion_at(Utc::now()))
                .await
                .unwrap();

        // Deleting through the wrong habit must not touch the record.
        let err = HabitStatsService::remove_completion(&db.pool, other.id, completion.id)
            .await
            .unwrap_err();
        assert!(matches!(err, HabitStatsError::CompletionNotFound(_)));
        assert_eq!(stats_of(&db, habit.id).await, (1, 1, 1));
    }
}
