//! Run records, rankings, and their database store.
//!
//! A run is one timed attempt with an optional video. Run dates are stored
//! as RFC 3339 text, which also sorts chronologically.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::warn;

use crate::db::DbPool;
use crate::sql;

/// A recorded run, joined with the submitting user's name.
#[derive(Debug, Clone)]
pub struct Run {
    pub run_id: i64,
    pub user_id: i64,
    pub username: String,
    pub description: String,
    pub time_seconds: f64,
    pub run_date: DateTime<Utc>,
    pub has_video: bool,
}

/// One leaderboard row: run count first, best time as the tie-breaker.
#[derive(Debug, Clone)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub username: String,
    pub runs_count: i64,
    pub best_time: f64,
}

/// Database-backed storage for runs.
pub struct RunStore {
    pool: DbPool,
}

impl RunStore {
    /// Create a new RunStore using the given database pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Record a run, stamped with the current time. Returns the run id.
    pub async fn create(
        &self,
        user_id: i64,
        description: &str,
        time_seconds: f64,
        video: Option<(Vec<u8>, String)>,
    ) -> Result<i64> {
        let (video_data, video_mime) = match video {
            Some((data, mime)) => (Some(data), Some(mime)),
            None => (None, None),
        };

        let row = sqlx::query(sql::INSERT_RUN)
            .bind(user_id)
            .bind(description)
            .bind(time_seconds)
            .bind(Utc::now().to_rfc3339())
            .bind(video_data)
            .bind(video_mime)
            .fetch_one(&self.pool)
            .await
            .context("Failed to insert run")?;

        Ok(row.get("run_id"))
    }

    /// Get a run by id.
    pub async fn get(&self, run_id: i64) -> Result<Option<Run>> {
        let row = sqlx::query(sql::SELECT_RUN)
            .bind(run_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query run")?;

        let run = match row {
            Some(row) => Some(Run {
                run_id: row.get("run_id"),
                user_id: row.get("user_id"),
                username: row.get("username"),
                description: row.get("description"),
                time_seconds: row.get("time_seconds"),
                run_date: DateTime::parse_from_rfc3339(row.get("run_date"))
                    .context("Invalid run_date timestamp")?
                    .with_timezone(&Utc),
                has_video: row.get("has_video"),
            }),
            None => None,
        };

        Ok(run)
    }

    /// List every run, newest first.
    pub async fn all(&self) -> Result<Vec<Run>> {
        let rows = sqlx::query(sql::SELECT_ALL_RUNS)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list runs")?;

        Ok(rows.into_iter().filter_map(row_to_run).collect())
    }

    /// List one user's runs, newest first.
    pub async fn for_user(&self, user_id: i64) -> Result<Vec<Run>> {
        let rows = sqlx::query(sql::SELECT_RUNS_FOR_USER)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list runs for user")?;

        Ok(rows.into_iter().filter_map(row_to_run).collect())
    }

    /// Edit a run's description and time.
    ///
    /// Returns false if the run does not exist.
    pub async fn update(&self, run_id: i64, description: &str, time_seconds: f64) -> Result<bool> {
        let result = sqlx::query(sql::UPDATE_RUN)
            .bind(description)
            .bind(time_seconds)
            .bind(run_id)
            .execute(&self.pool)
            .await
            .context("Failed to update run")?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a run.
    pub async fn delete(&self, run_id: i64) -> Result<bool> {
        let result = sqlx::query(sql::DELETE_RUN)
            .bind(run_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete run")?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetch a run's video bytes and MIME type, if one was uploaded.
    pub async fn video(&self, run_id: i64) -> Result<Option<(Vec<u8>, String)>> {
        let row = sqlx::query(sql::SELECT_VIDEO)
            .bind(run_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query video")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let data: Option<Vec<u8>> = row.get("video_data");
        let mime: Option<String> = row.get("video_mime");

        Ok(data.map(|data| (data, mime.unwrap_or_else(|| "video/mp4".to_string()))))
    }

    /// Count all runs.
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query(sql::COUNT_RUNS)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count runs")?;

        Ok(row.get("n"))
    }

    /// Rank users by run count, then by best time. Users without runs do
    /// not appear.
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        let rows = sqlx::query(sql::LEADERBOARD)
            .fetch_all(&self.pool)
            .await
            .context("Failed to compute leaderboard")?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                Some(LeaderboardEntry {
                    user_id: row.try_get("user_id").ok()?,
                    username: row.try_get("username").ok()?,
                    runs_count: row.try_get("runs_count").ok()?,
                    best_time: row.try_get("best_time").ok()?,
                })
            })
            .collect())
    }
}

/// Convert a database row to a Run, dropping rows with bad timestamps.
fn row_to_run(row: crate::db::DbRow) -> Option<Run> {
    let run_id: i64 = row.try_get("run_id").ok()?;
    let run_date_str: String = row.try_get("run_date").ok()?;

    let run_date = match DateTime::parse_from_rfc3339(&run_date_str) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(e) => {
            warn!("Failed to parse run_date for run {}: {}", run_id, e);
            return None;
        }
    };

    Some(Run {
        run_id,
        user_id: row.try_get("user_id").ok()?,
        username: row.try_get("username").ok()?,
        description: row.try_get("description").ok()?,
        time_seconds: row.try_get("time_seconds").ok()?,
        run_date,
        has_video: row.try_get("has_video").ok()?,
    })
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::Database;
    use crate::users::UserStore;
    use tempfile::TempDir;

    async fn test_stores() -> (TempDir, UserStore, RunStore) {
        let temp = TempDir::new().unwrap();
        let db = Database::new(&DatabaseConfig::default(), temp.path())
            .await
            .unwrap();
        (temp, UserStore::new(db.pool()), RunStore::new(db.pool()))
    }

    #[tokio::test]
    async fn create_and_get() {
        let (_temp, users, runs) = test_stores().await;

        let user_id = users.ensure("Dash").await.unwrap();
        let run_id = runs
            .create(user_id, "first try", 42.5, Some((vec![1, 2, 3], "video/mp4".into())))
            .await
            .unwrap();

        let run = runs.get(run_id).await.unwrap().unwrap();
        assert_eq!(run.user_id, user_id);
        assert_eq!(run.username, "Dash");
        assert_eq!(run.description, "first try");
        assert_eq!(run.time_seconds, 42.5);
        assert!(run.has_video);

        assert!(runs.get(run_id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let (_temp, users, runs) = test_stores().await;

        let user_id = users.ensure("pacer").await.unwrap();
        let first = runs.create(user_id, "one", 10.0, None).await.unwrap();
        let second = runs.create(user_id, "two", 11.0, None).await.unwrap();
        let third = runs.create(user_id, "three", 12.0, None).await.unwrap();

        let ids: Vec<i64> = runs.all().await.unwrap().iter().map(|r| r.run_id).collect();
        assert_eq!(ids, vec![third, second, first]);

        let mine = runs.for_user(user_id).await.unwrap();
        assert_eq!(mine.len(), 3);
        assert_eq!(runs.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn update_and_delete() {
        let (_temp, users, runs) = test_stores().await;

        let user_id = users.ensure("editor").await.unwrap();
        let run_id = runs.create(user_id, "typo'd", 99.0, None).await.unwrap();

        assert!(runs.update(run_id, "fixed", 98.5).await.unwrap());
        let run = runs.get(run_id).await.unwrap().unwrap();
        assert_eq!(run.description, "fixed");
        assert_eq!(run.time_seconds, 98.5);

        assert!(runs.delete(run_id).await.unwrap());
        assert!(runs.get(run_id).await.unwrap().is_none());
        assert!(!runs.delete(run_id).await.unwrap());
    }

    #[tokio::test]
    async fn video_roundtrip() {
        let (_temp, users, runs) = test_stores().await;

        let user_id = users.ensure("filmer").await.unwrap();
        let with_video = runs
            .create(user_id, "", 5.0, Some((b"fakemp4".to_vec(), "video/webm".into())))
            .await
            .unwrap();
        let without_video = runs.create(user_id, "", 6.0, None).await.unwrap();

        let (data, mime) = runs.video(with_video).await.unwrap().unwrap();
        assert_eq!(data, b"fakemp4");
        assert_eq!(mime, "video/webm");

        assert!(runs.video(without_video).await.unwrap().is_none());
        assert!(runs.video(98765).await.unwrap().is_none());

        assert!(!runs.get(without_video).await.unwrap().unwrap().has_video);
    }

    #[tokio::test]
    async fn leaderboard_ranks_by_count_then_best_time() {
        let (_temp, users, runs) = test_stores().await;

        // busy: three runs, best 12.0
        let busy = users.ensure("busy").await.unwrap();
        for t in [14.0, 12.0, 13.0] {
            runs.create(busy, "", t, None).await.unwrap();
        }
        // quick: one excellent run
        let quick = users.ensure("quick").await.unwrap();
        runs.create(quick, "", 5.0, None).await.unwrap();
        // steady: three runs, best 11.0 (same count as busy, better time)
        let steady = users.ensure("steady").await.unwrap();
        for t in [11.0, 15.0, 16.0] {
            runs.create(steady, "", t, None).await.unwrap();
        }
        // lurker: registered but never ran
        users.ensure("lurker").await.unwrap();

        let board = runs.leaderboard().await.unwrap();
        let names: Vec<&str> = board.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, vec!["steady", "busy", "quick"]);
        assert_eq!(board[0].runs_count, 3);
        assert_eq!(board[0].best_time, 11.0);
        assert_eq!(board[2].runs_count, 1);
    }

    #[tokio::test]
    async fn deleting_a_user_removes_their_runs() {
        let (_temp, users, runs) = test_stores().await;

        let user_id = users.ensure("goner").await.unwrap();
        runs.create(user_id, "", 7.0, None).await.unwrap();
        runs.create(user_id, "", 8.0, None).await.unwrap();

        let keeper = users.ensure("keeper").await.unwrap();
        let kept = runs.create(keeper, "", 9.0, None).await.unwrap();

        assert!(users.delete(user_id).await.unwrap());
        assert!(runs.for_user(user_id).await.unwrap().is_empty());
        assert_eq!(runs.count().await.unwrap(), 1);
        assert!(runs.get(kept).await.unwrap().is_some());
    }
}
