//! Public route handlers: pages, run uploads, and media streaming.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
};

use crate::error::AppError;
use crate::state::AppState;
use crate::templates::{
    render, HistoryTemplate, IndexTemplate, LeaderboardTemplate, MeterTemplate, ProfileTemplate,
    RankedEntry, RunView, UploadTemplate,
};

/// Front page: progress toward the site-wide run goal.
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let total_runs = state.runs.count().await?;
    let goal = state.config.site.run_goal;
    let progress_pct = (total_runs * 100 / goal.max(1)).min(100);

    Ok(render(IndexTemplate {
        total_runs,
        goal,
        progress_pct,
    }))
}

/// Leaderboard page: users ranked by run count, then best time.
pub async fn leaderboard(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let entries: Vec<RankedEntry> = state
        .runs
        .leaderboard()
        .await?
        .into_iter()
        .enumerate()
        .map(|(i, entry)| RankedEntry {
            rank: i + 1,
            user_id: entry.user_id,
            username: entry.username,
            runs_count: entry.runs_count,
            best_time: format!("{:.2}", entry.best_time),
        })
        .collect();

    Ok(render(LeaderboardTemplate { entries }))
}

/// History page: every run, newest first.
pub async fn history(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let runs: Vec<RunView> = state
        .runs
        .all()
        .await?
        .into_iter()
        .map(RunView::from)
        .collect();

    Ok(render(HistoryTemplate { runs }))
}

/// Profile page: one user and their runs.
pub async fn profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    let user = state
        .users
        .get(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;
    let runs: Vec<RunView> = state
        .runs
        .for_user(user_id)
        .await?
        .into_iter()
        .map(RunView::from)
        .collect();

    Ok(render(ProfileTemplate {
        user_id: user.user_id,
        username: user.username,
        has_avatar: user.has_avatar,
        runs,
    }))
}

/// Single-run page with the embedded video player.
pub async fn meter(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<i64>,
) -> Result<Response, AppError> {
    let run = state
        .runs
        .get(run_id)
        .await?
        .ok_or(AppError::NotFound("Meter not found"))?;

    Ok(render(MeterTemplate {
        run: RunView::from(run),
    }))
}

/// Upload form page, with known usernames for the datalist.
pub async fn upload_form(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let usernames: Vec<String> = state
        .users
        .list()
        .await?
        .into_iter()
        .map(|u| u.username)
        .collect();

    Ok(render(UploadTemplate { usernames }))
}

/// Upload form submission: multipart with `username`, `description`,
/// `time_seconds`, and a `video` file. Unknown usernames are created on
/// the spot (case-insensitively matched to existing ones).
pub async fn upload_submit(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut username = String::new();
    let mut description = String::new();
    let mut time_raw = String::new();
    let mut video: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("username") => username = field.text().await?.trim().to_string(),
            Some("description") => description = field.text().await?.trim().to_string(),
            Some("time_seconds") => time_raw = field.text().await?.trim().to_string(),
            Some("video") => {
                let mime = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "video/mp4".to_string());
                let data = field.bytes().await?;
                if !data.is_empty() {
                    video = Some((data.to_vec(), mime));
                }
            }
            _ => {}
        }
    }

    let Some(video) = video else {
        return Err(AppError::BadRequest("Missing fields".to_string()));
    };
    if username.is_empty() || time_raw.is_empty() {
        return Err(AppError::BadRequest("Missing fields".to_string()));
    }

    let time_seconds = match time_raw.parse::<f64>() {
        Ok(t) if t.is_finite() && t > 0.0 => t,
        _ => {
            return Err(AppError::BadRequest(
                "Time must be a positive number of seconds".to_string(),
            ));
        }
    };

    let user_id = state.users.ensure(&username).await?;
    state
        .runs
        .create(user_id, &description, time_seconds, Some(video))
        .await?;

    Ok(Redirect::to("/").into_response())
}

/// Stream a run's video inline.
pub async fn video(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<i64>,
) -> Result<Response, AppError> {
    let Some((data, mime)) = state.runs.video(run_id).await? else {
        return Err(AppError::NotFound("Video not found"));
    };

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime)
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"run_{run_id}.mp4\""),
        )
        .body(Body::from(data))
        .context("Failed to build video response")?)
}

/// Serve a user's avatar image.
pub async fn avatar(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    let Some((data, mime)) = state.users.avatar(user_id).await? else {
        return Err(AppError::NotFound("Avatar not found"));
    };

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime)
        .body(Body::from(data))
        .context("Failed to build avatar response")?)
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::config::{Config, DatabaseConfig};
    use crate::credentials::AdminCredentials;
    use crate::db::Database;
    use tempfile::TempDir;

    async fn test_state() -> (TempDir, Arc<AppState>) {
        let temp = TempDir::new().unwrap();
        let db = Database::new(&DatabaseConfig::default(), temp.path())
            .await
            .unwrap();
        let credentials = AdminCredentials::generate("hunter2").unwrap();
        (temp, AppState::new(Config::default(), db.pool(), credentials))
    }

    #[tokio::test]
    async fn video_is_served_with_its_recorded_mime() {
        let (_temp, state) = test_state().await;

        let user_id = state.users.ensure("filmer").await.unwrap();
        let run_id = state
            .runs
            .create(user_id, "", 12.0, Some((vec![1, 2, 3], "video/webm".into())))
            .await
            .unwrap();

        let response = video(State(Arc::clone(&state)), Path(run_id))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "video/webm"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            &format!("inline; filename=\"run_{run_id}.mp4\"")
        );

        let missing = video(State(state), Path(run_id + 1)).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn malformed_stored_mime_is_an_error_not_a_panic() {
        let (_temp, state) = test_state().await;

        let user_id = state.users.ensure("mallory").await.unwrap();
        let run_id = state
            .runs
            .create(
                user_id,
                "",
                9.0,
                Some((vec![1], "video/mp4\r\nX-Sneaky: 1".into())),
            )
            .await
            .unwrap();
        assert!(video(State(Arc::clone(&state)), Path(run_id)).await.is_err());

        assert!(state
            .users
            .set_avatar(user_id, vec![2], "image/png\nX-Sneaky: 1")
            .await
            .unwrap());
        assert!(avatar(State(state), Path(user_id)).await.is_err());
    }
}
