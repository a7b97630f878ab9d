//! Askama templates for the public pages.

use askama::Template;
use axum::response::{Html, IntoResponse, Response};

use crate::runs::Run;

/// Render a template to an HTML response, degrading to a plain error
/// string if rendering fails.
pub fn render<T: Template>(template: T) -> Response {
    Html(
        template
            .render()
            .unwrap_or_else(|e| format!("Template error: {e}")),
    )
    .into_response()
}

/// Front page with the total-runs progress meter.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub total_runs: i64,
    pub goal: i64,
    pub progress_pct: i64,
}

/// One ranked leaderboard row.
pub struct RankedEntry {
    pub rank: usize,
    pub user_id: i64,
    pub username: String,
    pub runs_count: i64,
    pub best_time: String,
}

/// Leaderboard page template
#[derive(Template)]
#[template(path = "leaderboard.html")]
pub struct LeaderboardTemplate {
    pub entries: Vec<RankedEntry>,
}

/// A run with its fields preformatted for display.
pub struct RunView {
    pub run_id: i64,
    pub user_id: i64,
    pub username: String,
    pub description: String,
    pub time_seconds: String,
    pub run_date: String,
    pub has_video: bool,
}

impl From<Run> for RunView {
    fn from(run: Run) -> Self {
        Self {
            run_id: run.run_id,
            user_id: run.user_id,
            username: run.username,
            description: run.description,
            time_seconds: format!("{:.2}", run.time_seconds),
            run_date: run.run_date.format("%Y-%m-%d %H:%M").to_string(),
            has_video: run.has_video,
        }
    }
}

/// History page template (every run, newest first)
#[derive(Template)]
#[template(path = "history.html")]
pub struct HistoryTemplate {
    pub runs: Vec<RunView>,
}

/// Profile page template
#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub user_id: i64,
    pub username: String,
    pub has_avatar: bool,
    pub runs: Vec<RunView>,
}

/// Single-run page template
#[derive(Template)]
#[template(path = "meter.html")]
pub struct MeterTemplate {
    pub run: RunView,
}

/// Upload form template
#[derive(Template)]
#[template(path = "upload.html")]
pub struct UploadTemplate {
    pub usernames: Vec<String>,
}
