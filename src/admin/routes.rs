//! Admin route handlers.
//!
//! Provides HTTP handlers for the admin UI: login, logout, dashboard, and
//! user/run editing. Every handler checks the session cookie itself and
//! bounces unauthenticated visitors to the login page.

use crate::admin::auth::{AdminSession, SESSION_COOKIE};
use crate::admin::templates::{
    DashboardTemplate, LoginTemplate, RunEditTemplate, UserEditTemplate, UserSummary,
};
use crate::error::AppError;
use crate::state::AppState;
use crate::templates::{render, RunView};
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

/// Build the admin router.
pub fn admin_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/login", get(login_page))
        .route("/login", post(login_submit))
        .route("/logout", post(logout))
        .route("/dashboard", get(dashboard))
        .route("/users/{user_id}", get(user_edit_page))
        .route("/users/{user_id}", post(user_edit_submit))
        .route("/users/{user_id}/avatar", post(avatar_upload))
        .route("/users/{user_id}/avatar/delete", post(avatar_delete))
        .route("/users/{user_id}/delete", post(user_delete))
        .route("/runs/{run_id}", get(run_edit_page))
        .route("/runs/{run_id}", post(run_edit_submit))
        .route("/runs/{run_id}/delete", post(run_delete))
        .with_state(state)
}

/// Check the session cookie and return the session if authenticated.
async fn check_auth(state: &AppState, jar: &CookieJar) -> Option<AdminSession> {
    let session_id = jar.get(SESSION_COOKIE)?.value().to_string();
    state.sessions.validate(&session_id).await
}

/// Login page handler.
async fn login_page(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    // If already logged in, redirect to dashboard
    if check_auth(&state, &jar).await.is_some() {
        return Redirect::to("/admin/dashboard").into_response();
    }

    render(LoginTemplate { error: None })
}

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    password: String,
}

/// Login form submission handler.
async fn login_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Response {
    if form.password.is_empty() || !state.credentials.verify(&form.password) {
        return render(LoginTemplate {
            error: Some("Invalid password".to_string()),
        });
    }

    let session_id = state
        .sessions
        .create(state.config.admin.session_timeout_secs)
        .await;

    // Set session cookie
    let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/admin; HttpOnly; SameSite=Strict");

    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(header::LOCATION, "/admin/dashboard")
        .header(header::SET_COOKIE, cookie)
        .body(axum::body::Body::empty())
        .unwrap()
}

/// Logout handler.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Some(session) = check_auth(&state, &jar).await {
        state.sessions.delete(&session.session_id).await;
    }

    // Clear cookie by setting it to expire in the past
    let cookie = format!("{SESSION_COOKIE}=; Path=/admin; HttpOnly; SameSite=Strict; Max-Age=0");

    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(header::LOCATION, "/admin/login")
        .header(header::SET_COOKIE, cookie)
        .body(axum::body::Body::empty())
        .unwrap()
}

/// Dashboard handler.
async fn dashboard(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    if check_auth(&state, &jar).await.is_none() {
        return Ok(Redirect::to("/admin/login").into_response());
    }

    let total_users = state.users.count().await?;
    let total_runs = state.runs.count().await?;
    let users: Vec<UserSummary> = state
        .users
        .list()
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();
    let runs: Vec<RunView> = state
        .runs
        .all()
        .await?
        .into_iter()
        .map(RunView::from)
        .collect();

    Ok(render(DashboardTemplate {
        total_users,
        total_runs,
        users,
        runs,
    }))
}

/// Render the user edit page, optionally with a form error.
async fn render_user_edit(
    state: &AppState,
    user_id: i64,
    error: Option<String>,
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

    Ok(render(UserEditTemplate {
        user: UserSummary::from(user),
        runs,
        error,
    }))
}

/// User edit page handler.
async fn user_edit_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    if check_auth(&state, &jar).await.is_none() {
        return Ok(Redirect::to("/admin/login").into_response());
    }

    render_user_edit(&state, user_id, None).await
}

/// User edit form data.
#[derive(Deserialize)]
pub struct UserEditForm {
    username: String,
}

/// User rename handler.
async fn user_edit_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(user_id): Path<i64>,
    Form(form): Form<UserEditForm>,
) -> Result<Response, AppError> {
    if check_auth(&state, &jar).await.is_none() {
        return Ok(Redirect::to("/admin/login").into_response());
    }

    let username = form.username.trim();
    if username.is_empty() {
        return render_user_edit(&state, user_id, Some("Username cannot be empty".to_string()))
            .await;
    }

    // A rename onto another user's name would break the unique constraint
    if let Some(existing) = state.users.get_by_username(username).await? {
        if existing.user_id != user_id {
            return render_user_edit(
                &state,
                user_id,
                Some(format!("Username \"{username}\" is already taken")),
            )
            .await;
        }
    }

    if !state.users.rename(user_id, username).await? {
        return Err(AppError::NotFound("User not found"));
    }

    Ok(Redirect::to(&format!("/admin/users/{user_id}")).into_response())
}

/// Avatar upload handler (multipart, single `avatar` file field).
async fn avatar_upload(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(user_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    if check_auth(&state, &jar).await.is_none() {
        return Ok(Redirect::to("/admin/login").into_response());
    }

    let mut upload: Option<(Vec<u8>, String)> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("avatar") {
            let mime = field
                .content_type()
                .map(str::to_string)
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let data = field.bytes().await?;
            if !data.is_empty() {
                upload = Some((data.to_vec(), mime));
            }
        }
    }

    let Some((data, mime)) = upload else {
        return render_user_edit(&state, user_id, Some("No image selected".to_string())).await;
    };

    if !state.users.set_avatar(user_id, data, &mime).await? {
        return Err(AppError::NotFound("User not found"));
    }

    Ok(Redirect::to(&format!("/admin/users/{user_id}")).into_response())
}

/// Avatar removal handler.
async fn avatar_delete(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    if check_auth(&state, &jar).await.is_none() {
        return Ok(Redirect::to("/admin/login").into_response());
    }

    // Clearing an absent avatar is a no-op, not an error
    state.users.clear_avatar(user_id).await?;

    Ok(Redirect::to(&format!("/admin/users/{user_id}")).into_response())
}

/// User delete handler (removes the user's runs as well).
async fn user_delete(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    if check_auth(&state, &jar).await.is_none() {
        return Ok(Redirect::to("/admin/login").into_response());
    }

    if !state.users.delete(user_id).await? {
        return Err(AppError::NotFound("User not found"));
    }

    Ok(Redirect::to("/admin/dashboard").into_response())
}

/// Render the run edit page, optionally with a form error.
async fn render_run_edit(
    state: &AppState,
    run_id: i64,
    error: Option<String>,
) -> Result<Response, AppError> {
    let run = state
        .runs
        .get(run_id)
        .await?
        .ok_or(AppError::NotFound("Run not found"))?;

    Ok(render(RunEditTemplate {
        run: RunView::from(run),
        error,
    }))
}

/// Run edit page handler.
async fn run_edit_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(run_id): Path<i64>,
) -> Result<Response, AppError> {
    if check_auth(&state, &jar).await.is_none() {
        return Ok(Redirect::to("/admin/login").into_response());
    }

    render_run_edit(&state, run_id, None).await
}

/// Run edit form data.
#[derive(Deserialize)]
pub struct RunEditForm {
    description: String,
    time_seconds: String,
}

/// Run edit handler.
async fn run_edit_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(run_id): Path<i64>,
    Form(form): Form<RunEditForm>,
) -> Result<Response, AppError> {
    if check_auth(&state, &jar).await.is_none() {
        return Ok(Redirect::to("/admin/login").into_response());
    }

    let time_seconds = match form.time_seconds.trim().parse::<f64>() {
        Ok(t) if t.is_finite() && t > 0.0 => t,
        _ => {
            return render_run_edit(
                &state,
                run_id,
                Some("Time must be a positive number of seconds".to_string()),
            )
            .await;
        }
    };

    if !state
        .runs
        .update(run_id, form.description.trim(), time_seconds)
        .await?
    {
        return Err(AppError::NotFound("Run not found"));
    }

    Ok(Redirect::to(&format!("/admin/runs/{run_id}")).into_response())
}

/// Run delete handler.
async fn run_delete(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(run_id): Path<i64>,
) -> Result<Response, AppError> {
    if check_auth(&state, &jar).await.is_none() {
        return Ok(Redirect::to("/admin/login").into_response());
    }

    if !state.runs.delete(run_id).await? {
        return Err(AppError::NotFound("Run not found"));
    }

    Ok(Redirect::to("/admin/dashboard").into_response())
}
