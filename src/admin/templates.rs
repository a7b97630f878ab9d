//! Askama templates for the admin UI.

use askama::Template;

use crate::templates::RunView;
use crate::users::User;

/// Login page template
#[derive(Template)]
#[template(path = "admin/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

/// User summary for dashboard and edit views
pub struct UserSummary {
    pub user_id: i64,
    pub username: String,
    pub has_avatar: bool,
    pub created_at: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            has_avatar: user.has_avatar,
            created_at: user.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Dashboard page template
#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub total_users: i64,
    pub total_runs: i64,
    pub users: Vec<UserSummary>,
    pub runs: Vec<RunView>,
}

/// User edit page template
#[derive(Template)]
#[template(path = "admin/user_edit.html")]
pub struct UserEditTemplate {
    pub user: UserSummary,
    pub runs: Vec<RunView>,
    pub error: Option<String>,
}

/// Run edit page template
#[derive(Template)]
#[template(path = "admin/run_edit.html")]
pub struct RunEditTemplate {
    pub run: RunView,
    pub error: Option<String>,
}
