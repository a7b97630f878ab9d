//! SQL query constants with database-specific placeholders.
//!
//! SQLite uses `?` placeholders, PostgreSQL uses `$1, $2, ...` numbered
//! placeholders, so parameterized queries come in cfg-gated pairs with the
//! same bind order. Queries without parameters are shared.

#[cfg(feature = "sqlite")]
pub const ENSURE_USER: &str = r#"
    INSERT INTO users (username, username_lower, created_at)
    VALUES (?, ?, ?)
    ON CONFLICT(username_lower) DO UPDATE SET username = users.username
    RETURNING user_id
"#;

#[cfg(feature = "postgres")]
pub const ENSURE_USER: &str = r#"
    INSERT INTO users (username, username_lower, created_at)
    VALUES ($1, $2, $3)
    ON CONFLICT(username_lower) DO UPDATE SET username = users.username
    RETURNING user_id
"#;

#[cfg(feature = "sqlite")]
pub const SELECT_USER: &str = r#"
    SELECT user_id, username, username_lower, (avatar IS NOT NULL) AS has_avatar, created_at
    FROM users WHERE user_id = ?
"#;

#[cfg(feature = "postgres")]
pub const SELECT_USER: &str = r#"
    SELECT user_id, username, username_lower, (avatar IS NOT NULL) AS has_avatar, created_at
    FROM users WHERE user_id = $1
"#;

#[cfg(feature = "sqlite")]
pub const SELECT_USER_BY_NAME: &str = r#"
    SELECT user_id, username, username_lower, (avatar IS NOT NULL) AS has_avatar, created_at
    FROM users WHERE username_lower = ?
"#;

#[cfg(feature = "postgres")]
pub const SELECT_USER_BY_NAME: &str = r#"
    SELECT user_id, username, username_lower, (avatar IS NOT NULL) AS has_avatar, created_at
    FROM users WHERE username_lower = $1
"#;

pub const SELECT_ALL_USERS: &str = r#"
    SELECT user_id, username, username_lower, (avatar IS NOT NULL) AS has_avatar, created_at
    FROM users ORDER BY username_lower
"#;

pub const COUNT_USERS: &str = "SELECT COUNT(*) AS n FROM users";

#[cfg(feature = "sqlite")]
pub const UPDATE_USERNAME: &str =
    "UPDATE users SET username = ?, username_lower = ? WHERE user_id = ?";

#[cfg(feature = "postgres")]
pub const UPDATE_USERNAME: &str =
    "UPDATE users SET username = $1, username_lower = $2 WHERE user_id = $3";

#[cfg(feature = "sqlite")]
pub const DELETE_USER: &str = "DELETE FROM users WHERE user_id = ?";

#[cfg(feature = "postgres")]
pub const DELETE_USER: &str = "DELETE FROM users WHERE user_id = $1";

#[cfg(feature = "sqlite")]
pub const DELETE_RUNS_FOR_USER: &str = "DELETE FROM runs WHERE user_id = ?";

#[cfg(feature = "postgres")]
pub const DELETE_RUNS_FOR_USER: &str = "DELETE FROM runs WHERE user_id = $1";

#[cfg(feature = "sqlite")]
pub const SET_AVATAR: &str = "UPDATE users SET avatar = ?, avatar_mime = ? WHERE user_id = ?";

#[cfg(feature = "postgres")]
pub const SET_AVATAR: &str = "UPDATE users SET avatar = $1, avatar_mime = $2 WHERE user_id = $3";

#[cfg(feature = "sqlite")]
pub const CLEAR_AVATAR: &str =
    "UPDATE users SET avatar = NULL, avatar_mime = NULL WHERE user_id = ?";

#[cfg(feature = "postgres")]
pub const CLEAR_AVATAR: &str =
    "UPDATE users SET avatar = NULL, avatar_mime = NULL WHERE user_id = $1";

#[cfg(feature = "sqlite")]
pub const SELECT_AVATAR: &str = "SELECT avatar, avatar_mime FROM users WHERE user_id = ?";

#[cfg(feature = "postgres")]
pub const SELECT_AVATAR: &str = "SELECT avatar, avatar_mime FROM users WHERE user_id = $1";

#[cfg(feature = "sqlite")]
pub const INSERT_RUN: &str = r#"
    INSERT INTO runs (user_id, description, time_seconds, run_date, video_data, video_mime)
    VALUES (?, ?, ?, ?, ?, ?)
    RETURNING run_id
"#;

#[cfg(feature = "postgres")]
pub const INSERT_RUN: &str = r#"
    INSERT INTO runs (user_id, description, time_seconds, run_date, video_data, video_mime)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING run_id
"#;

#[cfg(feature = "sqlite")]
pub const SELECT_RUN: &str = r#"
    SELECT r.run_id, r.user_id, u.username, r.description, r.time_seconds, r.run_date,
           (r.video_data IS NOT NULL) AS has_video
    FROM runs r JOIN users u ON u.user_id = r.user_id
    WHERE r.run_id = ?
"#;

#[cfg(feature = "postgres")]
pub const SELECT_RUN: &str = r#"
    SELECT r.run_id, r.user_id, u.username, r.description, r.time_seconds, r.run_date,
           (r.video_data IS NOT NULL) AS has_video
    FROM runs r JOIN users u ON u.user_id = r.user_id
    WHERE r.run_id = $1
"#;

pub const SELECT_ALL_RUNS: &str = r#"
    SELECT r.run_id, r.user_id, u.username, r.description, r.time_seconds, r.run_date,
           (r.video_data IS NOT NULL) AS has_video
    FROM runs r JOIN users u ON u.user_id = r.user_id
    ORDER BY r.run_date DESC
"#;

#[cfg(feature = "sqlite")]
pub const SELECT_RUNS_FOR_USER: &str = r#"
    SELECT r.run_id, r.user_id, u.username, r.description, r.time_seconds, r.run_date,
           (r.video_data IS NOT NULL) AS has_video
    FROM runs r JOIN users u ON u.user_id = r.user_id
    WHERE r.user_id = ?
    ORDER BY r.run_date DESC
"#;

#[cfg(feature = "postgres")]
pub const SELECT_RUNS_FOR_USER: &str = r#"
    SELECT r.run_id, r.user_id, u.username, r.description, r.time_seconds, r.run_date,
           (r.video_data IS NOT NULL) AS has_video
    FROM runs r JOIN users u ON u.user_id = r.user_id
    WHERE r.user_id = $1
    ORDER BY r.run_date DESC
"#;

#[cfg(feature = "sqlite")]
pub const UPDATE_RUN: &str = "UPDATE runs SET description = ?, time_seconds = ? WHERE run_id = ?";

#[cfg(feature = "postgres")]
pub const UPDATE_RUN: &str =
    "UPDATE runs SET description = $1, time_seconds = $2 WHERE run_id = $3";

#[cfg(feature = "sqlite")]
pub const DELETE_RUN: &str = "DELETE FROM runs WHERE run_id = ?";

#[cfg(feature = "postgres")]
pub const DELETE_RUN: &str = "DELETE FROM runs WHERE run_id = $1";

#[cfg(feature = "sqlite")]
pub const SELECT_VIDEO: &str = "SELECT video_data, video_mime FROM runs WHERE run_id = ?";

#[cfg(feature = "postgres")]
pub const SELECT_VIDEO: &str = "SELECT video_data, video_mime FROM runs WHERE run_id = $1";

pub const COUNT_RUNS: &str = "SELECT COUNT(*) AS n FROM runs";

pub const LEADERBOARD: &str = r#"
    SELECT u.user_id, u.username, COUNT(r.run_id) AS runs_count, MIN(r.time_seconds) AS best_time
    FROM users u JOIN runs r ON r.user_id = u.user_id
    GROUP BY u.user_id, u.username
    ORDER BY runs_count DESC, best_time ASC
"#;
