//! Web administration UI module.
//!
//! Provides:
//! - Password login for the single admin account
//! - Session management
//! - Admin routes for the dashboard and user/run editing

pub mod auth;
pub mod routes;
pub mod templates;

pub use auth::SessionStore;
pub use routes::admin_router;
