//! Shared application state.

use std::sync::Arc;

use crate::admin::auth::SessionStore;
use crate::config::Config;
use crate::credentials::AdminCredentials;
use crate::db::DbPool;
use crate::runs::RunStore;
use crate::users::UserStore;

/// Everything request handlers need, built once at startup and shared via
/// `Arc`. The stores each hold a clone of the same connection pool.
pub struct AppState {
    pub config: Config,
    pub users: UserStore,
    pub runs: RunStore,
    pub credentials: AdminCredentials,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config, pool: DbPool, credentials: AdminCredentials) -> Arc<Self> {
        Arc::new(Self {
            users: UserStore::new(pool.clone()),
            runs: RunStore::new(pool),
            credentials,
            sessions: SessionStore::new(),
            config,
        })
    }
}
