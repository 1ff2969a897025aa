//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use salesdesk_auth::{AccountNotifier, AuthServices};
use salesdesk_cache::provider::CacheManager;
use salesdesk_core::config::AppConfig;
use salesdesk_database::DatabasePool;
use salesdesk_database::repositories::Repositories;

/// Passed to every Axum handler via `State<AppState>`. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Cache manager (Redis or in-memory); also backs rate limiting
    pub cache: Arc<CacheManager>,
    /// Repository set for the configured backend
    pub repos: Repositories,
    /// Present when the repositories are Postgres-backed
    pub database: Option<DatabasePool>,
    /// Identity core services
    pub auth: AuthServices,
}

impl AppState {
    /// Build the state and the auth services on top of it. Must run inside
    /// a Tokio runtime.
    pub fn new(
        config: AppConfig,
        repos: Repositories,
        cache: Arc<CacheManager>,
        notifier: Arc<dyn AccountNotifier>,
    ) -> Self {
        let auth = AuthServices::new(&config, &repos, cache.clone(), notifier);
        Self {
            config: Arc::new(config),
            cache,
            repos,
            database: None,
            auth,
        }
    }

    /// Attach the pool behind the repositories so health checks can reach it.
    pub fn with_database(mut self, database: DatabasePool) -> Self {
        self.database = Some(database);
        self
    }

    /// The platform role that guards administration endpoints.
    pub fn admin_role(&self) -> &str {
        &self.config.auth.admin_global_role
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}
