//! Application state - shared across all handlers.

use std::sync::Arc;

use blogify_core::ports::{PasswordService, PostRepository, TokenService, UserRepository};
use blogify_core::service::{AccountService, ContentService};
use blogify_infra::database::{
    MemoryPostRepository, MemoryUserRepository, PostgresPostRepository, PostgresUserRepository,
    connect,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub content: ContentService,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(
        config: &AppConfig,
        password_service: Arc<dyn PasswordService>,
        token_service: Arc<dyn TokenService>,
    ) -> Self {
        let (users, posts): (Arc<dyn UserRepository>, Arc<dyn PostRepository>) =
            match &config.database {
                Some(db_config) => match connect(db_config).await {
                    Ok(conn) => {
                        let conn = Arc::new(conn);
                        (
                            Arc::new(PostgresUserRepository::new(conn.clone())),
                            Arc::new(PostgresPostRepository::new(conn)),
                        )
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                        (
                            Arc::new(MemoryUserRepository::new()),
                            Arc::new(MemoryPostRepository::new()),
                        )
                    }
                },
                None => {
                    tracing::warn!(
                        "DATABASE_URL not set. Running without database (in-memory mode)."
                    );
                    (
                        Arc::new(MemoryUserRepository::new()),
                        Arc::new(MemoryPostRepository::new()),
                    )
                }
            };

        let accounts = AccountService::new(
            users.clone(),
            posts.clone(),
            password_service,
            token_service,
        );
        let content = ContentService::new(posts, users);

        tracing::info!("Application state initialized");

        Self { accounts, content }
    }
}
