pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use axum::Router;
use config::ServiceConfig;
use repositories::{SqliteConfirmationCodeRepository, SqliteUserRepository};
use services::{ConfirmationService, EventPublisher, RenewalQueue, UserService};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub confirmation_service: Arc<ConfirmationService>,
    pub renewal_queue: RenewalQueue,
}

impl AppState {
    /// Wire the SQLite stores and services together and start the renewal
    /// worker. Must be called from within a tokio runtime.
    pub fn build(
        pool: sqlx::SqlitePool,
        config: &ServiceConfig,
        publisher: Arc<dyn EventPublisher>,
    ) -> (Self, JoinHandle<()>) {
        let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
        let code_repository = Arc::new(SqliteConfirmationCodeRepository::new(pool));

        let confirmation_service = Arc::new(ConfirmationService::new(
            user_repository.clone(),
            code_repository,
            publisher.clone(),
            config.confirmation.clone(),
        ));
        let user_service = Arc::new(UserService::new(
            user_repository,
            confirmation_service.clone(),
            publisher,
            config.registered_topic.clone(),
        ));

        let (renewal_queue, worker) =
            RenewalQueue::spawn(confirmation_service.clone(), config.renewal_queue_capacity);

        let state = Self {
            user_service,
            confirmation_service,
            renewal_queue,
        };
        (state, worker)
    }
}

pub fn app(state: AppState) -> Router {
    handlers::routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
