pub mod confirmation_handlers;
pub mod user_handlers;

use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub use confirmation_handlers::{renew_confirmation_code_handler, verify_code_handler};
pub use user_handlers::{get_user_handler, register_handler};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/users/register", post(register_handler))
        .route("/users/verify", get(verify_code_handler))
        .route("/users/{id}", get(get_user_handler))
        .route(
            "/users/{id}/confirmation-code/renew",
            post(renew_confirmation_code_handler),
        )
}
