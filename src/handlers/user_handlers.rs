use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::RegisterUserRequest;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub profile_status: String,
    pub email_verified: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            profile_status: user.profile_status,
            email_verified: user.email_verified,
        }
    }
}

pub async fn register_handler(
    State(app_state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let request = RegisterUserRequest {
        email: form.email,
        password: form.password,
        first_name: form.first_name,
        last_name: form.last_name,
        username: form.username,
    };

    let registered = app_state.user_service.register_user(request).await?;
    Ok((StatusCode::CREATED, Json(registered.user.into())))
}

pub async fn get_user_handler(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>> {
    let user = app_state
        .user_service
        .find_user_by_id(id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    Ok(Json(user.into()))
}
