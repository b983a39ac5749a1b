use axum::{
    extract::{Extension, State},
    response::Json,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::entities::user::{self, Entity as User};
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::services::auth::{issue_access_token, verify_password};
use crate::state::AppState;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    access_token: String,
    token_type: String,
    expires_in: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserProfile {
    id: i32,
    username: String,
    display_name: Option<String>,
    role: user::Role,
    created_at: chrono::NaiveDateTime,
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    tracing::debug!(username = %payload.username, "Login attempt");

    let user = User::find()
        .filter(user::Column::Username.eq(&payload.username))
        .one(&state.db)
        .await?;

    let user = match user {
        Some(user) if verify_password(&payload.password, &user.password) => user,
        _ => {
            tracing::info!(username = %payload.username, "Login rejected");
            return Err(AppError::Unauthorized("Invalid username or password".to_string()));
        }
    };

    let access_token = issue_access_token(&state.config, &user)?;
    tracing::info!(user_id = user.id, "Login successful");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.token_ttl_secs,
    }))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "User profile retrieved successfully", body = UserProfile),
        (status = 401, description = "Unauthorized - Invalid or missing token", body = crate::error::ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Authentication"
)]
/// The middleware has already loaded the caller's row.
pub async fn me(Extension(auth_user): Extension<AuthUser>) -> Json<UserProfile> {
    Json(UserProfile {
        id: auth_user.id,
        username: auth_user.username,
        display_name: auth_user.display_name,
        role: auth_user.role,
        created_at: auth_user.created_at,
    })
}
