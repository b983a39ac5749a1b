use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};

use crate::entities::user::{self, Entity as User};
use crate::error::AppError;
use crate::services::auth::decode_access_token;
use crate::state::AppState;

/// The authenticated caller, as currently stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub display_name: Option<String>,
    pub role: user::Role,
    pub created_at: chrono::NaiveDateTime,
}

impl From<user::Model> for AuthUser {
    fn from(user: user::Model) -> Self {
        AuthUser {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

fn login_required() -> AppError {
    AppError::Unauthorized("You must be logged in to access this page.".to_string())
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(login_required)?;

    let claims = decode_access_token(&state.config, token)?;
    let user_id: i32 = claims.sub.parse().map_err(|_| login_required())?;

    // Reload so a deleted account or a changed role applies immediately.
    let user = User::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            tracing::info!(user_id, "Token refers to a missing user");
            login_required()
        })?;

    req.extensions_mut().insert(AuthUser::from(user));

    Ok(next.run(req).await)
}
