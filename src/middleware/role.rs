use axum::{extract::Request, middleware::Next, response::Response};

use crate::entities::user::Role;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;

fn ensure_role(req: &Request, role: Role, denied: &str) -> Result<(), AppError> {
    let auth_user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| AppError::Unauthorized("You must be logged in to access this page.".to_string()))?;

    if auth_user.role != role {
        tracing::info!(
            username = %auth_user.username,
            role = ?auth_user.role,
            required = ?role,
            "Access denied"
        );
        return Err(AppError::forbidden(denied));
    }

    Ok(())
}

/// Guards the submission form and create endpoint.
pub async fn require_artist_submitter(req: Request, next: Next) -> Result<Response, AppError> {
    ensure_role(&req, Role::Artist, "Only artists can submit tracks.")?;
    Ok(next.run(req).await)
}

/// Guards the artist's sent-submission list.
pub async fn require_artist_viewer(req: Request, next: Next) -> Result<Response, AppError> {
    ensure_role(&req, Role::Artist, "Only artists can view their submissions.")?;
    Ok(next.run(req).await)
}

pub async fn require_dj(req: Request, next: Next) -> Result<Response, AppError> {
    ensure_role(&req, Role::Dj, "Only DJs can manage submissions.")?;
    Ok(next.run(req).await)
}
