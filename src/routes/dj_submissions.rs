use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    response::Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::entities::submission::SubmissionStatus;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::submission::{SubmissionListItem, SubmissionNotice, SubmissionResponse};
use crate::services::submissions::SubmissionService;

const QUEUE_PATH: &str = "/dj/submissions";

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateSubmissionRequest {
    /// One of `pending`, `approved`, `rejected`.
    pub status: String,
}

fn update_failed(reason: &dyn std::fmt::Display) -> AppError {
    AppError::Unprocessable {
        message: format!("Failed to update submission status: {reason}"),
        location: QUEUE_PATH.to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/dj/submissions",
    responses(
        (status = 200, description = "Pending submissions addressed to the caller, newest first", body = [SubmissionListItem]),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not a DJ", body = crate::error::ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "DJ Submissions"
)]
pub async fn list_pending_submissions(
    State(db): State<DatabaseConnection>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<SubmissionListItem>>, AppError> {
    let pending = SubmissionService::new(db).pending_for(auth_user.id).await?;
    Ok(Json(pending.into_iter().map(SubmissionListItem::from).collect()))
}

#[utoipa::path(
    patch,
    path = "/dj/submissions/{id}",
    params(
        ("id" = i32, Path, description = "Submission ID")
    ),
    request_body = UpdateSubmissionRequest,
    responses(
        (status = 200, description = "Status updated; approval appends the track", body = SubmissionNotice),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not a DJ", body = crate::error::ErrorResponse),
        (status = 404, description = "No such submission addressed to the caller", body = crate::error::ErrorResponse),
        (status = 409, description = "Track added concurrently", body = crate::error::ErrorResponse),
        (status = 422, description = "Malformed body, unknown status, or the track could not be added", body = crate::error::ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "DJ Submissions"
)]
pub async fn update_submission(
    State(db): State<DatabaseConnection>,
    Extension(auth_user): Extension<AuthUser>,
    Path(submission_id): Path<i32>,
    payload: Result<Json<UpdateSubmissionRequest>, JsonRejection>,
) -> Result<Json<SubmissionNotice>, AppError> {
    let service = SubmissionService::new(db);
    service.find_received(auth_user.id, submission_id).await?;

    let status = match payload {
        Ok(Json(payload)) => payload
            .status
            .parse::<SubmissionStatus>()
            .map_err(|e| update_failed(&e)),
        Err(rejection) => Err(update_failed(&rejection.body_text())),
    }?;

    let transition = service
        .transition(auth_user.id, submission_id, status)
        .await?;

    let notice = transition.notice();
    Ok(Json(SubmissionNotice {
        notice,
        location: QUEUE_PATH.to_string(),
        submission: SubmissionResponse::from(transition.into_submission()),
    }))
}
