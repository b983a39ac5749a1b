use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::{header, StatusCode},
    response::Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{field_errors, AppError};
use crate::middleware::auth::AuthUser;
use crate::models::submission::{
    AssetSummary, PlaylistSummary, SubmissionListItem, SubmissionNotice, SubmissionResponse,
    UserSummary,
};
use crate::services::submissions::{NewSubmission, SubmissionService, SUBMIT_FAILED};

/// Only `asset_id` and `message` are read; the dj and playlist come from the route.
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateSubmissionRequest {
    #[validate(required(message = "can't be blank"))]
    pub asset_id: Option<i32>,
    #[validate(length(max = 2000, message = "is too long (maximum is 2000 characters)"))]
    pub message: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NewSubmissionResponse {
    pub playlist: PlaylistSummary,
    pub dj: UserSummary,
    /// The caller's published assets, by title.
    pub artist_assets: Vec<AssetSummary>,
}

#[utoipa::path(
    get,
    path = "/playlists/{playlist_id}/submissions/new",
    params(
        ("playlist_id" = i32, Path, description = "Target mixtape ID")
    ),
    responses(
        (status = 200, description = "Submission form data", body = NewSubmissionResponse),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not an artist, or the playlist is not a DJ mixtape", body = crate::error::ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Submissions"
)]
pub async fn new_submission(
    State(db): State<DatabaseConnection>,
    Extension(auth_user): Extension<AuthUser>,
    Path(playlist_id): Path<i32>,
) -> Result<Json<NewSubmissionResponse>, AppError> {
    let service = SubmissionService::new(db);
    let mixtape = service.find_mixtape(playlist_id).await?;
    let assets = service.submittable_assets(auth_user.id).await?;

    Ok(Json(NewSubmissionResponse {
        playlist: PlaylistSummary::from(&mixtape.playlist),
        dj: UserSummary::from(&mixtape.dj),
        artist_assets: assets.iter().map(AssetSummary::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/playlists/{playlist_id}/submissions",
    params(
        ("playlist_id" = i32, Path, description = "Target mixtape ID")
    ),
    request_body = CreateSubmissionRequest,
    responses(
        (status = 201, description = "Track submitted", body = SubmissionNotice),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not an artist, or the playlist is not a DJ mixtape", body = crate::error::ErrorResponse),
        (status = 422, description = "Malformed body, missing or foreign asset, or message too long", body = crate::error::ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Submissions"
)]
pub async fn create_submission(
    State(db): State<DatabaseConnection>,
    Extension(auth_user): Extension<AuthUser>,
    Path(playlist_id): Path<i32>,
    payload: Result<Json<CreateSubmissionRequest>, JsonRejection>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<SubmissionNotice>), AppError> {
    tracing::debug!(artist = %auth_user.username, playlist_id, "Create submission request");

    let service = SubmissionService::new(db);
    let mixtape = service.find_mixtape(playlist_id).await?;

    let Json(payload) = payload.map_err(|e| AppError::malformed_body(SUBMIT_FAILED, &e))?;
    payload
        .validate()
        .map_err(|e| AppError::invalid(SUBMIT_FAILED, field_errors(&e)))?;
    let asset_id = payload
        .asset_id
        .ok_or_else(|| AppError::InternalServerError("validated asset_id missing".to_string()))?;

    let created = service
        .create(
            auth_user.id,
            &mixtape,
            NewSubmission {
                asset_id,
                message: payload.message,
            },
        )
        .await?;

    let location = format!("/playlists/{}", mixtape.playlist.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location.clone())],
        Json(SubmissionNotice {
            notice: "Track submitted successfully.".to_string(),
            location,
            submission: SubmissionResponse::from(created),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/my_submissions",
    responses(
        (status = 200, description = "Submissions sent by the caller, newest first", body = [SubmissionListItem]),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not an artist", body = crate::error::ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Submissions"
)]
pub async fn list_sent_submissions(
    State(db): State<DatabaseConnection>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<SubmissionListItem>>, AppError> {
    let sent = SubmissionService::new(db).sent_by(auth_user.id).await?;
    Ok(Json(sent.into_iter().map(SubmissionListItem::from).collect()))
}
