use serde::Serialize;

use crate::entities::submission::{self, SubmissionStatus};
use crate::entities::{asset, playlist, user};
use crate::services::submissions::SubmissionDetails;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub display_name: String,
}

impl From<&user::Model> for UserSummary {
    fn from(user: &user::Model) -> Self {
        UserSummary {
            id: user.id,
            username: user.username.clone(),
            display_name: user.name().to_string(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AssetSummary {
    pub id: i32,
    pub title: String,
}

impl From<&asset::Model> for AssetSummary {
    fn from(asset: &asset::Model) -> Self {
        AssetSummary {
            id: asset.id,
            title: asset.title.clone(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PlaylistSummary {
    pub id: i32,
    pub title: String,
}

impl From<&playlist::Model> for PlaylistSummary {
    fn from(playlist: &playlist::Model) -> Self {
        PlaylistSummary {
            id: playlist.id,
            title: playlist.title.clone(),
        }
    }
}

/// A stored submission as written.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SubmissionResponse {
    pub id: i32,
    pub artist_id: i32,
    pub dj_id: i32,
    pub asset_id: i32,
    pub playlist_id: i32,
    pub status: SubmissionStatus,
    pub message: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl From<submission::Model> for SubmissionResponse {
    fn from(model: submission::Model) -> Self {
        SubmissionResponse {
            id: model.id,
            artist_id: model.artist_id,
            dj_id: model.dj_id,
            asset_id: model.asset_id,
            playlist_id: model.playlist_id,
            status: model.status,
            message: model.message,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// A list entry with the related rows a queue or outbox shows.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SubmissionListItem {
    pub id: i32,
    pub status: SubmissionStatus,
    pub message: Option<String>,
    pub artist: Option<UserSummary>,
    pub dj: Option<UserSummary>,
    pub asset: Option<AssetSummary>,
    pub playlist: Option<PlaylistSummary>,
    pub created_at: chrono::NaiveDateTime,
}

impl From<SubmissionDetails> for SubmissionListItem {
    fn from(details: SubmissionDetails) -> Self {
        SubmissionListItem {
            id: details.submission.id,
            status: details.submission.status,
            message: details.submission.message,
            artist: details.artist.as_ref().map(UserSummary::from),
            dj: details.dj.as_ref().map(UserSummary::from),
            asset: details.asset.as_ref().map(AssetSummary::from),
            playlist: details.playlist.as_ref().map(PlaylistSummary::from),
            created_at: details.submission.created_at,
        }
    }
}

/// Success outcome: what to tell the user and where to send them next.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SubmissionNotice {
    pub notice: String,
    pub location: String,
    pub submission: SubmissionResponse,
}
