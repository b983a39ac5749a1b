//! Submission workflow: artists send assets to DJ mixtapes, DJs decide.
//!
//! Every query here is scoped to the caller: artists only ever see rows they
//! sent, DJs only rows addressed to them.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};

use crate::entities::submission::{self, SubmissionStatus};
use crate::entities::{asset, playlist, track, user};
use crate::error::{AppError, FieldErrors};

pub const MIXTAPE_NOT_FOUND: &str =
    "Target mixtape not found, is not a mixtape, or the owner is not a DJ.";
pub const SUBMIT_FAILED: &str = "Could not submit track.";

/// What the artist typed into the submission form.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub asset_id: i32,
    pub message: Option<String>,
}

/// A validated target: a mixtape whose owner is a DJ.
#[derive(Debug, Clone)]
pub struct Mixtape {
    pub playlist: playlist::Model,
    pub dj: user::Model,
}

/// A submission with its related rows loaded.
#[derive(Debug, Clone)]
pub struct SubmissionDetails {
    pub submission: submission::Model,
    pub artist: Option<user::Model>,
    pub dj: Option<user::Model>,
    pub asset: Option<asset::Model>,
    pub playlist: Option<playlist::Model>,
}

/// Result of a DJ decision.
#[derive(Debug, Clone)]
pub enum Transition {
    TrackAdded {
        submission: submission::Model,
        track: track::Model,
    },
    AlreadyInMixtape {
        submission: submission::Model,
    },
    StatusUpdated {
        submission: submission::Model,
    },
}

impl Transition {
    pub fn into_submission(self) -> submission::Model {
        match self {
            Transition::TrackAdded { submission, .. }
            | Transition::AlreadyInMixtape { submission }
            | Transition::StatusUpdated { submission } => submission,
        }
    }

    pub fn notice(&self) -> String {
        match self {
            Transition::TrackAdded { .. } => {
                "Submission approved and track added to mixtape.".to_string()
            }
            Transition::AlreadyInMixtape { .. } => {
                "Submission approved. Track was already in the mixtape.".to_string()
            }
            Transition::StatusUpdated { submission } => {
                format!("Submission status updated to {}.", submission.status)
            }
        }
    }
}

pub struct SubmissionService {
    db: DatabaseConnection,
}

impl SubmissionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Resolves `playlist_id` to a mixtape owned by a DJ.
    ///
    /// Missing playlists, plain playlists and mixtapes of non-DJs are all
    /// reported with the same message.
    pub async fn find_mixtape(&self, playlist_id: i32) -> Result<Mixtape, AppError> {
        let found = playlist::Entity::find_by_id(playlist_id)
            .find_also_related(user::Entity)
            .one(&self.db)
            .await?;

        match found {
            Some((playlist, Some(owner))) if playlist.is_mix && owner.role.is_dj() => Ok(Mixtape {
                playlist,
                dj: owner,
            }),
            _ => {
                tracing::info!(playlist_id, "Rejected submission target");
                Err(AppError::forbidden(MIXTAPE_NOT_FOUND))
            }
        }
    }

    /// The artist's published assets, by title.
    pub async fn submittable_assets(&self, artist_id: i32) -> Result<Vec<asset::Model>, AppError> {
        let assets = asset::Entity::published_by(artist_id)
            .order_by_asc(asset::Column::Title)
            .all(&self.db)
            .await?;
        Ok(assets)
    }

    /// Inserts a pending submission from `artist_id` to `mixtape`.
    ///
    /// The dj and playlist always come from the resolved mixtape.
    pub async fn create(
        &self,
        artist_id: i32,
        mixtape: &Mixtape,
        input: NewSubmission,
    ) -> Result<submission::Model, AppError> {
        let owned = asset::Entity::published_by(artist_id)
            .filter(asset::Column::Id.eq(input.asset_id))
            .one(&self.db)
            .await?;
        if owned.is_none() {
            let mut fields = FieldErrors::new();
            fields.insert(
                "asset".to_string(),
                vec!["must be one of your published tracks".to_string()],
            );
            return Err(AppError::invalid(SUBMIT_FAILED, fields));
        }

        let mut active = submission::ActiveModel::new();
        active.artist_id = Set(artist_id);
        active.dj_id = Set(mixtape.dj.id);
        active.playlist_id = Set(mixtape.playlist.id);
        active.asset_id = Set(input.asset_id);
        active.message = Set(input.message);

        let created = active.insert(&self.db).await.map_err(|e| match e {
            DbErr::Custom(msg) => {
                let mut fields = FieldErrors::new();
                fields.insert("base".to_string(), vec![msg]);
                AppError::invalid(SUBMIT_FAILED, fields)
            }
            other => AppError::DatabaseError(other),
        })?;

        tracing::info!(
            submission_id = created.id,
            artist_id,
            dj_id = created.dj_id,
            playlist_id = created.playlist_id,
            "Submission created"
        );
        Ok(created)
    }

    /// Everything `artist_id` has sent, newest first.
    pub async fn sent_by(&self, artist_id: i32) -> Result<Vec<SubmissionDetails>, AppError> {
        let submissions = submission::Entity::sent_by(artist_id)
            .order_by_desc(submission::Column::CreatedAt)
            .order_by_desc(submission::Column::Id)
            .all(&self.db)
            .await?;
        self.with_details(submissions).await
    }

    /// Pending submissions addressed to `dj_id`, newest first.
    pub async fn pending_for(&self, dj_id: i32) -> Result<Vec<SubmissionDetails>, AppError> {
        let submissions = submission::Entity::received_by(dj_id)
            .filter(submission::Column::Status.eq(SubmissionStatus::Pending))
            .order_by_desc(submission::Column::CreatedAt)
            .order_by_desc(submission::Column::Id)
            .all(&self.db)
            .await?;
        self.with_details(submissions).await
    }

    /// A submission addressed to `dj_id`, or 404.
    pub async fn find_received(
        &self,
        dj_id: i32,
        submission_id: i32,
    ) -> Result<submission::Model, AppError> {
        submission::Entity::received_by(dj_id)
            .filter(submission::Column::Id.eq(submission_id))
            .one(&self.db)
            .await?
            .ok_or_else(not_found)
    }

    /// Sets the status of a submission addressed to `dj_id`.
    ///
    /// Approval appends the asset to the mixtape unless it is already there.
    /// The status write and the track insert commit together or not at all.
    pub async fn transition(
        &self,
        dj_id: i32,
        submission_id: i32,
        status: SubmissionStatus,
    ) -> Result<Transition, AppError> {
        let txn = self.db.begin().await?;

        let found = submission::Entity::received_by(dj_id)
            .filter(submission::Column::Id.eq(submission_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(not_found)?;

        let mut active: submission::ActiveModel = found.into();
        active.status = Set(status);
        let submission = active.update(&txn).await?;

        if status != SubmissionStatus::Approved {
            txn.commit().await?;
            tracing::info!(submission_id, %status, "Submission status updated");
            return Ok(Transition::StatusUpdated { submission });
        }

        let existing = track::Entity::find()
            .filter(track::Column::PlaylistId.eq(submission.playlist_id))
            .filter(track::Column::AssetId.eq(submission.asset_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            txn.commit().await?;
            tracing::info!(submission_id, "Submission approved, track already in mixtape");
            return Ok(Transition::AlreadyInMixtape { submission });
        }

        match append_track(&txn, &submission).await {
            Ok(track) => {
                txn.commit().await?;
                tracing::info!(
                    submission_id,
                    track_id = track.id,
                    playlist_id = track.playlist_id,
                    "Submission approved, track added to mixtape"
                );
                Ok(Transition::TrackAdded { submission, track })
            }
            Err(e) => {
                txn.rollback().await?;
                tracing::warn!(submission_id, error = %e, "Approval rolled back");
                Err(approval_error(e))
            }
        }
    }

    /// Loads artist, dj, asset and playlist for every row with one query per table.
    async fn with_details(
        &self,
        submissions: Vec<submission::Model>,
    ) -> Result<Vec<SubmissionDetails>, AppError> {
        if submissions.is_empty() {
            return Ok(Vec::new());
        }

        let mut user_ids: Vec<i32> = submissions
            .iter()
            .flat_map(|s| [s.artist_id, s.dj_id])
            .collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let asset_ids: Vec<i32> = submissions.iter().map(|s| s.asset_id).collect();
        let playlist_ids: Vec<i32> = submissions.iter().map(|s| s.playlist_id).collect();

        let users: HashMap<i32, user::Model> = user::Entity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let assets: HashMap<i32, asset::Model> = asset::Entity::find()
            .filter(asset::Column::Id.is_in(asset_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();
        let playlists: HashMap<i32, playlist::Model> = playlist::Entity::find()
            .filter(playlist::Column::Id.is_in(playlist_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(submissions
            .into_iter()
            .map(|submission| SubmissionDetails {
                artist: users.get(&submission.artist_id).cloned(),
                dj: users.get(&submission.dj_id).cloned(),
                asset: assets.get(&submission.asset_id).cloned(),
                playlist: playlists.get(&submission.playlist_id).cloned(),
                submission,
            })
            .collect())
    }
}

/// Appends the submission's asset at the end of its playlist, owned by the playlist owner.
async fn append_track(
    txn: &DatabaseTransaction,
    submission: &submission::Model,
) -> Result<track::Model, DbErr> {
    let owner_id = playlist::Entity::find_by_id(submission.playlist_id)
        .one(txn)
        .await?
        .map(|p| p.user_id)
        .ok_or_else(|| DbErr::Custom("Playlist must exist".to_string()))?;

    let last_position: Option<i32> = track::Entity::find()
        .select_only()
        .column_as(track::Column::Position.max(), "last_position")
        .filter(track::Column::PlaylistId.eq(submission.playlist_id))
        .into_tuple::<Option<i32>>()
        .one(txn)
        .await?
        .flatten();

    track::ActiveModel {
        playlist_id: Set(submission.playlist_id),
        asset_id: Set(submission.asset_id),
        user_id: Set(owner_id),
        position: Set(last_position.unwrap_or(0) + 1),
        ..Default::default()
    }
    .insert(txn)
    .await
}

fn not_found() -> AppError {
    AppError::NotFound("Submission not found".to_string())
}

/// Maps a failed track append to the response the DJ sees.
pub fn approval_error(e: DbErr) -> AppError {
    if let Some(SqlErr::UniqueConstraintViolation(_)) = e.sql_err() {
        return AppError::Conflict(
            "Submission could not be approved: the track was added to the mixtape concurrently."
                .to_string(),
        );
    }

    let reason = match e {
        DbErr::Custom(msg) => msg,
        other => return AppError::DatabaseError(other),
    };
    AppError::Unprocessable {
        message: format!(
            "Submission could not be approved: failed to add track to mixtape: {reason}."
        ),
        location: "/dj/submissions".to_string(),
    }
}
