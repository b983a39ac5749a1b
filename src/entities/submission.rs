use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub artist_id: i32,
    pub dj_id: i32,
    pub asset_id: i32,
    /// Target mixtape.
    pub playlist_id: i32,
    pub status: SubmissionStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(
    EnumIter,
    DeriveActiveEnum,
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Status is not included in the list")]
pub struct UnknownStatus;

impl FromStr for SubmissionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubmissionStatus::Pending),
            "approved" => Ok(SubmissionStatus::Approved),
            "rejected" => Ok(SubmissionStatus::Rejected),
            _ => Err(UnknownStatus),
        }
    }
}

impl Entity {
    /// Submissions sent by `artist_id`.
    pub fn sent_by(artist_id: i32) -> Select<Entity> {
        Self::find().filter(Column::ArtistId.eq(artist_id))
    }

    /// Submissions addressed to `dj_id`.
    pub fn received_by(dj_id: i32) -> Select<Entity> {
        Self::find().filter(Column::DjId.eq(dj_id))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ArtistId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Artist,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::DjId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Dj,
    #[sea_orm(
        belongs_to = "super::asset::Entity",
        from = "Column::AssetId",
        to = "super::asset::Column::Id",
        on_delete = "Cascade"
    )]
    Asset,
    #[sea_orm(
        belongs_to = "super::playlist::Entity",
        from = "Column::PlaylistId",
        to = "super::playlist::Column::Id",
        on_delete = "Cascade"
    )]
    Playlist,
}

impl Related<super::asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Asset.def()
    }
}

impl Related<super::playlist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Playlist.def()
    }
}

fn current<V: Clone + Into<Value>>(value: &ActiveValue<V>) -> Option<V> {
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(v.clone()),
        ActiveValue::NotSet => None,
    }
}

impl ActiveModel {
    /// The dj must own the target playlist and the artist must own the asset.
    async fn check_ownership<C>(&self, db: &C) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        let required = |value: Option<i32>, field: &str| {
            value.ok_or_else(|| DbErr::Custom(format!("{field} can't be blank")))
        };
        let artist_id = required(current(&self.artist_id), "Artist")?;
        let dj_id = required(current(&self.dj_id), "Dj")?;
        let asset_id = required(current(&self.asset_id), "Asset")?;
        let playlist_id = required(current(&self.playlist_id), "Playlist")?;

        let playlist = super::playlist::Entity::find_by_id(playlist_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::Custom("Playlist must exist".to_string()))?;
        if playlist.user_id != dj_id {
            return Err(DbErr::Custom("Dj must be the owner of the mixtape".to_string()));
        }

        let asset = super::asset::Entity::find_by_id(asset_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::Custom("Asset must exist".to_string()))?;
        if asset.user_id != artist_id {
            return Err(DbErr::Custom("Artist must be the owner of the asset".to_string()));
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            status: Set(SubmissionStatus::default()),
            ..ActiveModelTrait::default()
        }
    }

    async fn before_save<C>(mut self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = chrono::Utc::now().naive_utc();
        if insert {
            self.check_ownership(db).await?;
            if self.status.is_not_set() {
                self.status = Set(SubmissionStatus::default());
            }
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_defaults_to_pending() {
        assert_eq!(SubmissionStatus::default(), SubmissionStatus::Pending);
        assert_eq!(ActiveModel::new().status, Set(SubmissionStatus::Pending));
    }

    #[test]
    fn status_parses_only_known_values() {
        assert_eq!("approved".parse(), Ok(SubmissionStatus::Approved));
        assert_eq!("rejected".parse(), Ok(SubmissionStatus::Rejected));
        assert_eq!("pending".parse(), Ok(SubmissionStatus::Pending));
        assert_eq!("Approved".parse::<SubmissionStatus>(), Err(UnknownStatus));
        assert_eq!("invalid_status".parse::<SubmissionStatus>(), Err(UnknownStatus));
    }

    #[test]
    fn status_serializes_as_lowercase() {
        let json = serde_json::to_value(SubmissionStatus::Rejected).unwrap();
        assert_eq!(json, serde_json::json!("rejected"));
        assert_eq!(SubmissionStatus::Approved.to_string(), "approved");
    }
}
