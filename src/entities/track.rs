use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// A playlist entry: one asset at one position, owned by the playlist's owner.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "tracks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub playlist_id: i32,
    pub asset_id: i32,
    pub user_id: i32,
    pub position: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::playlist::Entity",
        from = "Column::PlaylistId",
        to = "super::playlist::Column::Id",
        on_delete = "Cascade"
    )]
    Playlist,
    #[sea_orm(
        belongs_to = "super::asset::Entity",
        from = "Column::AssetId",
        to = "super::asset::Column::Id",
        on_delete = "Cascade"
    )]
    Asset,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::playlist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Playlist.def()
    }
}

impl Related<super::asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Asset.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

fn current<V: Clone + Into<Value>>(value: &ActiveValue<V>) -> Option<V> {
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(v.clone()),
        ActiveValue::NotSet => None,
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert {
            let asset_id = current(&self.asset_id)
                .ok_or_else(|| DbErr::Custom("Asset can't be blank".to_string()))?;
            let playlist_id = current(&self.playlist_id)
                .ok_or_else(|| DbErr::Custom("Playlist can't be blank".to_string()))?;

            let asset = super::asset::Entity::find_by_id(asset_id)
                .one(db)
                .await?
                .ok_or_else(|| DbErr::Custom("Asset must exist".to_string()))?;
            if !asset.published {
                return Err(DbErr::Custom("Asset must be published".to_string()));
            }

            let playlist = super::playlist::Entity::find_by_id(playlist_id)
                .one(db)
                .await?
                .ok_or_else(|| DbErr::Custom("Playlist must exist".to_string()))?;
            if current(&self.user_id) != Some(playlist.user_id) {
                return Err(DbErr::Custom(
                    "User must be the owner of the playlist".to_string(),
                ));
            }
        }

        let now = chrono::Utc::now().naive_utc();
        if self.created_at.is_not_set() {
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}
