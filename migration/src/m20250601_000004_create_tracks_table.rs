use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tracks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tracks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tracks::PlaylistId).integer().not_null())
                    .col(ColumnDef::new(Tracks::AssetId).integer().not_null())
                    .col(ColumnDef::new(Tracks::UserId).integer().not_null())
                    .col(ColumnDef::new(Tracks::Position).integer().not_null())
                    .col(ColumnDef::new(Tracks::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Tracks::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tracks_playlist_id")
                            .from(Tracks::Table, Tracks::PlaylistId)
                            .to(Playlists::Table, Playlists::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tracks_asset_id")
                            .from(Tracks::Table, Tracks::AssetId)
                            .to(Assets::Table, Assets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tracks_user_id")
                            .from(Tracks::Table, Tracks::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per asset per playlist.
        manager
            .create_index(
                Index::create()
                    .name("idx_tracks_playlist_asset")
                    .table(Tracks::Table)
                    .col(Tracks::PlaylistId)
                    .col(Tracks::AssetId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tracks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Tracks {
    Table,
    Id,
    PlaylistId,
    AssetId,
    UserId,
    Position,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Playlists {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Assets {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
