use anyhow::Context;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use std::env;

/// Drops every table and re-applies all migrations.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let db = Database::connect(database_url)
        .await
        .context("failed to connect to database")?;

    Migrator::fresh(&db)
        .await
        .context("failed to rebuild schema")?;

    tracing::info!("Database reset successfully");
    Ok(())
}
