use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use migration::{Migrator, MigratorTrait};
use mixtape_drop::config::Config;
use mixtape_drop::entities::user;
use mixtape_drop::routes::create_routes;
use mixtape_drop::services::auth::hash_password;
use mixtape_drop::state::AppState;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mixtape-drop", version, about = "Track submissions for DJ mixtapes")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending migrations and serve HTTP (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Create a user, prompting for the password
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long, value_enum)]
        role: RoleArg,
        #[arg(long)]
        display_name: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Listener,
    Artist,
    Dj,
}

impl From<RoleArg> for user::Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Listener => user::Role::Listener,
            RoleArg::Artist => user::Role::Artist,
            RoleArg::Dj => user::Role::Dj,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mixtape_drop=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            migrate(&db).await?;
            serve(db, config).await
        }
        Command::Migrate => migrate(&db).await,
        Command::CreateUser {
            username,
            role,
            display_name,
        } => create_user(&db, username, role.into(), display_name).await,
    }
}

async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
    Migrator::up(db, None)
        .await
        .context("failed to apply migrations")?;
    tracing::info!("Database migrations applied");
    Ok(())
}

async fn serve(db: DatabaseConnection, config: Config) -> anyhow::Result<()> {
    let address = config.bind_address();
    let app = create_routes(AppState::new(db, config));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!(address = %listener.local_addr()?, "Listening");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn create_user(
    db: &DatabaseConnection,
    username: String,
    role: user::Role,
    display_name: Option<String>,
) -> anyhow::Result<()> {
    let password = rpassword::prompt_password(format!("Password for {username}: "))?;
    let confirmation = rpassword::prompt_password("Confirm password: ")?;
    anyhow::ensure!(password == confirmation, "passwords do not match");
    anyhow::ensure!(!password.is_empty(), "password must not be empty");

    let password_hash = hash_password(&password)?;

    let created = user::ActiveModel {
        username: Set(username),
        display_name: Set(display_name),
        password: Set(password_hash),
        role: Set(role),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .context("failed to create user")?;

    tracing::info!(user_id = created.id, username = %created.username, role = ?created.role, "User created");
    Ok(())
}
