#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use mixtape_drop::config::Config;
use mixtape_drop::entities::submission::{self, SubmissionStatus};
use mixtape_drop::entities::{asset, playlist, track, user};
use mixtape_drop::routes::create_routes;
use mixtape_drop::services::auth::issue_access_token;
use mixtape_drop::state::AppState;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectOptions, Database,
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use serde_json::Value;
use tower::ServiceExt;

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        token_ttl_secs: 900,
        cors_origins: vec!["http://localhost:5173".to_string()],
    }
}

/// The real router over a freshly migrated in-memory database.
pub struct TestApp {
    pub db: DatabaseConnection,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let config = test_config();
        // A single connection keeps every query on the same in-memory database.
        let mut options = ConnectOptions::new(config.database_url.clone());
        options.max_connections(1).min_connections(1).sqlx_logging(false);

        let db = Database::connect(options)
            .await
            .expect("in-memory database should open");
        Migrator::up(&db, None)
            .await
            .expect("migrations should apply");

        let state = AppState::new(db.clone(), config);
        Self { db, state }
    }

    pub fn router(&self) -> Router {
        create_routes(self.state.clone())
    }

    pub fn token_for(&self, user: &user::Model) -> String {
        issue_access_token(&self.state.config, user).expect("token should encode")
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router()
            .oneshot(builder.body(body).expect("request should build"))
            .await
            .expect("router is infallible")
    }

    /// Sends `body` verbatim with the given content type.
    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        content_type: &str,
        body: &str,
    ) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        self.router()
            .oneshot(
                builder
                    .body(Body::from(body.to_string()))
                    .expect("request should build"),
            )
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> Response {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch_json(&self, uri: &str, token: Option<&str>, body: Value) -> Response {
        self.send(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn submission_count(&self) -> u64 {
        submission::Entity::find()
            .count(&self.db)
            .await
            .expect("count should succeed")
    }

    pub async fn track_count(&self, playlist: &playlist::Model) -> u64 {
        track::Entity::find()
            .filter(track::Column::PlaylistId.eq(playlist.id))
            .count(&self.db)
            .await
            .expect("count should succeed")
    }

    pub async fn reload(&self, submission: &submission::Model) -> submission::Model {
        submission::Entity::find_by_id(submission.id)
            .one(&self.db)
            .await
            .expect("lookup should succeed")
            .expect("submission should exist")
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

pub async fn create_user(db: &DatabaseConnection, username: &str, role: user::Role) -> user::Model {
    create_user_with_password(db, username, role, "not-a-real-hash").await
}

pub async fn create_user_with_password(
    db: &DatabaseConnection,
    username: &str,
    role: user::Role,
    password_hash: &str,
) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        display_name: Set(Some(format!("{username} display"))),
        password: Set(password_hash.to_string()),
        role: Set(role),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("user should insert")
}

pub async fn create_asset(
    db: &DatabaseConnection,
    owner: &user::Model,
    title: &str,
    published: bool,
) -> asset::Model {
    asset::ActiveModel {
        user_id: Set(owner.id),
        title: Set(title.to_string()),
        published: Set(published),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("asset should insert")
}

pub async fn create_playlist(
    db: &DatabaseConnection,
    owner: &user::Model,
    title: &str,
    is_mix: bool,
) -> playlist::Model {
    playlist::ActiveModel {
        user_id: Set(owner.id),
        title: Set(title.to_string()),
        is_mix: Set(is_mix),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("playlist should insert")
}

pub async fn create_track(
    db: &DatabaseConnection,
    playlist: &playlist::Model,
    asset: &asset::Model,
    position: i32,
) -> track::Model {
    track::ActiveModel {
        playlist_id: Set(playlist.id),
        asset_id: Set(asset.id),
        user_id: Set(playlist.user_id),
        position: Set(position),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("track should insert")
}

pub async fn create_submission(
    db: &DatabaseConnection,
    asset: &asset::Model,
    mixtape: &playlist::Model,
    message: Option<&str>,
) -> submission::Model {
    let mut active = submission::ActiveModel::new();
    active.artist_id = Set(asset.user_id);
    active.dj_id = Set(mixtape.user_id);
    active.asset_id = Set(asset.id);
    active.playlist_id = Set(mixtape.id);
    active.message = Set(message.map(str::to_string));
    active.insert(db).await.expect("submission should insert")
}

pub async fn set_status(
    db: &DatabaseConnection,
    submission: &submission::Model,
    status: SubmissionStatus,
) -> submission::Model {
    let mut active: submission::ActiveModel = submission.clone().into();
    active.status = Set(status);
    active.update(db).await.expect("status should update")
}

/// An artist with one published asset and a DJ with one mixtape.
pub struct Scene {
    pub artist: user::Model,
    pub dj: user::Model,
    pub asset: asset::Model,
    pub mixtape: playlist::Model,
}

pub async fn scene(db: &DatabaseConnection) -> Scene {
    let artist = create_user(db, "artist", user::Role::Artist).await;
    let dj = create_user(db, "dj", user::Role::Dj).await;
    let asset = create_asset(db, &artist, "Test Track by artist", true).await;
    let mixtape = create_playlist(db, &dj, "DJ's Hot Mixtape", true).await;
    Scene {
        artist,
        dj,
        asset,
        mixtape,
    }
}
