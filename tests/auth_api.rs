mod common;

use axum::http::StatusCode;
use common::{body_json, create_user, create_user_with_password, TestApp};
use mixtape_drop::entities::user::{self, Role};
use mixtape_drop::services::auth::hash_password;
use sea_orm::{EntityTrait, ModelTrait};
use serde_json::json;

#[tokio::test]
async fn login_returns_a_token_accepted_by_me() {
    let app = TestApp::new().await;
    let hash = hash_password("hunter22").unwrap();
    create_user_with_password(&app.db, "dj_hot", Role::Dj, &hash).await;

    let response = app
        .post_json(
            "/auth/login",
            None,
            json!({ "username": "dj_hot", "password": "hunter22" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["token_type"], "Bearer");
    assert_eq!(json["expires_in"], 900);
    let token = json["access_token"].as_str().unwrap().to_string();

    let response = app.get("/auth/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let me = body_json(response).await;
    assert_eq!(me["username"], "dj_hot");
    assert_eq!(me["role"], "dj");
    assert_eq!(me["display_name"], "dj_hot display");
    assert!(me.get("password").is_none());
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    let hash = hash_password("hunter22").unwrap();
    create_user_with_password(&app.db, "dj_hot", Role::Dj, &hash).await;

    let response = app
        .post_json(
            "/auth/login",
            None,
            json!({ "username": "dj_hot", "password": "wrong" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["error"],
        "Invalid username or password"
    );
}

#[tokio::test]
async fn login_for_unknown_user_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/auth/login",
            None,
            json!({ "username": "nobody", "password": "whatever" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_of_deleted_user_is_rejected() {
    let app = TestApp::new().await;
    let artist = create_user(&app.db, "artist", Role::Artist).await;
    let token = app.token_for(&artist);

    artist.delete(&app.db).await.unwrap();
    assert!(user::Entity::find().one(&app.db).await.unwrap().is_none());

    let response = app.get("/my_submissions", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["error"], "You must be logged in to access this page.");
    assert_eq!(json["location"], "/auth/login");
}

#[tokio::test]
async fn role_change_applies_to_existing_tokens() {
    use sea_orm::{ActiveModelTrait, Set};

    let app = TestApp::new().await;
    let artist = create_user(&app.db, "artist", Role::Artist).await;
    let token = app.token_for(&artist);

    let mut demoted: user::ActiveModel = artist.into();
    demoted.role = Set(Role::Listener);
    demoted.update(&app.db).await.unwrap();

    let response = app.get("/my_submissions", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_or_garbage_token_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app.get("/auth/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.get("/dj/submissions", Some("not-a-jwt")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn home_and_api_docs_are_public() {
    let app = TestApp::new().await;

    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/api-docs/openapi.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/dj/submissions/{id}"]["patch"].is_object());
}
