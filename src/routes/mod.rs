pub mod auth;
pub mod dj_submissions;
pub mod home;
pub mod submissions;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::middleware::auth::auth_middleware;
use crate::middleware::role::{require_artist_submitter, require_artist_viewer, require_dj};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        home::root,
        auth::login,
        auth::me,
        submissions::new_submission,
        submissions::create_submission,
        submissions::list_sent_submissions,
        dj_submissions::list_pending_submissions,
        dj_submissions::update_submission,
    ),
    components(
        schemas(
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserProfile,
            submissions::CreateSubmissionRequest,
            submissions::NewSubmissionResponse,
            dj_submissions::UpdateSubmissionRequest,
            crate::models::submission::SubmissionResponse,
            crate::models::submission::SubmissionListItem,
            crate::models::submission::SubmissionNotice,
            crate::models::submission::UserSummary,
            crate::models::submission::AssetSummary,
            crate::models::submission::PlaylistSummary,
            crate::entities::user::Role,
            crate::entities::submission::SubmissionStatus,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "General", description = "General API information"),
        (name = "Authentication", description = "Login and current-user endpoints"),
        (name = "Submissions", description = "Artist-facing submission endpoints (artist role required)"),
        (name = "DJ Submissions", description = "DJ review queue (dj role required)")
    ),
    info(
        title = "Mixtape Drop API",
        version = "0.1.0",
        description = "Artists submit tracks to DJ mixtapes; DJs approve or reject them",
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(
                utoipa::openapi::security::Http::new(
                    utoipa::openapi::security::HttpAuthScheme::Bearer,
                ),
            ),
        );
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn create_routes(state: AppState) -> Router {
    let swagger_router: Router = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into();

    let authenticated = Router::new()
        .route("/auth/me", get(auth::me))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let artist_submit_routes = Router::new()
        .route(
            "/playlists/{playlist_id}/submissions/new",
            get(submissions::new_submission),
        )
        .route(
            "/playlists/{playlist_id}/submissions",
            post(submissions::create_submission),
        )
        .layer(middleware::from_fn(require_artist_submitter))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let artist_list_routes = Router::new()
        .route("/my_submissions", get(submissions::list_sent_submissions))
        .layer(middleware::from_fn(require_artist_viewer))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let dj_routes = Router::new()
        .route("/dj/submissions", get(dj_submissions::list_pending_submissions))
        .route("/dj/submissions/{id}", patch(dj_submissions::update_submission))
        .layer(middleware::from_fn(require_dj))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let cors = cors_layer(&state.config);

    let app_routes = Router::new()
        .route("/", get(home::root))
        .route("/auth/login", post(auth::login))
        .merge(authenticated)
        .merge(artist_submit_routes)
        .merge(artist_list_routes)
        .merge(dj_routes)
        .with_state(state);

    Router::new()
        .merge(swagger_router)
        .merge(app_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
