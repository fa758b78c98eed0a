pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::services::file_service::FileService;
use crate::services::storage::BlobStore;
use crate::store::RecordStore;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::users::me,
        api::handlers::users::search_users,
        api::handlers::files::upload_file,
        api::handlers::files::list_files,
        api::handlers::files::get_file,
        api::handlers::files::update_file,
        api::handlers::files::delete_file,
        api::handlers::files::download_file,
        api::handlers::shares::grant_share,
        api::handlers::shares::revoke_share,
        api::handlers::dashboard::summary,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::auth::RegisterRequest,
            api::handlers::auth::LoginRequest,
            api::handlers::auth::AuthResponse,
            api::handlers::files::FileDetailsResponse,
            api::handlers::files::UploadForm,
            api::handlers::shares::GrantShareRequest,
            api::handlers::health::HealthResponse,
            models::User,
            models::UserSummary,
            models::AccessLevel,
            models::FileRecord,
            models::FileWithOwner,
            models::Share,
            models::ShareWithUser,
            models::FilePatch,
            models::Pagination,
            models::FilePage,
            models::DashboardSummary,
        )
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User lookup endpoints"),
        (name = "files", description = "File management endpoints"),
        (name = "shares", description = "Per-user file sharing endpoints"),
        (name = "system", description = "Health and diagnostics")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub store: RecordStore,
    pub storage: Arc<dyn BlobStore>,
    pub files: Arc<FileService>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: SqlitePool, storage: Arc<dyn BlobStore>, config: AppConfig) -> Self {
        let store = RecordStore::new(db.clone());
        let files = Arc::new(FileService::new(
            store.clone(),
            storage.clone(),
            config.clone(),
        ));
        Self {
            db,
            store,
            storage,
            files,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/register", post(api::handlers::auth::register))
        .route("/login", post(api::handlers::auth::login))
        .route(
            "/me",
            get(api::handlers::users::me).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::require_auth,
            )),
        )
        .route(
            "/users",
            get(api::handlers::users::search_users).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::require_auth,
            )),
        )
        .route(
            "/dashboard",
            get(api::handlers::dashboard::summary).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::require_auth,
            )),
        )
        .route(
            "/files",
            get(api::handlers::files::list_files)
                .post(api::handlers::files::upload_file)
                .layer(axum::extract::DefaultBodyLimit::max(
                    // Multipart framing overhead on top of the payload cap.
                    state.config.max_file_size + 1024 * 1024,
                ))
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::require_auth,
                )),
        )
        .route(
            "/files/:id",
            get(api::handlers::files::get_file)
                .patch(api::handlers::files::update_file)
                .delete(api::handlers::files::delete_file)
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::identify,
                )),
        )
        .route(
            "/files/:id/download",
            get(api::handlers::files::download_file).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::identify,
            )),
        )
        .route(
            "/files/:id/shares",
            post(api::handlers::shares::grant_share).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::require_auth,
            )),
        )
        .route(
            "/files/:id/shares/:user_id",
            delete(api::handlers::shares::revoke_share).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::require_auth,
            )),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
