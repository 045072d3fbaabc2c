use axum::{Router, extract::FromRef, http::HeaderName};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Access control core.
pub mod access;
pub mod denial;
pub mod guard;
pub mod middleware;
pub mod session;

// Collaborators and services.
pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod repository;

pub mod routes;
use routes::{admin, authenticated, documents, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use denial::{AccessDeniedRenderer, JsonAccessDenied, RendererState};
pub use guard::{Decision, Guard, GuardAction, Requirement};
pub use repository::{InMemoryRepository, RepositoryState};
pub use session::{Session, SessionState, SessionStore};

/// ApiDoc
///
/// OpenAPI document for every route, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::sign_in_context, handlers::sign_out, handlers::get_me,
        handlers::check_access, handlers::list_documents, handlers::get_document,
        handlers::update_document, handlers::list_users
    ),
    components(
        schemas(
            models::Role, models::Permission, models::User, models::UserProfile,
            models::Document, models::UpdateDocumentRequest, guard::Requirement,
            guard::DenialReason, guard::Denial, guard::RedirectState,
            denial::DenialPayload, denial::AccessDeniedPage, access::AccessCheck,
            handlers::SignInContext,
        )
    ),
    tags(
        (name = "doc-portal", description = "Document portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, cheaply cloneable container for every service a handler may need.
#[derive(Clone)]
pub struct AppState {
    /// User directory and document catalog.
    pub repo: RepositoryState,
    /// The session store collaborator; the only source of authentication state.
    pub sessions: SessionState,
    /// Presentation of denials.
    pub renderer: RendererState,
    pub config: AppConfig,
}

impl AppState {
    /// State with the default JSON access-denied renderer.
    pub fn new(repo: RepositoryState, sessions: SessionState, config: AppConfig) -> Self {
        let renderer = Arc::new(JsonAccessDenied::new(config.access_contact.clone()));
        Self {
            repo,
            sessions,
            renderer,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure. Each protected router gets its own guard
/// built from the shared [`middleware::Guards`]; the global layers wrap
/// everything, guards included.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let guards = middleware::Guards {
        options: state.config.guard_options(),
        sessions: state.sessions.clone(),
        renderer: state.renderer.clone(),
    };

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes(&state.config.login_path))
        .merge(authenticated::authenticated_routes(&guards))
        .merge(documents::document_routes(&guards))
        .nest("/admin", admin::admin_routes(&guards))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Request span carrying the request id, so every guard log line of one
/// request is correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
