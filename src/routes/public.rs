use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Unguarded endpoints. The sign-in route is where the guard sends anonymous
/// principals, so it must never be protected itself.
pub fn public_routes(login_path: &str) -> Router<AppState> {
    Router::new()
        // GET /health
        .route("/health", get(|| async { "ok" }))
        // GET /login?from=...&message=...
        // Decodes the redirect state so the client can return to `from` after sign-in.
        .route(login_path, get(handlers::sign_in_context))
        // POST /logout
        .route("/logout", post(handlers::sign_out))
}
