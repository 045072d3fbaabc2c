use crate::{AppState, guard::Requirement, handlers, middleware::{Guards, enforce}};
use axum::{Router, middleware, routing::get};

/// Authenticated Router Module
///
/// Guarded by the empty requirement: any signed-in principal passes, anonymous
/// ones are redirected to sign-in.
pub fn authenticated_routes(guards: &Guards) -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        .route("/me", get(handlers::get_me))
        // GET /me/access?role=...&permission=...
        // Permission query used by the client to show or hide affordances.
        .route("/me/access", get(handlers::check_access))
        .route_layer(middleware::from_fn_with_state(
            guards.require(Requirement::authenticated()),
            enforce,
        ))
}
