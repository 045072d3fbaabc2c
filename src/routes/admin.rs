use crate::{
    AppState,
    guard::Requirement,
    handlers,
    middleware::{Guards, enforce},
    models::Role,
};
use axum::{Router, middleware, routing::get};

/// Admin Router Module
///
/// Nested under `/admin`. Every route is guarded by the `admin` role; handlers
/// do no role checks of their own.
pub fn admin_routes(guards: &Guards) -> Router<AppState> {
    Router::new()
        // GET /admin/users
        // The full user directory with roles and permissions.
        .route("/users", get(handlers::list_users))
        .route_layer(middleware::from_fn_with_state(
            guards.require(Requirement::role(Role::Admin)),
            enforce,
        ))
}
