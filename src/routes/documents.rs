use crate::{AppState, guard::Requirement, handlers, middleware::{Guards, enforce}};
use axum::{
    Router, middleware,
    routing::{get, put},
};

pub const DOC_READ: &str = "doc:read";
pub const DOC_WRITE: &str = "doc:write";

/// Document Router Module
///
/// Reads and writes share a path but not a requirement, so each method router
/// carries its own guard.
pub fn document_routes(guards: &Guards) -> Router<AppState> {
    let read = guards.require(Requirement::permission(DOC_READ));
    let write = guards.require(Requirement::permission(DOC_WRITE));

    Router::new()
        // GET /documents
        .route(
            "/documents",
            get(handlers::list_documents)
                .route_layer(middleware::from_fn_with_state(read.clone(), enforce)),
        )
        // GET /documents/{id}  [doc:read]
        // PUT /documents/{id}  [doc:write]
        .route(
            "/documents/{id}",
            get(handlers::get_document)
                .route_layer(middleware::from_fn_with_state(read, enforce))
                .merge(
                    put(handlers::update_document)
                        .route_layer(middleware::from_fn_with_state(write, enforce)),
                ),
        )
}
