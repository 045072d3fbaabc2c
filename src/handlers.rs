use crate::{
    AppState,
    access::{AccessCheck, AccessQuery},
    auth::CurrentSession,
    guard::{RedirectState, Requirement},
    models::{Document, UpdateDocumentRequest, UserProfile},
    session::Credentials,
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

/// SignInContext
///
/// What the sign-in view needs to send the principal back after sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SignInContext {
    /// Always a local path; defaults to `/`.
    pub return_to: String,
    pub message: Option<String>,
}

/// Only same-origin absolute paths may be returned to; anything else would be an open redirect.
fn safe_return_path(from: &str) -> Option<&str> {
    // Browsers drop tab, CR and LF while parsing, so `/\t/host` would become `//host`.
    let local = from.starts_with('/')
        && !from.starts_with("//")
        && !from.contains('\\')
        && !from.chars().any(char::is_control);
    local.then_some(from)
}

// --- Public Handlers ---

/// sign_in_context
///
/// [Public Route] Decodes the state carried by the guard's sign-in redirect.
/// A visit without state (or with malformed state) returns the defaults.
#[utoipa::path(
    get,
    path = "/login",
    params(("from" = Option<String>, Query), ("message" = Option<String>, Query)),
    responses((status = 200, description = "Sign-in context", body = SignInContext))
)]
pub async fn sign_in_context(
    state: Result<Query<RedirectState>, QueryRejection>,
) -> Json<SignInContext> {
    let redirect = state.ok().map(|Query(state)| state);

    let return_to = redirect
        .as_ref()
        .and_then(|state| safe_return_path(&state.from))
        .unwrap_or("/")
        .to_string();

    Json(SignInContext {
        return_to,
        message: redirect.map(|state| state.message),
    })
}

/// sign_out
///
/// [Public Route] Ends the presented session. Idempotent.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 204, description = "Signed out"))
)]
pub async fn sign_out(State(state): State<AppState>, credentials: Credentials) -> StatusCode {
    if state.sessions.sign_out(&credentials).await {
        tracing::info!("session signed out");
    }
    StatusCode::NO_CONTENT
}

// --- Authenticated Handlers ---

/// get_me
///
/// [Authenticated Route] Profile of the signed-in principal.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 401, description = "No user on the session")
    )
)]
pub async fn get_me(
    CurrentSession(session): CurrentSession,
) -> Result<Json<UserProfile>, StatusCode> {
    session
        .user
        .as_ref()
        .map(|user| Json(UserProfile::from(user)))
        .ok_or(StatusCode::UNAUTHORIZED)
}

/// check_access
///
/// [Authenticated Route] Permission query for conditional affordances.
/// Answers exactly as the route guard would for the same requirement.
#[utoipa::path(
    get,
    path = "/me/access",
    params(Requirement),
    responses((status = 200, description = "Access check", body = AccessCheck))
)]
pub async fn check_access(
    CurrentSession(session): CurrentSession,
    Query(requirement): Query<Requirement>,
) -> Json<AccessCheck> {
    Json(AccessQuery::new(&session).check_access(&requirement))
}

// --- Document Handlers ---

/// list_documents
///
/// [doc:read] All documents, most recently edited first.
#[utoipa::path(
    get,
    path = "/documents",
    responses((status = 200, description = "Documents", body = [Document]))
)]
pub async fn list_documents(State(state): State<AppState>) -> Json<Vec<Document>> {
    Json(state.repo.list_documents().await)
}

/// get_document
///
/// [doc:read]
#[utoipa::path(
    get,
    path = "/documents/{id}",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Found", body = Document),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Document>, StatusCode> {
    state
        .repo
        .get_document(id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// update_document
///
/// [doc:write] Partial update of title and/or body.
#[utoipa::path(
    put,
    path = "/documents/{id}",
    request_body = UpdateDocumentRequest,
    responses(
        (status = 200, description = "Updated", body = Document),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDocumentRequest>,
) -> Result<Json<Document>, StatusCode> {
    match state.repo.update_document(id, payload).await {
        Some(document) => {
            tracing::info!(document_id = %id, "document updated");
            Ok(Json(document))
        }
        None => Err(StatusCode::NOT_FOUND),
    }
}

// --- Admin Handlers ---

/// list_users
///
/// [Admin Route] The whole user directory.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses((status = 200, description = "Users", body = [UserProfile]))
)]
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<UserProfile>> {
    let users = state.repo.list_users().await;
    Json(users.iter().map(UserProfile::from).collect())
}
