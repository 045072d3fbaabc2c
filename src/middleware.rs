use axum::{
    Json,
    extract::{OriginalUri, Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use std::sync::Arc;

use crate::{
    denial::RendererState,
    guard::{Guard, GuardAction, GuardOptions, ReplaceRedirect, Requirement},
    session::{Credentials, SessionState},
};

/// Guards
///
/// Everything a protected router needs besides its requirement. Built once in
/// `create_router` and used to stamp out one [`RouteGuard`] per protected route.
#[derive(Clone)]
pub struct Guards {
    pub options: GuardOptions,
    pub sessions: SessionState,
    pub renderer: RendererState,
}

impl Guards {
    pub fn require(&self, requirement: Requirement) -> RouteGuard {
        RouteGuard {
            guard: Arc::new(Guard::new(requirement, self.options.clone())),
            sessions: self.sessions.clone(),
            renderer: self.renderer.clone(),
        }
    }
}

/// RouteGuard
///
/// State of the [`enforce`] middleware for one protected route.
#[derive(Clone)]
pub struct RouteGuard {
    pub guard: Arc<Guard>,
    pub sessions: SessionState,
    pub renderer: RendererState,
}

/// enforce
///
/// Route-layer middleware running the guard on every request. The wrapped
/// handler only runs on `RenderChildren`, and its response is passed through
/// untouched. The evaluated session is stored in the request extensions so the
/// handler observes the same snapshot.
pub async fn enforce(
    State(route): State<RouteGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    let credentials = Credentials::from_headers(request.headers());
    let session = route.sessions.snapshot(&credentials).await;
    let path = requested_path(&request);

    match route.guard.act(&session, &path) {
        GuardAction::ShowPending => {
            tracing::debug!(path = %path, "session pending");
            pending_response()
        }
        GuardAction::RenderChildren => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        GuardAction::Redirect(redirect) => {
            tracing::info!(
                path = %path,
                location = %redirect.location,
                authenticated = session.is_authenticated,
                "guard redirect"
            );
            redirect.into_response()
        }
        GuardAction::RenderAccessDenied(payload) => {
            tracing::warn!(
                path = %path,
                reason = ?payload.reason,
                required = %payload.required,
                user = payload.user_name.as_deref().unwrap_or("-"),
                "access denied"
            );
            route.renderer.render(payload)
        }
    }
}

/// The path the client asked for, including the query string. Nested routers
/// see a stripped URI, so the original one is preferred.
fn requested_path(request: &Request) -> String {
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri)
        .unwrap_or_else(|| request.uri());

    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Neutral "not yet" response: the client keeps its loading indicator and retries.
pub fn pending_response() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::RETRY_AFTER, "1")],
        Json(json!({ "status": "pending" })),
    )
        .into_response()
}

impl ReplaceRedirect {
    /// Location with the typed state encoded as query parameters.
    pub fn href(&self) -> String {
        let Some(state) = &self.state else {
            return self.location.clone();
        };

        match serde_urlencoded::to_string(state) {
            Ok(query) => {
                let separator = if self.location.contains('?') { '&' } else { '?' };
                format!("{}{separator}{query}", self.location)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to encode redirect state");
                self.location.clone()
            }
        }
    }
}

impl IntoResponse for ReplaceRedirect {
    /// `303 See Other`: the client replaces the protected request instead of
    /// keeping it as a history entry.
    fn into_response(self) -> Response {
        Redirect::to(&self.href()).into_response()
    }
}
