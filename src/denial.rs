use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    guard::{Denial, DenialReason},
    models::Role,
    session::Session,
};

/// DenialPayload
///
/// The structured input of the access-denied page. This is the only thing the
/// renderer ever sees from the guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DenialPayload {
    pub reason: DenialReason,
    pub required: String,
    pub current: Option<String>,
    pub user_name: Option<String>,
}

impl DenialPayload {
    pub fn new(denial: Denial, session: &Session) -> Self {
        Self {
            reason: denial.reason,
            required: denial.required,
            current: denial.current,
            user_name: session.user_name().map(str::to_string),
        }
    }
}

/// AccessDeniedPage
///
/// Response body of a rendered denial: the payload plus the wording derived from it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AccessDeniedPage {
    pub title: String,
    pub message: String,
    pub contact: String,
    pub denial: DenialPayload,
}

/// AccessDeniedRenderer
///
/// One-way sink for denials. Implementations turn a payload into a response and
/// never report back to the guard.
pub trait AccessDeniedRenderer: Send + Sync {
    fn render(&self, payload: DenialPayload) -> Response;
}

pub type RendererState = Arc<dyn AccessDeniedRenderer>;

/// JsonAccessDenied
///
/// Default renderer: `403 Forbidden` with an [`AccessDeniedPage`] body.
#[derive(Debug, Clone)]
pub struct JsonAccessDenied {
    contact: String,
}

impl JsonAccessDenied {
    pub fn new(contact: impl Into<String>) -> Self {
        Self {
            contact: contact.into(),
        }
    }

    pub fn page(&self, payload: DenialPayload) -> AccessDeniedPage {
        AccessDeniedPage {
            title: title(payload.reason).to_string(),
            message: explain(&payload),
            contact: format!("Contact {} to request access.", self.contact),
            denial: payload,
        }
    }
}

impl AccessDeniedRenderer for JsonAccessDenied {
    fn render(&self, payload: DenialPayload) -> Response {
        (StatusCode::FORBIDDEN, Json(self.page(payload))).into_response()
    }
}

fn title(reason: DenialReason) -> &'static str {
    match reason {
        DenialReason::Role => "Insufficient role",
        DenialReason::Permission => "Missing permission",
    }
}

/// Falls back to the raw identifier when a stored role is not one we know.
fn role_label(role: &str) -> String {
    role.parse::<Role>()
        .map(|role| role.label().to_string())
        .unwrap_or_else(|_| role.to_string())
}

fn explain(payload: &DenialPayload) -> String {
    let who = payload.user_name.as_deref().unwrap_or("this account");
    match payload.reason {
        DenialReason::Role => {
            let required = role_label(&payload.required);
            match payload.current.as_deref() {
                Some(current) => format!(
                    "This page requires the {required} role. {who} is signed in as {}.",
                    role_label(current)
                ),
                None => format!("This page requires the {required} role."),
            }
        }
        DenialReason::Permission => format!(
            "This page requires the \"{}\" permission, which {who} has not been granted.",
            payload.required
        ),
    }
}
