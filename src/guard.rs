use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

use crate::{
    denial::DenialPayload,
    models::{Permission, Role},
    session::Session,
};

/// Message carried to the sign-in view when an anonymous principal is turned away.
pub const SIGN_IN_MESSAGE: &str = "Please sign in to continue.";

// --- Policy ---

/// Requirement
///
/// The access policy declared for a protected route. Neither field set means
/// "any authenticated user". When both are set the role is checked first.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, IntoParams,
)]
#[into_params(parameter_in = Query)]
#[ts(export)]
pub struct Requirement {
    pub role: Option<Role>,
    pub permission: Option<Permission>,
}

impl Requirement {
    pub fn authenticated() -> Self {
        Self::default()
    }

    pub fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            permission: None,
        }
    }

    pub fn permission(permission: impl Into<Permission>) -> Self {
        Self {
            role: None,
            permission: Some(permission.into()),
        }
    }
}

// --- Decisions ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum DenialReason {
    Role,
    Permission,
}

/// Denial
///
/// Which check failed. `current` is the user's role on a role denial and
/// always `None` on a permission denial: held permissions are not disclosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Denial {
    pub reason: DenialReason,
    pub required: String,
    pub current: Option<String>,
}

/// RedirectState
///
/// Typed state attached to the sign-in redirect so the sign-in view can send
/// the principal back to `from` afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RedirectState {
    pub from: String,
    pub message: String,
}

/// Decision
///
/// Exactly one is produced per evaluation of a settled session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "decision", rename_all = "camelCase")]
#[ts(export)]
pub enum Decision {
    Allow,
    RedirectUnauthenticated(RedirectState),
    Deny(Denial),
}

/// Evaluation
///
/// `Pending` is not a decision: the caller shows a neutral loading state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    Pending,
    Decided(Decision),
}

/// Role and permission checks shared by the guard and the access facade.
pub fn authorize(requirement: &Requirement, session: &Session) -> Result<(), Denial> {
    if let Some(role) = requirement.role {
        if !session.has_role(role) {
            return Err(Denial {
                reason: DenialReason::Role,
                required: role.as_str().to_string(),
                current: session
                    .user
                    .as_ref()
                    .map(|user| user.role.as_str().to_string()),
            });
        }
    }

    if let Some(permission) = &requirement.permission {
        if !session.has_permission(permission) {
            return Err(Denial {
                reason: DenialReason::Permission,
                required: permission.to_string(),
                current: None,
            });
        }
    }

    Ok(())
}

/// Evaluates `requirement` against `session` for a request to `requested_path`.
///
/// Order is fixed and short-circuits: loading, then authentication, then
/// role, then permission.
pub fn evaluate(requirement: &Requirement, session: &Session, requested_path: &str) -> Evaluation {
    if session.is_loading {
        return Evaluation::Pending;
    }

    if !session.is_authenticated {
        return Evaluation::Decided(Decision::RedirectUnauthenticated(RedirectState {
            from: requested_path.to_string(),
            message: SIGN_IN_MESSAGE.to_string(),
        }));
    }

    match authorize(requirement, session) {
        Ok(()) => Evaluation::Decided(Decision::Allow),
        Err(denial) => Evaluation::Decided(Decision::Deny(denial)),
    }
}

// --- Guard ---

/// DenialMode
///
/// What a denial turns into. `Render` hands the payload to the access-denied
/// renderer; `Silent` sends the principal to `fallback` instead.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DenialMode {
    #[default]
    Render,
    Silent {
        fallback: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardOptions {
    pub login_path: String,
    pub denial_mode: DenialMode,
}

impl Default for GuardOptions {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            denial_mode: DenialMode::Render,
        }
    }
}

/// ReplaceRedirect
///
/// A navigation that replaces the current one: the protected page never
/// becomes a history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceRedirect {
    pub location: String,
    pub state: Option<RedirectState>,
}

/// GuardAction
///
/// The instruction handed to the caller for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardAction {
    ShowPending,
    RenderChildren,
    Redirect(ReplaceRedirect),
    RenderAccessDenied(DenialPayload),
}

/// Guard
///
/// A requirement bound to its configuration. Built once per protected route
/// and evaluated fresh on every request.
#[derive(Debug, Clone)]
pub struct Guard {
    requirement: Requirement,
    options: GuardOptions,
}

impl Guard {
    pub fn new(requirement: Requirement, options: GuardOptions) -> Self {
        Self {
            requirement,
            options,
        }
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    pub fn options(&self) -> &GuardOptions {
        &self.options
    }

    pub fn evaluate(&self, session: &Session, requested_path: &str) -> Evaluation {
        evaluate(&self.requirement, session, requested_path)
    }

    /// Evaluates and maps the outcome onto what the caller must do.
    pub fn act(&self, session: &Session, requested_path: &str) -> GuardAction {
        let decision = match self.evaluate(session, requested_path) {
            Evaluation::Pending => return GuardAction::ShowPending,
            Evaluation::Decided(decision) => decision,
        };

        match decision {
            Decision::Allow => GuardAction::RenderChildren,
            Decision::RedirectUnauthenticated(state) => GuardAction::Redirect(ReplaceRedirect {
                location: self.options.login_path.clone(),
                state: Some(state),
            }),
            Decision::Deny(denial) => match &self.options.denial_mode {
                DenialMode::Render => {
                    GuardAction::RenderAccessDenied(DenialPayload::new(denial, session))
                }
                DenialMode::Silent { fallback } => GuardAction::Redirect(ReplaceRedirect {
                    location: fallback.clone(),
                    state: None,
                }),
            },
        }
    }
}
