use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use serde::Serialize;
use std::sync::Arc;
use ts_rs::TS;
use uuid::Uuid;

use crate::models::{Permission, Role, User};

/// Session
///
/// An immutable snapshot of the authentication state for one request.
/// Produced by a [`SessionStore`]; the guard and the access facade only read it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Session {
    pub is_authenticated: bool,
    /// True while the store is still initializing. Overrides every other field.
    pub is_loading: bool,
    pub user: Option<User>,
}

impl Session {
    /// The store has not resolved yet.
    pub fn loading() -> Self {
        Self {
            is_authenticated: false,
            is_loading: true,
            user: None,
        }
    }

    /// No (valid) credentials were presented.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: User) -> Self {
        Self {
            is_authenticated: true,
            is_loading: false,
            user: Some(user),
        }
    }

    /// Exact match against the user's single role. A missing user holds no role.
    pub fn has_role(&self, role: Role) -> bool {
        self.user.as_ref().is_some_and(|user| user.role == role)
    }

    /// Set membership against the user's permissions. A missing user holds none.
    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.user
            .as_ref()
            .is_some_and(|user| user.permissions.contains(permission))
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.name.as_str())
    }
}

/// Credentials
///
/// Whatever the client presented that the store may turn into a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Value of `Authorization: Bearer <token>`.
    pub bearer: Option<String>,
    /// Value of the development-only `x-user-id` header.
    pub dev_user: Option<Uuid>,
}

pub const DEV_USER_HEADER: &str = "x-user-id";

impl Credentials {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        let dev_user = headers
            .get(DEV_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok());

        Self { bearer, dev_user }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer: Some(token.into()),
            dev_user: None,
        }
    }
}

/// SessionStore
///
/// The sole owner of authentication state. Readers receive owned snapshots, so
/// `is_authenticated` and `user` are never observed half-updated.
///
/// Implementations must not fail: unresolvable credentials yield
/// [`Session::anonymous`].
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn snapshot(&self, credentials: &Credentials) -> Session;

    /// Ends the session identified by `credentials`. Returns false when there
    /// was nothing to end.
    async fn sign_out(&self, credentials: &Credentials) -> bool;
}

/// SessionState
///
/// Shared handle injected through the application state.
pub type SessionState = Arc<dyn SessionStore>;
