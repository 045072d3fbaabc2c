use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{DecodingKey, Validation, decode, get_current_timestamp};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    convert::Infallible,
    sync::atomic::{AtomicBool, Ordering},
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    repository::RepositoryState,
    session::{Credentials, Session, SessionState, SessionStore},
};

/// Claims
///
/// Payload expected inside a bearer JWT. Tokens are minted by the identity
/// provider; this service only validates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's id in the directory.
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
}

/// TokenSessionStore
///
/// Session store backed by the user directory.
///
/// Resolution order:
/// 1. Not yet initialized: loading session.
/// 2. `Env::Local` only: the `x-user-id` header names a directory user.
/// 3. A valid, unrevoked bearer JWT whose subject exists in the directory.
///
/// Anything else resolves to an anonymous session.
pub struct TokenSessionStore {
    repo: RepositoryState,
    env: Env,
    decoding_key: DecodingKey,
    validation: Validation,
    ready: AtomicBool,
    /// Signed-out tokens keyed to their `exp`, kept only while they could still validate.
    revoked: RwLock<HashMap<String, usize>>,
}

impl TokenSessionStore {
    pub fn new(repo: RepositoryState, config: &AppConfig) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            repo,
            env: config.env.clone(),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            ready: AtomicBool::new(false),
            revoked: RwLock::new(HashMap::new()),
        }
    }

    /// Ends the loading phase. Called once the directory has been initialized.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
        tracing::info!("session store ready");
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Number of signed-out tokens still tracked.
    pub async fn revoked_count(&self) -> usize {
        self.revoked.read().await.len()
    }

    fn decode_claims(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(error = %e, "bearer token rejected");
                None
            }
        }
    }

    async fn resolve_token(&self, token: &str) -> Option<Uuid> {
        let claims = self.decode_claims(token)?;

        if self.revoked.read().await.contains_key(token) {
            tracing::debug!("bearer token was signed out");
            return None;
        }

        Some(claims.sub)
    }
}

#[async_trait]
impl SessionStore for TokenSessionStore {
    async fn snapshot(&self, credentials: &Credentials) -> Session {
        if !self.is_ready() {
            return Session::loading();
        }

        if self.env == Env::Local {
            if let Some(user_id) = credentials.dev_user {
                if let Some(user) = self.repo.get_user(user_id).await {
                    return Session::authenticated(user);
                }
            }
        }

        let Some(token) = credentials.bearer.as_deref() else {
            return Session::anonymous();
        };

        let Some(user_id) = self.resolve_token(token).await else {
            return Session::anonymous();
        };

        // A valid token for a user removed from the directory is not a session.
        match self.repo.get_user(user_id).await {
            Some(user) => Session::authenticated(user),
            None => Session::anonymous(),
        }
    }

    async fn sign_out(&self, credentials: &Credentials) -> bool {
        let Some(token) = credentials.bearer.as_deref() else {
            return false;
        };
        // Only tokens that would still authenticate are worth remembering.
        let Some(claims) = self.decode_claims(token) else {
            return false;
        };

        // Entries past `exp` plus leeway are rejected by validation anyway.
        let now = get_current_timestamp() as usize;
        let leeway = self.validation.leeway as usize;
        let mut revoked = self.revoked.write().await;
        revoked.retain(|_, exp| exp.saturating_add(leeway) >= now);

        revoked.insert(token.to_string(), claims.exp).is_none()
    }
}

// --- Extractors ---

impl<S> FromRequestParts<S> for Credentials
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Credentials::from_headers(&parts.headers))
    }
}

/// CurrentSession
///
/// The session of the current request. Behind a guard this is the exact
/// snapshot the guard evaluated; elsewhere it is resolved from the store.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(CurrentSession(session.clone()));
        }

        let sessions = SessionState::from_ref(state);
        let credentials = Credentials::from_headers(&parts.headers);
        Ok(CurrentSession(sessions.snapshot(&credentials).await))
    }
}
