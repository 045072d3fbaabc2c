use std::{env, path::PathBuf};

use crate::guard::{DenialMode, GuardOptions};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_FALLBACK_PATH: &str = "/";
pub const DEFAULT_ACCESS_CONTACT: &str = "your workspace administrator";
const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";

/// AppConfig
///
/// Immutable configuration, loaded once at startup and shared through the
/// application state.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the development header bypass and log format.
    pub env: Env,
    // HS256 secret used to validate bearer tokens.
    pub jwt_secret: String,
    pub bind_addr: String,
    // Where unauthenticated principals are sent.
    pub login_path: String,
    // Where silently denied principals are sent.
    pub fallback_path: String,
    pub denial_mode: DenialModeSetting,
    // Named on the access-denied page as the party that grants access.
    pub access_contact: String,
    // Optional JSON seed for the user directory and document catalog.
    pub seed_file: Option<PathBuf>,
}

/// Env
///
/// Runtime context: development conveniences in `Local`, hardened behaviour in `Production`.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DenialModeSetting {
    Render,
    Silent,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be set in production")]
    MissingSecret { var: &'static str },
    #[error("{var} must be an absolute path starting with '/', got {value:?}")]
    InvalidPath { var: &'static str, value: String },
    #[error("DENIAL_MODE must be `render` or `silent`, got {0:?}")]
    InvalidDenialMode(String),
}

impl Default for AppConfig {
    /// Test-safe values; no environment variables required.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            fallback_path: DEFAULT_FALLBACK_PATH.to_string(),
            denial_mode: DenialModeSetting::Render,
            access_contact: DEFAULT_ACCESS_CONTACT.to_string(),
            seed_file: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads configuration from the environment. Production refuses to start
    /// without an explicit `JWT_SECRET`.
    ///
    /// Variables: `APP_ENV`, `JWT_SECRET`, `BIND_ADDR`, `LOGIN_PATH`,
    /// `FALLBACK_PATH`, `DENIAL_MODE`, `ACCESS_CONTACT`, `SEED_FILE`.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => env::var("JWT_SECRET")
                .map_err(|_| ConfigError::MissingSecret { var: "JWT_SECRET" })?,
            Env::Local => env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
        };

        let denial_mode = match env::var("DENIAL_MODE").as_deref() {
            Err(_) | Ok("render") => DenialModeSetting::Render,
            Ok("silent") => DenialModeSetting::Silent,
            Ok(other) => return Err(ConfigError::InvalidDenialMode(other.to_string())),
        };

        Ok(Self {
            env,
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            login_path: path_var("LOGIN_PATH", DEFAULT_LOGIN_PATH)?,
            fallback_path: path_var("FALLBACK_PATH", DEFAULT_FALLBACK_PATH)?,
            denial_mode,
            access_contact: env::var("ACCESS_CONTACT")
                .unwrap_or_else(|_| DEFAULT_ACCESS_CONTACT.to_string()),
            seed_file: env::var("SEED_FILE").ok().map(PathBuf::from),
        })
    }

    /// The guard configuration shared by every protected route.
    pub fn guard_options(&self) -> GuardOptions {
        let denial_mode = match self.denial_mode {
            DenialModeSetting::Render => DenialMode::Render,
            DenialModeSetting::Silent => DenialMode::Silent {
                fallback: self.fallback_path.clone(),
            },
        };

        GuardOptions {
            login_path: self.login_path.clone(),
            denial_mode,
        }
    }
}

fn path_var(var: &'static str, default: &str) -> Result<String, ConfigError> {
    let value = env::var(var).unwrap_or_else(|_| default.to_string());
    if value.starts_with('/') {
        Ok(value)
    } else {
        Err(ConfigError::InvalidPath { var, value })
    }
}
