use doc_portal::{
    AppConfig,
    config::{ConfigError, DenialModeSetting, Env},
    guard::DenialMode,
};
use serial_test::serial;
use std::{env, panic};

const VARS: [&str; 8] = [
    "APP_ENV",
    "JWT_SECRET",
    "BIND_ADDR",
    "LOGIN_PATH",
    "FALLBACK_PATH",
    "DENIAL_MODE",
    "ACCESS_CONTACT",
    "SEED_FILE",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` with exactly the given variables set, restoring the environment afterward.
fn run_with_env<T, R>(vars: &[(&'static str, &str)], test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> =
        VARS.iter().map(|&var| (var, env::var(var).ok())).collect();

    unsafe {
        for var in VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals {
        unsafe {
            match original_value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_production_requires_secret() {
    let result = run_with_env(&[("APP_ENV", "production")], AppConfig::load);

    assert_eq!(
        result.unwrap_err(),
        ConfigError::MissingSecret { var: "JWT_SECRET" }
    );
}

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_env(&[("APP_ENV", "local")], AppConfig::load).unwrap();

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.jwt_secret, "super-secure-test-secret-value-local");
    assert_eq!(config.login_path, "/login");
    assert_eq!(config.fallback_path, "/");
    assert_eq!(config.denial_mode, DenialModeSetting::Render);
    assert_eq!(config.seed_file, None);
    assert_eq!(config.guard_options().denial_mode, DenialMode::Render);
}

#[test]
#[serial]
fn test_app_config_silent_mode_uses_fallback() {
    let config = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("JWT_SECRET", "prod-secret"),
            ("DENIAL_MODE", "silent"),
            ("FALLBACK_PATH", "/documents"),
            ("LOGIN_PATH", "/signin"),
        ],
        AppConfig::load,
    )
    .unwrap();

    assert_eq!(config.env, Env::Production);
    let options = config.guard_options();
    assert_eq!(options.login_path, "/signin");
    assert_eq!(
        options.denial_mode,
        DenialMode::Silent {
            fallback: "/documents".to_string()
        }
    );
}

#[test]
#[serial]
fn test_app_config_rejects_bad_values() {
    let mode = run_with_env(&[("DENIAL_MODE", "loud")], AppConfig::load);
    assert_eq!(
        mode.unwrap_err(),
        ConfigError::InvalidDenialMode("loud".to_string())
    );

    let path = run_with_env(&[("LOGIN_PATH", "login")], AppConfig::load);
    assert!(matches!(
        path.unwrap_err(),
        ConfigError::InvalidPath { var: "LOGIN_PATH", .. }
    ));
}
