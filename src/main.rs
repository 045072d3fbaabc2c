use doc_portal::{
    AppState,
    auth::TokenSessionStore,
    config::{AppConfig, Env},
    create_router,
    repository::{InMemoryRepository, RepositoryState, Seed},
    session::SessionState,
};
use std::{process::ExitCode, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, installs logging, starts directory initialization in
/// the background and serves HTTP. Protected routes answer "pending" until the
/// directory is ready.
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {e}");
            return ExitCode::FAILURE;
        }
    };

    // RUST_LOG wins over the defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "doc_portal=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    let directory = Arc::new(InMemoryRepository::new());
    let repo = directory.clone() as RepositoryState;
    let store = Arc::new(TokenSessionStore::new(repo.clone(), &config));

    // Session store initialization is the only asynchronous boundary the guard
    // observes, through `is_loading`.
    let seed_file = config.seed_file.clone();
    let init_store = store.clone();
    tokio::spawn(async move {
        if let Some(path) = seed_file {
            match Seed::from_file(&path).await {
                Ok(seed) => directory.load(seed).await,
                // Fail closed: an empty directory resolves every credential to anonymous.
                Err(e) => tracing::error!(error = %e, "directory seed failed"),
            }
        }
        init_store.mark_ready();
    });

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(repo, store as SessionState, config));

    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %bind_addr, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Listening on {bind_addr}");
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
