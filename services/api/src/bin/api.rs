//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{GeminiQuizAdapter, GeminiTutorAdapter, MemoryStore, PgStore},
    config::Config,
    error::ApiError,
    web::{build_router, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use lingo_core::ports::{QuizGenerationService, RecordStore, TutorService};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Choose the Record Store ---
    let store: Arc<dyn RecordStore> = match &config.database_url {
        Some(url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(config.store_timeout)
                .connect(url)
                .await?;
            let pg_store = PgStore::new(db_pool);
            info!("Running database migrations...");
            pg_store.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(pg_store)
        }
        None => {
            warn!("DATABASE_URL is not set; records are kept in memory and lost on exit");
            Arc::new(MemoryStore::with_seed_vocabulary())
        }
    };

    // --- 3. Initialize the Generative Adapters ---
    let (tutor, quiz): (
        Option<Arc<dyn TutorService>>,
        Option<Arc<dyn QuizGenerationService>>,
    ) = match &config.gemini_api_key {
        Some(key) => {
            let openai_config = OpenAIConfig::new()
                .with_api_base(config.gemini_base_url.clone())
                .with_api_key(key.clone());
            let client = Client::with_config(openai_config);
            (
                Some(Arc::new(GeminiTutorAdapter::new(
                    client.clone(),
                    config.chat_model.clone(),
                ))),
                Some(Arc::new(GeminiQuizAdapter::new(
                    client,
                    config.quiz_model.clone(),
                ))),
            )
        }
        None => {
            warn!("GEMINI_API_KEY is not set; chat and quiz endpoints are disabled");
            (None, None)
        }
    };

    // --- 4. Build the Shared AppState and Router ---
    let app_state = Arc::new(AppState::new(store, config.clone(), tutor, quiz));
    let app = build_router(app_state)?;

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
