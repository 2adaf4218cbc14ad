mod analysis;
mod archive;
mod auth;
mod config;
mod cover_letter;
mod db;
mod errors;
mod extract;
mod intake;
mod llm_client;
mod matching;
mod models;
mod render;
mod resumes;
mod routes;
mod state;
mod store;
mod throttle;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::archive::{FileArchive, NoopArchive, S3Archive};
use crate::auth::supabase::SupabaseAuth;
use crate::config::Config;
use crate::db::create_pool;
use crate::intake::extractor::TextExtractor;
use crate::intake::ocr::TesseractCli;
use crate::llm_client::gemini::GeminiBackend;
use crate::llm_client::prompts::PromptSet;
use crate::llm_client::LlmClient;
use crate::render::pdf::ChromiumPdf;
use crate::render::templates::TemplateFiller;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgStore;
use crate::throttle::{AnonThrottle, MemoryThrottle, RedisThrottle, Throttle};

#[tokio::main]
async fn main() -> Result<()> {
    // Fails fast on missing required env vars
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume API v{} ({})", env!("CARGO_PKG_VERSION"), config.app_env);

    // PostgreSQL (migrations run on connect)
    let db = create_pool(&config.database_url).await?;

    // AI gateway and prompts
    let backend = GeminiBackend::new(
        config.gemini_api_key.clone(),
        &config.gemini_model,
        &config.gemini_base_url,
    )?;
    let llm = LlmClient::new(Arc::new(backend), config.ai);
    let prompts = PromptSet::load(config.prompts_dir.as_deref())?;
    info!(
        "LLM client initialized (model: {}, max concurrency: {})",
        config.gemini_model, config.ai.max_concurrency
    );

    let identity = SupabaseAuth::new(&config.supabase_url, config.supabase_anon_key.clone())?;
    let extractor = TextExtractor::new(Arc::new(TesseractCli::new(config.tesseract_bin.clone())));
    let templates = TemplateFiller::load(config.templates_dir.as_deref())?;
    let pdf = ChromiumPdf::new(config.chrome_bin.clone(), config.render_timeout);

    // Original uploads go to S3 / MinIO when configured
    let archive: Arc<dyn FileArchive> = match &config.s3 {
        Some(s3) => {
            info!("Archiving uploads to S3 bucket '{}'", s3.bucket);
            Arc::new(S3Archive::connect(s3).await)
        }
        None => {
            info!("S3 not configured, uploads are not archived");
            Arc::new(NoopArchive)
        }
    };

    // Anonymous analyze limit, shared across instances when Redis is available
    let throttle_backend: Arc<dyn Throttle> = match &config.redis_url {
        Some(url) => {
            info!("Anonymous throttle backed by Redis");
            Arc::new(RedisThrottle::new(url)?)
        }
        None => {
            info!("Anonymous throttle kept in process memory");
            Arc::new(MemoryThrottle::default())
        }
    };
    let anon_throttle = AnonThrottle::new(
        throttle_backend,
        config.anon_analyze_limit,
        config.anon_analyze_window,
    );

    // Build app state
    let state = AppState {
        store: Arc::new(PgStore::new(db)),
        llm,
        prompts: Arc::new(prompts),
        identity: Arc::new(identity),
        extractor,
        templates: Arc::new(templates),
        pdf: Arc::new(pdf),
        archive,
        anon_throttle,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
