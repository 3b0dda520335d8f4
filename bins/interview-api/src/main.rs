mod ai;
mod gemini;
mod handlers;
mod metrics;
mod prompts;
mod routes;
mod speech;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use axum::Router;
use gemini::GeminiClient;
use interview_common::config::Config;
use interview_common::context::{ContextStore, MemoryContextStore};
use interview_common::redis::RedisContextStore;
use interview_grader::{Grader, GraderOptions, PistonEngine};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

pub struct AppState {
    pub config: Config,
    pub grader: Grader<PistonEngine>,
    pub contexts: ContextStore,
    pub gemini: GeminiClient,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config, contexts: ContextStore) -> Result<Self> {
        let sandbox = &config.sandbox;
        let engine = PistonEngine::new(
            sandbox.url.clone(),
            Duration::from_millis(sandbox.connect_timeout_ms),
            Duration::from_millis(sandbox.read_timeout_ms),
        )
        .context("Failed to build sandbox client")?;

        let grader = Grader::new(
            engine,
            GraderOptions {
                max_parallel: sandbox.max_parallel_tests,
                fetch_timeout: Duration::from_millis(sandbox.test_fetch_timeout_ms),
            },
        );

        Ok(Self {
            gemini: GeminiClient::new(config.gemini.clone()),
            http: reqwest::Client::new(),
            grader,
            contexts,
            config,
        })
    }
}

async fn connect_context_store(config: &Config) -> Result<ContextStore> {
    let context = &config.context;
    match &context.redis_url {
        Some(url) => {
            let store = RedisContextStore::connect(url, context.ttl_secs)
                .await
                .with_context(|| format!("Failed to connect to Redis at {}", url))?;
            Ok(ContextStore::Redis(store))
        }
        None => Ok(ContextStore::Memory(MemoryContextStore::new(
            context.capacity,
            context.ttl_secs,
        ))),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Interview API booting...");

    let config = Config::from_env().context("Invalid configuration")?;
    let contexts = connect_context_store(&config).await?;
    info!(backend = contexts.backend_name(), "Context store ready");

    if !config.azure.is_configured() {
        info!("Azure Speech not configured; /api/azure_token will answer 500");
    }

    let state = Arc::new(AppState::new(config, contexts)?);
    info!(
        sandbox = %state.grader.engine().url(),
        max_parallel = state.grader.options().max_parallel,
        gemini = state.gemini.is_configured(),
        "Grader ready"
    );

    let cors = routes::cors(&state.config.frontend_origin)?;
    let app = Router::new()
        .merge(routes::routes())
        .layer(cors)
        .with_state(state.clone());

    let addr = state.config.bind_addr.clone();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
