/*
pitchside - single-binary main.rs
This binary loads configuration, wires the subscription store and the news gateway,
and serves them over the Rocket HTTP server.
*/

use anyhow::{Context, Result};
use clap::Parser;
use common::{Config, LlmConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use pitchside::llm::remote::RemoteLlmProvider;
use pitchside::llm::LlmProvider;
use pitchside::news::NewsGateway;
use pitchside::server::{launch_rocket, AppState};
use pitchside::storage::JsonFileStorage;
use pitchside::subscriptions::SubscriptionStore;

#[derive(Parser, Debug)]
#[command(name = "pitchside", about = "Pitchside football subscriptions and news server")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Override server.bind
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Override server.port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() {
            Some(p)
        } else {
            None
        }
    };

    let mut config = match Config::load_with_defaults(
        Some(default_path.as_path()),
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %format!("{:#}", e), "failed to load configuration");
            return Err(e);
        }
    };
    info!(default_file = ?default_path, override_file = ?override_path, "configuration loaded");

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let storage = JsonFileStorage::new(&config.store.path);
    info!(path = %storage.path().display(), "subscription store");
    let store = SubscriptionStore::new(Arc::new(storage));

    let gateway = match create_llm_provider(&config.llm) {
        Ok(provider) => {
            info!(model = provider.model(), url = config.llm.api_url(), "LLM provider initialized");
            Some(NewsGateway::new(provider))
        }
        Err(e) => {
            warn!(error = %format!("{:#}", e), "news gateway disabled");
            None
        }
    };

    launch_rocket(AppState::new(store, gateway), &config.server).await?;

    info!("Shutdown complete");
    Ok(())
}

/// Create the chat-completion provider; fails when the API key env var is unset.
fn create_llm_provider(llm_config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    let api_key_env = llm_config.api_key_env();
    let api_key = std::env::var(api_key_env)
        .with_context(|| format!("LLM API key env var '{}' not set", api_key_env))?;

    let provider = RemoteLlmProvider::new(llm_config.api_url(), api_key, llm_config.model())
        .with_defaults(
            llm_config.timeout_seconds,
            NewsGateway::NEWS_MAX_TOKENS,
            llm_config.temperature,
        );
    Ok(Arc::new(provider))
}
