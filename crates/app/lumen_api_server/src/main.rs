//! Lumen relay server binary.
//!
//! Serves `POST /api/chat` and the static chat page from one listener.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use lumen_api::config::{ApiConfig, load_system_prompt};
use lumen_api::services::inference::WorkersAiProvider;
use tracing::{info, warn};

/// CLI arguments for the relay server. Flags win over environment config.
#[derive(Parser, Debug)]
#[command(name = "lumen_api_server", about = "Lumen chat relay server", version)]
struct Args {
    /// Port to listen on (0 = ephemeral). Overrides the port of BIND_ADDR.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Interface to bind. Overrides the host of BIND_ADDR.
    #[arg(long)]
    host: Option<String>,

    /// Directory holding the chat page and its assets.
    #[arg(long, env = "ASSETS_DIR")]
    assets_dir: Option<PathBuf>,

    /// Model identifier.
    #[arg(long, env = "MODEL_ID")]
    model: Option<String>,

    /// Cap on generated tokens.
    #[arg(long, env = "MAX_TOKENS")]
    max_tokens: Option<u32>,

    /// File holding the system directive.
    #[arg(long, env = "SYSTEM_PROMPT_FILE")]
    system_prompt_file: Option<PathBuf>,
}

impl Args {
    fn apply(self, config: &mut ApiConfig) -> Result<(), Box<dyn std::error::Error>> {
        if self.host.is_some() || self.port.is_some() {
            let (default_host, default_port) = config
                .bind_addr
                .rsplit_once(':')
                .unwrap_or((config.bind_addr.as_str(), "8787"));
            let host = self.host.as_deref().unwrap_or(default_host);
            let port = self
                .port
                .map(|p| p.to_string())
                .unwrap_or_else(|| default_port.to_string());
            config.bind_addr = format!("{host}:{port}");
        }
        if let Some(dir) = self.assets_dir {
            config.assets_dir = dir;
        }
        if let Some(model) = self.model {
            config.model_id = model;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(path) = self.system_prompt_file {
            config.system_prompt = load_system_prompt(&path)?;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lumen_api=debug,lumen_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let mut config = ApiConfig::from_env()?;
    args.apply(&mut config)?;

    info!(
        model = %config.model_id,
        max_tokens = config.max_tokens,
        assets_dir = %config.assets_dir.display(),
        "starting lumen_api_server"
    );

    if config.provider.account_id.is_empty() || config.provider.api_token.is_empty() {
        warn!("CLOUDFLARE_ACCOUNT_ID or CLOUDFLARE_API_TOKEN unset; chat requests will fail");
    }
    if !config.assets_dir.is_dir() {
        warn!(assets_dir = %config.assets_dir.display(), "assets directory not found");
    }

    let provider = Arc::new(WorkersAiProvider::from_config(&config.provider));
    let state = lumen_api::AppState::new(config.clone(), provider);
    let app = lumen_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
