//! Study chat widget server
//!
//! Serves the landing page and drives one widget session per visitor.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use dotenvy::dotenv;
use tracing::info;

use study_chat_widget::{config::AppConfig, server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before anything reads the environment
    let _ = dotenv();

    telemetry::init();

    let config = AppConfig::load()?;
    info!(
        name: "config.loaded",
        host = %config.server.host,
        port = config.server.port,
        seeded = config.server.seed.is_some(),
        "Configuration loaded"
    );

    server::start_server(config).await
}
