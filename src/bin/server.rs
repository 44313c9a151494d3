//! HTTP Server for the Text to SQL page

use std::sync::Arc;
use text2sql::config::Config;
use text2sql::llm::LlmClient;
use text2sql::pipeline::Pipeline;
use text2sql::server::serve;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let llm = LlmClient::from_config(&config)?;
    info!("Using model {}", llm.model());

    if !config.database_path.exists() {
        warn!(
            "Database {} not found - run `text2sql seed` first",
            config.database_path.display()
        );
    }
    if !config.read_only_guard {
        warn!("Read-only guard disabled - generated SQL runs with write access");
    }

    let pipeline = Arc::new(Pipeline::from_config(llm, &config));
    serve(pipeline, &config.bind_addr).await?;
    Ok(())
}
