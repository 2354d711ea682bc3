use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use campfinder::{CampfinderConfig, RecommendationService, logging, web};

#[tokio::main]
async fn main() -> Result<()> {
    // Optional config file path as the only argument
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = CampfinderConfig::load_from_path(config_path)?;

    logging::init(&config.logging)?;
    tracing::info!("Starting campfinder {}", campfinder::VERSION);

    let service = RecommendationService::from_config(&config)
        .with_context(|| "Failed to build recommendation service")?;

    web::run(&config.server, Arc::new(service)).await
}
