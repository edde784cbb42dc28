//! Binary entry point: environment configuration and server startup.
//!
//! Configuration comes from the environment:
//!
//! - `PROMPTJAM_ADDR`: listen address (default `0.0.0.0:8080`)
//! - `PROMPTJAM_LEVELS`: level catalog path (default `levels.json`)
//! - `GEMINI_API_KEY`: judge credentials; without it every round takes
//!   the fallback ranking path
//! - `GEMINI_MODEL`: judge model override

use std::sync::Arc;

use promptjam::PromptJamServer;
use promptjam_judge::{GeminiConfig, GeminiJudge};
use promptjam_room::LevelCatalog;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,promptjam=info".into()),
        )
        .with_target(false)
        .init();

    let levels_path =
        std::env::var("PROMPTJAM_LEVELS").unwrap_or_else(|_| "levels.json".to_string());
    let bind_addr =
        std::env::var("PROMPTJAM_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let catalog = Arc::new(LevelCatalog::load(&levels_path)?);
    tracing::info!(
        path = %levels_path,
        packs = catalog.names().len(),
        "level catalog loaded"
    );

    let api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        tracing::warn!("GEMINI_API_KEY is not set; every round will use the fallback ranking");
    }
    let mut gemini = GeminiConfig::new(api_key);
    if let Ok(model) = std::env::var("GEMINI_MODEL") {
        gemini = gemini.with_model(model);
    }
    let judge = GeminiJudge::new(gemini)?;

    let server = PromptJamServer::<GeminiJudge>::builder()
        .bind(&bind_addr)
        .build(catalog, judge)
        .await?;
    tracing::info!(addr = %bind_addr, "PromptJam listening");
    server.run().await?;
    Ok(())
}
