//! placetree Engine - Main entry point.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use placetree_engine::infrastructure::config::EngineConfig;
use placetree_engine::infrastructure::seed_file::load_seed_file;
use placetree_engine::use_cases::apply_seed;
use placetree_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "placetree_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting placetree engine");

    let config = EngineConfig::from_env();
    tracing::info!(
        max_depth = config.max_depth,
        query_cache = config.query_cache,
        seed_file = ?config.seed_file,
        "Loaded configuration"
    );

    let app = App::new(config);

    let Some(seed_path) = app.config.seed_file.clone() else {
        tracing::info!("No PLACETREE_SEED_FILE configured, nothing to load");
        return Ok(());
    };

    let entries = load_seed_file(&seed_path)
        .await
        .with_context(|| format!("reading seed file {}", seed_path.display()))?;
    let summary = apply_seed(&app.hierarchy, entries)
        .await
        .context("applying seed")?;

    for (level, count) in &summary.by_level {
        tracing::info!(admin_level = level, count, "Locations per admin level");
    }
    for (root, count) in &summary.by_root {
        tracing::info!(root = %root, count, "Locations per tree");
    }
    let enabled = app.hierarchy.enabled_compound_names().await?;
    tracing::info!(
        total = summary.created,
        enabled = enabled.len(),
        "Seed loaded"
    );

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
