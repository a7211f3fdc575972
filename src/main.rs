mod api;
mod cache;
mod insights;
mod outbound;
mod settings;
mod web;

use std::{process::exit, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    insights::InsightsSystem,
    outbound::HttpDatasetStore,
    settings::{Args, Settings},
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(error) = run().await {
        error!("{error:#}");
        exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::from_file(&args.config).with_context(|| {
        format!(
            "Problem while loading settings from {}",
            args.config.display()
        )
    })?;

    let store = HttpDatasetStore::new(&settings.store)
        .context("Problem while building the dataset client")?;
    let system = InsightsSystem::new(Arc::new(store), settings.cache.policy());

    info!("Campaign insights server");
    web::serve(api::schema(Arc::new(system)), settings.web.address).await;
    Ok(())
}
