//! Flowsmith CLI Application
//!
//! Command-line editor for onboarding flows built on `flowsmith-core`.

mod args;
mod cli;
mod renderer;
mod session;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use flowsmith_core::{params::ListFlows, StaticCatalog, StoreBuilder, TemplateCatalog};
use log::info;
use renderer::TerminalRenderer;
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        no_color,
        templates,
        debounce_ms,
        command,
    } = Args::parse();

    let store = StoreBuilder::new()
        .with_database_path(database_file)
        .build()
        .await
        .context("Failed to initialize flow store")?;

    let catalog: Arc<dyn TemplateCatalog> = match templates {
        Some(path) => Arc::new(
            StaticCatalog::from_json_file(&path)
                .with_context(|| format!("Failed to load templates from {}", path.display()))?,
        ),
        None => Arc::new(StaticCatalog::builtin()),
    };

    let debounce = (debounce_ms > 0).then(|| Duration::from_millis(debounce_ms));
    let cli = Cli::new(store, catalog, TerminalRenderer::new(!no_color), debounce);

    info!("Flowsmith started");

    match command {
        Some(Flow { command }) => cli.handle_flow_command(command).await,
        Some(Step { command }) => cli.handle_step_command(command).await,
        Some(Edit(args)) => cli.edit(args).await,
        Some(Templates) => cli.list_templates(),
        None => cli.list_flows(&ListFlows::default()).await,
    }
}
