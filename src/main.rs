pub mod chart;
pub mod config;
pub mod controls;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod filter;
pub mod map;
pub mod render;
pub mod server;
pub mod types;

#[cfg(test)]
mod testutil;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the interactive dashboard
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Render the dashboard page once and write it to a file
    Render {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(short, long, value_name = "FILE", default_value = "dashboard.html")]
        out: PathBuf,
        /// Basemap name, e.g. "OpenStreetMap"
        #[arg(long)]
        basemap: Option<String>,
        /// Column for the value-count chart
        #[arg(long)]
        variable: Option<String>,
        /// Show two basemaps side by side
        #[arg(long)]
        split: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            info!("Serving dashboard with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(&config)?;
            server::start_server(app_config).await?;
        }
        Commands::Render {
            config,
            out,
            basemap,
            variable,
            split,
        } => {
            info!("Rendering dashboard with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(&config)?;

            let params = controls::ControlParams {
                basemap,
                variable,
                split: split.then(|| "on".to_string()),
            };
            let ctx = controls::RenderContext::resolve(&params, &app_config.chart)?;
            let client = reqwest::Client::new();

            let (html, failure) = match dashboard::build(&app_config, &client, &ctx).await {
                Ok(dashboard) => (render::dashboard_page(&app_config.dashboard, &dashboard), None),
                Err(e) => (render::failure_page(&app_config.dashboard, &e), Some(e)),
            };

            std::fs::write(&out, html)
                .with_context(|| format!("Failed to write page: {:?}", out))?;
            info!("Wrote {:?}", out);

            if let Some(e) = failure {
                return Err(e.into());
            }
        }
    }

    Ok(())
}
