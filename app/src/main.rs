//! Desktop launcher for the Folio gallery.

#[allow(dead_code)]
mod config;
mod logging;

use clap::Parser;
use config::{FolioConfig, FolioConfigOverrides};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "folio", author, version, about = "Folio photography gallery")]
struct Cli {
    /// Override log level (e.g. info, debug)
    #[arg(long)]
    log_level: Option<String>,
    /// Base URL of the backend service
    #[arg(long)]
    store_url: Option<String>,
    /// Public (anon) API key of the backend service
    #[arg(long)]
    anon_key: Option<String>,
    /// Number of images to fetch right after loading
    #[arg(long)]
    thumbnails_preload: Option<usize>,
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Enable tokio console for debugging
    #[arg(long)]
    debug_console: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let overrides = FolioConfigOverrides {
        log_level: cli.log_level,
        store_url: cli.store_url,
        anon_key: cli.anon_key,
        thumbnails_preload: cli.thumbnails_preload,
        debug_console: cli.debug_console,
        ..Default::default()
    };
    let cfg = FolioConfig::load_from(cli.config).apply_overrides(&overrides);
    let _guard = logging::init(&cfg.cache_path, "folio.log", &cfg.log_level, cfg.debug_console);
    if cfg.missing_span_support() {
        tracing::warn!("trace_spans is set but this build lacks the `trace-spans` feature");
    }

    if let Err(msg) = cfg.require_store() {
        eprintln!("{}", msg);
        std::process::exit(2);
    }

    tracing::info!(store = %cfg.store_url, "Starting Folio");
    ui::run(ui::UiFlags {
        store_url: cfg.store_url.clone(),
        api_key: cfg.anon_key.clone(),
        cache_dir: cfg.cache_path.clone(),
        preload: cfg.thumbnails_preload,
    })?;
    Ok(())
}
