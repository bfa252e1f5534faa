//! Mood meter daemon: camera, hearts meter, display panel and HTTP status endpoint.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use mood_meter::app::MoodApp;
use mood_meter::config::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Camera index to use
    #[arg(long)]
    cam: Option<i32>,

    /// Directory holding the progress images
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Directory the panel preview is written to
    #[arg(long)]
    runtime_dir: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(cam) = self.cam {
            config.camera.index = cam;
        }
        if let Some(assets) = &self.assets {
            config.display.assets_dir.clone_from(assets);
        }
        if let Some(runtime_dir) = &self.runtime_dir {
            config.display.runtime_dir.clone_from(runtime_dir);
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    // Load configuration if provided
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {e}. Using defaults.");
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    args.apply(&mut config);

    if args.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    info!("Mood Meter v{}", env!("CARGO_PKG_VERSION"));

    let app = MoodApp::new(config).context("invalid configuration")?;
    app.install_signal_handler()?;
    app.run()?;

    Ok(())
}
