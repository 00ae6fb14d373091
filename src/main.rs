//! proxops entry point.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use eframe::egui;

use proxops::app::ProxOpsApp;
use proxops::sim::SimConfig;

#[derive(Parser, Debug)]
#[command(
    name = "proxops",
    about = "Proximity-operations visualization dashboard"
)]
struct Args {
    /// State file for persistent inputs
    #[arg(long, default_value = "out/proxops_state.json")]
    state_file: PathBuf,

    /// Fixed propagation step in seconds
    #[arg(long, default_value_t = 600.0)]
    step_seconds: f64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting proxops...");

    let config = SimConfig {
        step_seconds: args.step_seconds,
        ..SimConfig::default()
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("proxops - Proximity Operations Toolkit"),
        ..Default::default()
    };

    let state_file = args.state_file;
    eframe::run_native(
        "proxops",
        options,
        Box::new(move |cc| match ProxOpsApp::new(cc, config, state_file) {
            Ok(app) => Ok(Box::new(app)),
            Err(e) => {
                log::error!("Failed to initialize app: {}", e);
                Err(e.into())
            }
        }),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {}", e))
}
