use std::path::PathBuf;

use clap::Parser;

use reclamo::{ControlPlane, load_config};

/// Prints the current metrics, health, and alert reports as JSON.
#[derive(Parser)]
#[command(name = "telemetry-snapshot")]
struct Args {
    /// Config file path; defaults to ~/.reclamo/config.yaml when present.
    #[arg(long, env = "RECLAMO_CONFIG_PATH")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let config = load_config(args.config)?;
    let plane = ControlPlane::from_config(&config);
    let ports = plane.ports();

    let out = serde_json::json!({
        "metrics": ports.telemetry.metrics(),
        "health": ports.telemetry.health(),
        "alerts": ports.telemetry.alerts(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
