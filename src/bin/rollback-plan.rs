use std::path::PathBuf;

use clap::Parser;

use reclamo::{ControlPlane, load_config};

/// Prints the rollback plan from the current deployment version down to a
/// target version. Planning only; nothing is executed.
#[derive(Parser)]
#[command(name = "rollback-plan")]
struct Args {
    /// Version to roll back to; must appear in the version history.
    target: String,
    /// Config file path; defaults to ~/.reclamo/config.yaml when present.
    #[arg(long, env = "RECLAMO_CONFIG_PATH")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let config = load_config(args.config)?;
    let plane = ControlPlane::from_config(&config);

    let plan = plane.migrations().plan_rollback(&args.target)?;
    let steps: Vec<serde_json::Value> = plan
        .steps
        .iter()
        .map(|step| {
            serde_json::json!({
                "from": step.from,
                "to": step.to,
                "script": step.script.describe(),
            })
        })
        .collect();

    let out = serde_json::json!({ "plan": plan.summary(), "steps": steps });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
