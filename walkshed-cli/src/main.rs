//! Batch walkshed generation front-end.
//!
//! Loads a TOML configuration (overridable per flag), builds the
//! walkshed model, runs the batched pipeline, and prints the run
//! summary.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use walkshed_core::batch::RunSummary;
use walkshed_core::loading::{WalkshedConfig, create_walkshed_model};

#[derive(Parser, Debug)]
#[command(
    name = "walkshed",
    about = "Generate per-route walkshed polygons from transit stops and a pedestrian network"
)]
struct Args {
    /// TOML configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pedestrian network GeoJSON
    #[arg(long)]
    network: Option<PathBuf>,

    /// Stops GeoJSON or CSV
    #[arg(long)]
    stops: Option<PathBuf>,

    /// Output directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Walking distance budget in CRS units
    #[arg(long)]
    distance: Option<f64>,

    /// Concave hull shape parameter
    #[arg(long)]
    concave_alpha: Option<f64>,

    /// Routes per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Prefix for final artifact names
    #[arg(long)]
    output_prefix: Option<String>,

    /// Stop attribute carrying the route key
    #[arg(long)]
    route_field: Option<String>,

    /// Print the run summary as JSON instead of plain text
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let as_json = args.json;
    match execute(args) {
        Ok(summary) => {
            if as_json {
                print_summary_json(&summary);
            } else {
                print_summary(&summary);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let mut config: WalkshedConfig = match &args.config {
        Some(path) => toml::from_str(&fs::read_to_string(path)?)?,
        None => WalkshedConfig::default(),
    };

    if let Some(network) = args.network {
        config.network_path = network;
    }
    if let Some(stops) = args.stops {
        config.stops_path = stops;
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(distance) = args.distance {
        config.distance = distance;
    }
    if let Some(alpha) = args.concave_alpha {
        config.concave_alpha = alpha;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(prefix) = args.output_prefix {
        config.output_prefix = prefix;
    }
    if let Some(route_field) = args.route_field {
        config.route_field = route_field;
    }

    let model = create_walkshed_model(&config)?;
    let summary = walkshed_core::batch::run(&model, &config)?;
    Ok(summary)
}

fn print_summary_json(summary: &RunSummary) {
    let skipped: Vec<_> = summary
        .skipped
        .iter()
        .map(|s| {
            serde_json::json!({
                "route": s.route,
                "kind": s.kind,
                "reason": s.reason,
            })
        })
        .collect();
    let outputs: Vec<_> = summary.outputs.iter().map(|p| p.display().to_string()).collect();
    let body = serde_json::json!({
        "routes_total": summary.routes_total,
        "routes_succeeded": summary.routes_succeeded,
        "batches": summary.batches,
        "skipped": skipped,
        "outputs": outputs,
    });
    println!("{body}");
}

fn print_summary(summary: &RunSummary) {
    println!(
        "{} of {} routes succeeded across {} batches",
        summary.routes_succeeded, summary.routes_total, summary.batches
    );
    for skipped in &summary.skipped {
        println!(
            "  skipped route {} [{}]: {}",
            skipped.route, skipped.kind, skipped.reason
        );
    }
    for (batch, reason) in &summary.failed_batches {
        println!("  batch {batch} failed to persist: {reason}");
    }
    for output in &summary.outputs {
        println!("  wrote {}", output.display());
    }
}
