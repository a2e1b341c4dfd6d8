//! Traffic map renderer.
//!
//! Reads a render request, serves it from the render cache or draws it, and
//! writes the base64-encoded image.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use traffic_render::{run, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "traffic-render")]
#[command(about = "Render a traffic network graph to an image, with caching")]
struct Args {
    /// Render request payload
    #[arg(short, long, env = "TRAFFIC_INPUT", default_value = "data.json")]
    input: PathBuf,

    /// Persisted render cache
    #[arg(short, long, env = "TRAFFIC_CACHE", default_value = "cache.json")]
    cache: PathBuf,

    /// Result file, written as {"image": "<base64>"}
    #[arg(short, long, env = "TRAFFIC_OUTPUT", default_value = "result.json")]
    output: PathBuf,

    /// Load color table (JSON); the built-in table when omitted
    #[arg(long, env = "TRAFFIC_COLORS")]
    colors: Option<PathBuf>,

    /// Also write the encoded image to this file
    #[arg(long)]
    image_out: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = RunConfig {
        input: args.input,
        cache: args.cache,
        output: args.output,
        colors: args.colors,
        image_out: args.image_out,
        ..RunConfig::from_env()
    };

    info!(
        input = %config.input.display(),
        cache = %config.cache.display(),
        "Starting traffic render"
    );

    if let Err(e) = run(&config).await {
        error!(error = %e, input_error = e.is_input_error(), "Render failed");
        std::process::exit(e.exit_code());
    }

    Ok(())
}
