use clap::Parser;
use osm2mobsink::{Config, SizePolicy};
use std::io;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Load OSM XML data from this file
    #[arg(short, long)]
    input: String,
    /// Save the MobSink XML network to this file
    #[arg(short, long)]
    output: String,
    /// Width of the network, derived from the bounds when missing
    #[arg(long)]
    width: Option<u32>,
    /// Height of the network, derived from the bounds when missing
    #[arg(long)]
    height: Option<u32>,
    /// Default speed limit of the network
    #[arg(long)]
    speed_limit: Option<u32>,
    /// How to fill in a missing width or height
    #[arg(long, value_enum, default_value_t = SizePolicy::AspectRatio)]
    size_policy: SizePolicy,
    /// Start a new path where a way references an unknown node instead of bridging the gap
    #[arg(long)]
    split_at_gaps: bool,
    /// Write the conversion diagnostics as JSON to this file
    #[arg(long)]
    report: Option<String>,
    /// Log skipped elements
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let subscriber = FmtSubscriber::builder()
        .with_writer(io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut config = Config::new().size_policy(cli.size_policy);
    if let Some(width) = cli.width {
        config = config.width(width);
    }
    if let Some(height) = cli.height {
        config = config.height(height);
    }
    if let Some(speed_limit) = cli.speed_limit {
        config = config.speed_limit(speed_limit);
    }
    if cli.split_at_gaps {
        config = config.split_at_gaps();
    }

    info!(input = %cli.input, output = %cli.output, "Converting");
    match osm2mobsink::convert_file(&cli.input, &cli.output, &config) {
        Ok(diagnostics) => {
            info!(
                segments = diagnostics.segments,
                warnings = diagnostics.warnings.len(),
                "Conversion done"
            );
            if let Some(report) = &cli.report {
                let written = diagnostics
                    .to_json()
                    .map_err(io::Error::from)
                    .and_then(|json| std::fs::write(report, json));
                if let Err(e) = written {
                    error!("Failed to write report {}: {}", report, e);
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
