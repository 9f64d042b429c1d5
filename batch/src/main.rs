use clap::Parser;
use labour_loss_core::run_batch;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Batch conversion of hourly WBGT files to labour productivity loss
///
/// Reads every {variable}_*.json file in the input directory, evaluates the
/// low/medium/high intensity-class losses and writes productivityLoss_*.json
/// outputs. Intended to be invoked by the cluster job wrapper; aborts with a
/// non-zero exit code on the first failure, reporting the failing file and
/// grid cell.
#[derive(Parser, Debug)]
#[command(name = "labour-loss-batch")]
#[command(about = "Gridded labour productivity loss from hourly WBGT", long_about = None)]
struct Args {
    /// Directory containing the input files
    input_dir: PathBuf,

    /// Directory for the output files (created if missing)
    output_dir: PathBuf,

    /// Input variable name
    #[arg(short, long, default_value = "wbgtAdjust")]
    variable: String,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_filter: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_filter)),
        )
        .init();

    info!("input : {}", args.input_dir.display());
    info!("output: {}", args.output_dir.display());

    match run_batch(&args.input_dir, &args.output_dir, &args.variable) {
        Ok(reports) => {
            info!("processed {} file(s)", reports.len());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("batch aborted: {err}");
            ExitCode::FAILURE
        }
    }
}
