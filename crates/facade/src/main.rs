//! noisy-reach: print a reach report with differentially private noise.

use clap::Parser;
use eyre::{Result, WrapErr};
use tracing::info;
use tracing_subscriber::EnvFilter;

use reach_privacy::cli::Cli;
use reach_privacy::{run_report, NoiseKey};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.resolve().wrap_err("invalid report configuration")?;

    let (key, seed) = match config.seed {
        Some(seed) => (NoiseKey::new(seed), seed),
        None => NoiseKey::from_entropy(),
    };
    info!(
        seed,
        mechanism = %config.mechanism,
        epsilon = config.epsilon,
        delta = config.effective_delta(),
        sensitivity = config.sensitivity,
        trials = config.trials,
        "privatizing reach report"
    );

    let reports = run_report(&config, key).wrap_err("failed to privatize report")?;

    println!("Noisy Reach Report with {} noise:", config.mechanism);
    for (i, report) in reports.iter().enumerate() {
        if reports.len() > 1 {
            println!("--- trial {} (scale {:.4}) ---", i + 1, report.scale());
        }
        print!("{report}");
    }
    Ok(())
}
