//! steplog
//!
//! Loads the step-response recording, selects every entity on the
//! `sample_time` timeline and extracts the control and velocity signals.

use anyhow::Context;
use steplog_core::config::AnalysisConfig;
use steplog_core::pipeline;
use steplog_core::plot::DisabledPlotter;
use tracing_subscriber::EnvFilter;

/// Optional configuration file, looked up in the working directory
const CONFIG_FILE: &str = "steplog.json";

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = AnalysisConfig::load_or_default(CONFIG_FILE)
        .with_context(|| format!("Failed to load {CONFIG_FILE}"))?;

    let analysis = pipeline::run(&config, &mut DisabledPlotter).with_context(|| {
        format!(
            "Failed to analyse recording {}",
            config.recording_path.display()
        )
    })?;

    println!("{:?}", analysis.table.column_names());

    let signals = &analysis.signals;
    tracing::info!(
        samples = signals.len(),
        start_s = signals.time().first().copied(),
        end_s = signals.time().last().copied(),
        mean_period_s = signals.mean_sample_period(),
        "extracted signals"
    );
    for signal in signals.signals() {
        tracing::info!(
            column = signal.name(),
            samples = signal.len(),
            missing = signal.null_count(),
            "signal"
        );
    }

    Ok(())
}
