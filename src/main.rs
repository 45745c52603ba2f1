//! Hoarder CLI entrypoint.

use std::io::{self, Write};
use std::process::ExitCode;

use hoarder::telemetry::{NoopTelemetrySink, StderrJsonlTelemetrySink, TelemetrySink};
use hoarder::{HarvestError, HarvestSummary, HoarderConfig, run_harvest};
use ortho_config::OrthoConfig;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ignored = writeln!(io::stderr().lock(), "error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<(), HarvestError> {
    let config = load_config()?;
    let telemetry: Box<dyn TelemetrySink> = if config.telemetry {
        Box::new(StderrJsonlTelemetrySink)
    } else {
        Box::new(NoopTelemetrySink)
    };

    let summary = run_harvest(&config, telemetry.as_ref())?;
    write_summary(&summary)
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`HarvestError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<HoarderConfig, HarvestError> {
    HoarderConfig::load().map_err(|error| HarvestError::Configuration {
        message: error.to_string(),
    })
}

fn write_summary(summary: &HarvestSummary) -> Result<(), HarvestError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "Harvest complete: {summary}").map_err(|error| HarvestError::Io {
        message: error.to_string(),
    })
}
