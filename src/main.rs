use clap::Parser;
use housekeep::cli::{Cli, run_cli};
use housekeep::config::HousekeepConfig;
use housekeep::logger::{Logger, TracingLogger, init_logging};
use housekeep::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match HousekeepConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            OutputFormatter::error(&format!("Error loading configuration: {}", e));
            return ExitCode::FAILURE;
        }
    };

    // A missing log file only costs the file sink; the warning is already logged.
    let _ = init_logging(&cli.log_settings(&config));
    let logger = TracingLogger;

    match run_cli(&cli, &config, &logger) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger.error(&format!("Operation failed: {}", e));
            if !cli.quiet {
                OutputFormatter::error(&e.to_string());
            }
            ExitCode::FAILURE
        }
    }
}
