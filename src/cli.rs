//! Command-line interface module for housekeep.
//!
//! This module handles:
//! - Argument parsing (clap derive)
//! - Mapping subcommands onto engine policies
//! - Rendering results as text or JSON

use crate::config::{CleanupSettings, HousekeepConfig};
use crate::daily::{DAILY_STEPS, DailyOptions, run_daily_cleanup};
use crate::error::Result;
use crate::logger::{LogSettings, Logger, Verbosity};
use crate::output::OutputFormatter;
use crate::policy::{EngineOptions, Policy, PolicyEngine, PolicyOutcome};
use crate::report::SystemReport;
use crate::system;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SECONDS_PER_DAY: u64 = 86_400;
const BYTES_PER_MB: u64 = 1024 * 1024;

/// Filesystem housekeeping for Linux hosts.
#[derive(Debug, Parser)]
#[command(name = "housekeep", version, about)]
pub struct Cli {
    /// Configuration file (defaults to .housekeeprc.toml, then ~/.config/housekeep/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for the daily log file
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log to the console only
    #[arg(long, global = true)]
    pub no_log_file: bool,

    /// Suppress the report and informational logging
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable debug logging on the console
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Show what would change without modifying anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Move files into subdirectories named after their extension
    Organize {
        /// Directory whose files are organized
        dir: PathBuf,
    },
    /// Remove empty directories, deepest first
    CleanEmpty {
        dir: PathBuf,
        /// Only consider the top level (removes nothing)
        #[arg(long)]
        no_recursive: bool,
    },
    /// Delete files older than a number of days
    CleanOld {
        dir: PathBuf,
        /// Age threshold in days [default: from config, 30]
        #[arg(long)]
        days: Option<u64>,
    },
    /// Change permission bits
    Chmod {
        /// File or directory to change
        target: PathBuf,
        /// Octal mode, e.g. 755 or 0o644
        #[arg(value_parser = parse_mode)]
        mode: u32,
        /// Apply to everything below a directory target
        #[arg(short, long)]
        recursive: bool,
    },
    /// List files larger than a size threshold
    FindLarge {
        dir: PathBuf,
        /// Threshold in MB [default: from config, 100]
        #[arg(long)]
        min_mb: Option<u64>,
    },
    /// Run the daily cleanup: old files, empty directories, disk usage
    Daily {
        /// Target directory [default: from config, /tmp]
        #[arg(short, long)]
        target: Option<PathBuf>,
        /// Age threshold in days [default: from config, 30]
        #[arg(long)]
        days: Option<u64>,
    },
    /// Show disk usage and host information
    Report,
    /// Look up running processes by name
    Process { name: String },
}

impl Command {
    /// The engine policy and root path for policy-backed subcommands.
    pub fn policy(&self, defaults: &CleanupSettings) -> Option<(Policy, &Path)> {
        match self {
            Command::Organize { dir } => Some((Policy::OrganizeByExtension, dir.as_path())),
            Command::CleanEmpty { dir, no_recursive } => Some((
                Policy::CleanupEmptyDirs {
                    recursive: !no_recursive,
                },
                dir.as_path(),
            )),
            Command::CleanOld { dir, days } => Some((
                Policy::CleanupOldFiles {
                    max_age: days_to_duration(days.unwrap_or(defaults.max_age_days)),
                },
                dir.as_path(),
            )),
            Command::Chmod {
                target,
                mode,
                recursive,
            } => Some((
                Policy::ChangePermissions {
                    mode: *mode,
                    recursive: *recursive,
                },
                target.as_path(),
            )),
            Command::FindLarge { dir, min_mb } => Some((
                Policy::FindLargeFiles {
                    min_size: min_mb
                        .unwrap_or(defaults.large_file_mb)
                        .saturating_mul(BYTES_PER_MB),
                },
                dir.as_path(),
            )),
            Command::Daily { .. } | Command::Report | Command::Process { .. } => None,
        }
    }
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// Logging settings from flags, falling back to the configuration.
    pub fn log_settings(&self, config: &HousekeepConfig) -> LogSettings {
        let log_dir = if self.no_log_file || !config.logging.enabled {
            None
        } else {
            Some(
                self.log_dir
                    .clone()
                    .unwrap_or_else(|| config.logging.log_dir.clone()),
            )
        };
        LogSettings {
            verbosity: self.verbosity(),
            log_dir,
        }
    }

    fn show_text(&self) -> bool {
        !self.quiet && !self.json
    }
}

/// Parses an octal permission mode (`755`, `0755` or `0o755`).
pub fn parse_mode(value: &str) -> std::result::Result<u32, String> {
    let digits = value
        .strip_prefix("0o")
        .or_else(|| value.strip_prefix("0O"))
        .unwrap_or(value);
    let mode = u32::from_str_radix(digits, 8)
        .map_err(|_| format!("'{value}' is not an octal mode"))?;
    if mode > crate::policy::MAX_MODE {
        return Err(format!("'{value}' exceeds 7777"));
    }
    Ok(mode)
}

fn days_to_duration(days: u64) -> Duration {
    Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY))
}

/// Runs the parsed command.
///
/// Per-entry failures are reported but do not make this return an error;
/// only operation-level failures (missing root, bad configuration) do.
pub fn run_cli(cli: &Cli, config: &HousekeepConfig, logger: &dyn Logger) -> Result<()> {
    let options = EngineOptions {
        dry_run: cli.dry_run,
        filters: config.filters.compile()?,
    };

    if let Some((policy, root)) = cli.command.policy(&config.cleanup) {
        let engine = PolicyEngine::with_options(logger, options);
        let outcome = engine.run(&policy, root)?;
        render_outcome(cli, &policy, &outcome);
        return Ok(());
    }

    match &cli.command {
        Command::Daily { target, days } => {
            let target = target.as_deref().unwrap_or(&config.cleanup.target);
            let daily_options = DailyOptions {
                max_age: days_to_duration(days.unwrap_or(config.cleanup.max_age_days)),
                engine: options,
                ..Default::default()
            };
            let progress = cli
                .show_text()
                .then(|| OutputFormatter::create_progress_bar(DAILY_STEPS));
            let report = run_daily_cleanup(target, &daily_options, logger, progress.as_ref())?;

            if cli.json {
                println!("{:#}", report.to_json());
            } else if !cli.quiet {
                OutputFormatter::daily_report(&report);
            }
        }
        Command::Report => {
            let report = SystemReport::generate(logger);
            if cli.json {
                println!("{:#}", json!(report));
            } else if !cli.quiet {
                OutputFormatter::system_report(&report);
            }
        }
        Command::Process { name } => {
            let info = system::process_info(name, logger);
            if cli.json {
                println!("{:#}", json!(info));
            } else if !cli.quiet {
                OutputFormatter::process_info(name, &info);
            }
        }
        _ => {}
    }
    Ok(())
}

fn render_outcome(cli: &Cli, policy: &Policy, outcome: &PolicyOutcome) {
    if cli.json {
        let value = match outcome {
            PolicyOutcome::Mutated(result) => result.to_json(),
            PolicyOutcome::Found(files) => json!({ "large_files": files }),
        };
        println!("{:#}", value);
        return;
    }
    if cli.quiet {
        return;
    }

    match outcome {
        PolicyOutcome::Found(files) => {
            if let Policy::FindLargeFiles { min_size } = policy {
                OutputFormatter::large_files(files, *min_size as f64 / BYTES_PER_MB as f64);
            }
        }
        PolicyOutcome::Mutated(result) => {
            let title = policy.name().replace('-', " ").to_uppercase();
            OutputFormatter::run_result(&title, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("755"), Ok(0o755));
        assert_eq!(parse_mode("0644"), Ok(0o644));
        assert_eq!(parse_mode("0o600"), Ok(0o600));
        assert_eq!(parse_mode("7777"), Ok(0o7777));
        assert!(parse_mode("10000").is_err());
        assert!(parse_mode("789").is_err());
        assert!(parse_mode("rwx").is_err());
        assert!(parse_mode("").is_err());
    }

    #[test]
    fn test_clean_old_uses_config_default() {
        let cli = Cli::try_parse_from(["housekeep", "clean-old", "/tmp"]).unwrap();
        let defaults = CleanupSettings {
            max_age_days: 7,
            ..Default::default()
        };

        let (policy, root) = cli.command.policy(&defaults).unwrap();
        assert_eq!(root, Path::new("/tmp"));
        assert_eq!(
            policy,
            Policy::CleanupOldFiles {
                max_age: Duration::from_secs(7 * SECONDS_PER_DAY)
            }
        );
    }

    #[test]
    fn test_flag_overrides_config() {
        let cli =
            Cli::try_parse_from(["housekeep", "find-large", "/srv", "--min-mb", "5"]).unwrap();
        let (policy, _) = cli.command.policy(&CleanupSettings::default()).unwrap();
        assert_eq!(
            policy,
            Policy::FindLargeFiles {
                min_size: 5 * BYTES_PER_MB
            }
        );
    }

    #[test]
    fn test_chmod_arguments() {
        let cli = Cli::try_parse_from(["housekeep", "chmod", "/srv/www", "0o750", "-r"]).unwrap();
        let (policy, root) = cli.command.policy(&CleanupSettings::default()).unwrap();
        assert_eq!(root, Path::new("/srv/www"));
        assert_eq!(
            policy,
            Policy::ChangePermissions {
                mode: 0o750,
                recursive: true
            }
        );

        assert!(Cli::try_parse_from(["housekeep", "chmod", "/srv", "99999"]).is_err());
    }

    #[test]
    fn test_clean_empty_defaults_to_recursive() {
        let cli = Cli::try_parse_from(["housekeep", "clean-empty", "/tmp"]).unwrap();
        let (policy, _) = cli.command.policy(&CleanupSettings::default()).unwrap();
        assert_eq!(policy, Policy::CleanupEmptyDirs { recursive: true });
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["housekeep", "daily", "--dry-run", "-q", "--json"]).unwrap();
        assert!(cli.dry_run);
        assert!(cli.json);
        assert_eq!(cli.verbosity(), Verbosity::Quiet);
        assert!(cli.command.policy(&CleanupSettings::default()).is_none());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["housekeep", "-q", "-v", "report"]).is_err());
    }

    #[test]
    fn test_log_settings() {
        let config = HousekeepConfig::default();

        let cli = Cli::try_parse_from(["housekeep", "report"]).unwrap();
        assert_eq!(
            cli.log_settings(&config).log_dir,
            Some(PathBuf::from("/var/log/housekeep"))
        );

        let cli = Cli::try_parse_from(["housekeep", "--log-dir", "/srv/logs", "report"]).unwrap();
        assert_eq!(
            cli.log_settings(&config).log_dir,
            Some(PathBuf::from("/srv/logs"))
        );

        let cli = Cli::try_parse_from(["housekeep", "--no-log-file", "report"]).unwrap();
        assert_eq!(cli.log_settings(&config).log_dir, None);
    }
}
