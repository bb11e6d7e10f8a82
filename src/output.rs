//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored status lines,
//! progress tracking and the human-readable reports for each command.

use crate::daily::DailyReport;
use crate::policy::LargeFile;
use crate::report::SystemReport;
use crate::run_result::RunResult;
use crate::system::{DiskUsage, ProcessInfo};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

const RULE_WIDTH: usize = 80;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header between horizontal rules.
    pub fn header(header: &str) {
        println!("\n{}", "=".repeat(RULE_WIDTH));
        println!("{}", header.bold());
        println!("{}", "=".repeat(RULE_WIDTH));
    }

    pub fn rule() {
        println!("{}\n", "=".repeat(RULE_WIDTH));
    }

    /// Creates a progress bar for a fixed number of steps.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use housekeep::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(3);
    /// pb.inc(1);
    /// pb.finish_with_message("Completed!");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Prints the counters, detail lines and failures of a policy run.
    pub fn run_result(title: &str, result: &RunResult) {
        Self::header(title);
        if result.is_dry_run() {
            Self::dry_run_notice("No files were modified.");
        }

        for detail in result.details() {
            println!("  {} {}", "✓".green(), detail);
        }
        for failure in result.failures() {
            eprintln!(
                "  {} {}: {}",
                "✗".red(),
                failure.path.display(),
                failure.message
            );
        }

        let label = capitalize(result.counter().name());
        println!("{}: {}", label, result.succeeded().to_string().green().bold());
        let errors = result.errors().to_string();
        if result.errors() == 0 {
            println!("Errors: {}", errors.green());
        } else {
            println!("Errors: {}", errors.red().bold());
        }
        Self::rule();
    }

    /// Prints large files as an aligned table, in the order they were found.
    pub fn large_files(files: &[LargeFile], threshold_mb: f64) {
        Self::header(&format!("FILES LARGER THAN {threshold_mb}MB"));
        if files.is_empty() {
            Self::plain("No large files found.");
            Self::rule();
            return;
        }

        let width = files
            .iter()
            .map(|f| format!("{:.2}", f.size_mb).len())
            .max()
            .unwrap_or(0)
            .max(4);
        println!("{:>width$}  {}", "MB".bold(), "Path".bold(), width = width);
        for file in files {
            println!(
                "{:>width$}  {}",
                format!("{:.2}", file.size_mb).yellow(),
                file.path.display(),
                width = width
            );
        }
        println!("Total: {} files", files.len().to_string().green().bold());
        Self::rule();
    }

    pub fn disk_usage(usage: &DiskUsage) {
        let percent = format!("{:.1}%", usage.percent_used());
        let percent = if usage.percent_used() >= 90.0 {
            percent.red().bold()
        } else if usage.percent_used() >= 75.0 {
            percent.yellow()
        } else {
            percent.green()
        };
        println!(
            "Disk usage: {} ({:.1}GB/{:.1}GB, {:.1}GB free)",
            percent,
            usage.used_gib(),
            usage.total_gib(),
            usage.free_gib()
        );
    }

    /// Prints the daily cleanup report.
    pub fn daily_report(report: &DailyReport) {
        Self::header("CLEANUP REPORT");
        if report.old_files.is_dry_run() {
            Self::dry_run_notice("No files were modified.");
        }
        println!("Target: {}", report.target.display());
        println!("Old files deleted: {}", report.old_files.succeeded());
        println!("Errors during deletion: {}", report.old_files.errors());
        println!("Empty directories removed: {}", report.empty_dirs.succeeded());
        println!("Errors during removal: {}", report.empty_dirs.errors());
        match &report.disk_usage {
            Some(usage) => Self::disk_usage(usage),
            None => Self::warning("Disk usage unavailable"),
        }
        Self::rule();
    }

    pub fn system_report(report: &SystemReport) {
        Self::header("SYSTEM REPORT");
        println!("Timestamp: {}", report.timestamp.to_rfc3339());
        if let Some(info) = &report.system_info {
            println!("Hostname: {}", info.hostname);
            println!("System: {}", info.system);
        }
        match &report.disk_usage {
            Some(usage) => Self::disk_usage(usage),
            None => Self::warning("Disk usage unavailable"),
        }
        Self::rule();
    }

    pub fn process_info(name: &str, info: &ProcessInfo) {
        if !info.found {
            Self::warning(&format!("No running process matches '{name}'"));
            if !info.error.trim().is_empty() {
                Self::error(info.error.trim());
            }
            return;
        }
        Self::success(&format!(
            "Found {} instances of {}",
            info.processes.len(),
            name
        ));
        for line in &info.processes {
            Self::plain(&format!("  {line}"));
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
