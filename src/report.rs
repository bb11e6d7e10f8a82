//! Point-in-time system report.

use crate::logger::Logger;
use crate::system::{self, DiskUsage, HostInfo};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::Path;

/// Snapshot of host health for the `report` command.
#[derive(Debug, Clone, Serialize)]
pub struct SystemReport {
    pub timestamp: DateTime<Local>,
    /// `None` when the filesystem could not be queried.
    pub disk_usage: Option<DiskUsage>,
    pub system_info: Option<HostInfo>,
    pub operations: Vec<String>,
}

impl SystemReport {
    /// Collects disk usage of `/` and the host identity.
    pub fn generate(logger: &dyn Logger) -> Self {
        logger.info("Generating system automation report");
        let disk_usage = system::check_disk_usage(Path::new("/"), logger);
        let system_info = match system::host_info() {
            Ok(info) => Some(info),
            Err(e) => {
                logger.warn(&format!("Could not read host information: {e}"));
                None
            }
        };

        let report = Self {
            timestamp: Local::now(),
            disk_usage,
            system_info,
            operations: Vec::new(),
        };
        logger.info("System automation report generated");
        report
    }
}
