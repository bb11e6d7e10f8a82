//! Host-level checks used by the reporting commands.

use crate::error::{HousekeepError, Result};
use crate::logger::Logger;
use serde::Serialize;
use std::ffi::{CStr, CString};
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::process::Command;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Filesystem capacity for the filesystem holding a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    /// Space available to unprivileged users.
    pub free_bytes: u64,
}

impl DiskUsage {
    pub fn percent_used(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.total_bytes as f64 * 100.0
    }

    pub fn total_gib(&self) -> f64 {
        self.total_bytes as f64 / BYTES_PER_GIB
    }

    pub fn used_gib(&self) -> f64 {
        self.used_bytes as f64 / BYTES_PER_GIB
    }

    pub fn free_gib(&self) -> f64 {
        self.free_bytes as f64 / BYTES_PER_GIB
    }
}

/// Reads capacity figures with `statvfs(2)`.
pub fn disk_usage(path: &Path) -> Result<DiskUsage> {
    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
        HousekeepError::InvalidArgument {
            reason: format!("path contains a NUL byte: {}", path.display()),
        }
    })?;

    let mut stat = MaybeUninit::<libc::statvfs>::uninit();
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if ret != 0 {
        let source = std::io::Error::last_os_error();
        return Err(if source.kind() == std::io::ErrorKind::NotFound {
            HousekeepError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            HousekeepError::Io {
                path: path.to_path_buf(),
                source,
            }
        });
    }
    let stat = unsafe { stat.assume_init() };

    let block_size = stat.f_frsize as u64;
    let total_bytes = stat.f_blocks as u64 * block_size;
    let used_bytes = (stat.f_blocks as u64).saturating_sub(stat.f_bfree as u64) * block_size;
    let free_bytes = stat.f_bavail as u64 * block_size;
    Ok(DiskUsage {
        total_bytes,
        used_bytes,
        free_bytes,
    })
}

/// Disk usage with logging, as the reporting commands want it.
pub fn check_disk_usage(path: &Path, logger: &dyn Logger) -> Option<DiskUsage> {
    logger.info(&format!("Checking disk usage for {}", path.display()));
    match disk_usage(path) {
        Ok(usage) => {
            logger.info(&format!(
                "Disk usage: {:.1}% used ({:.1}GB/{:.1}GB)",
                usage.percent_used(),
                usage.used_gib(),
                usage.total_gib()
            ));
            Some(usage)
        }
        Err(e) => {
            logger.error(&format!("Failed to check disk usage: {e}"));
            None
        }
    }
}

/// Identity of the running host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostInfo {
    pub hostname: String,
    /// Kernel name, e.g. `Linux`.
    pub system: String,
}

pub fn host_info() -> Result<HostInfo> {
    let mut uts = MaybeUninit::<libc::utsname>::uninit();
    let ret = unsafe { libc::uname(uts.as_mut_ptr()) };
    if ret != 0 {
        return Err(HousekeepError::Command {
            command: "uname".to_string(),
            reason: std::io::Error::last_os_error().to_string(),
        });
    }
    let uts = unsafe { uts.assume_init() };

    let field = |raw: &[libc::c_char]| {
        unsafe { CStr::from_ptr(raw.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    };
    Ok(HostInfo {
        hostname: field(&uts.nodename[..]),
        system: field(&uts.sysname[..]),
    })
}

/// Captured result of a shell command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// Exit status, or -1 if the command never ran or was killed by a signal.
    pub return_code: i32,
}

/// Runs `command` through `sh -c` and captures its output.
///
/// With `check`, a non-zero exit status counts as failure. Spawn failures are
/// reported in the returned value rather than as an error.
pub fn execute_command(command: &str, check: bool, logger: &dyn Logger) -> CommandOutput {
    logger.info(&format!("Executing command: {command}"));

    let output = match Command::new("sh").arg("-c").arg(command).output() {
        Ok(output) => output,
        Err(e) => {
            logger.error(&format!("Command execution error: {command}. Error: {e}"));
            return CommandOutput {
                success: false,
                stdout: String::new(),
                stderr: e.to_string(),
                return_code: -1,
            };
        }
    };

    let result = CommandOutput {
        success: !check || output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        return_code: output.status.code().unwrap_or(-1),
    };
    if result.success {
        logger.info(&format!("Command executed successfully: {command}"));
    } else {
        logger.error(&format!(
            "Command failed: {command}. Error: {}",
            result.stderr.trim()
        ));
    }
    result
}

/// Running processes whose `ps` line mentions a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessInfo {
    pub found: bool,
    pub processes: Vec<String>,
    pub error: String,
}

/// Looks up processes matching `name` in `ps aux` output.
pub fn process_info(name: &str, logger: &dyn Logger) -> ProcessInfo {
    logger.info(&format!("Checking process: {name}"));
    let output = execute_command("ps aux", true, logger);
    let processes = matching_lines(&output.stdout, name);

    if !processes.is_empty() {
        logger.info(&format!("Found {} instances of {name}", processes.len()));
    }
    ProcessInfo {
        found: output.success && !processes.is_empty(),
        processes,
        error: output.stderr,
    }
}

fn matching_lines(ps_output: &str, name: &str) -> Vec<String> {
    ps_output
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty() && line.contains(name))
        .map(str::to_string)
        .collect()
}
