//! Preflight Adapter
//!
//! Makes sure the prompt automation tool is installed before a run that
//! needs it, attempting a best-effort package manager install otherwise.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use super::process_executor::EXPECT_PROGRAM;
use crate::ports::outbound::{CommandExecutor, CommandLine};

/// Package managers tried in order, with their install arguments.
const PACKAGE_MANAGERS: [(&str, &[&str]); 2] = [
    ("apt-get", &["install", "-y"]),
    ("yum", &["install", "-y"]),
];

/// Preflight failure.
#[derive(Debug, Error)]
pub enum PreflightError {
    /// Tool missing and no package manager succeeded.
    #[error("`{tool}` is not installed and could not be installed automatically{}", attempts_suffix(.attempts))]
    ToolUnavailable {
        /// Tool name
        tool: String,
        /// Install failures, one line per attempt
        attempts: Vec<String>,
    },
}

fn attempts_suffix(attempts: &[String]) -> String {
    if attempts.is_empty() {
        String::new()
    } else {
        format!(" ({})", attempts.join("; "))
    }
}

/// Locate `expect`, installing it if needed.
pub fn ensure_expect<E: CommandExecutor>(executor: &E) -> Result<PathBuf, PreflightError> {
    ensure_tool(EXPECT_PROGRAM, executor, |name| which::which(name).ok())
}

/// Locate `tool` with `locate`, installing it through the first available
/// package manager when missing.
pub fn ensure_tool<E, L>(tool: &str, executor: &E, locate: L) -> Result<PathBuf, PreflightError>
where
    E: CommandExecutor,
    L: Fn(&str) -> Option<PathBuf>,
{
    if let Some(path) = locate(tool) {
        return Ok(path);
    }
    warn!(tool, "not found on PATH, trying to install");

    let mut attempts = Vec::new();
    for (manager, install_args) in PACKAGE_MANAGERS {
        if locate(manager).is_none() {
            continue;
        }
        let command = CommandLine::new(manager).args(install_args.iter().copied()).arg(tool);
        match executor.execute(&command) {
            Ok(_) => {
                if let Some(path) = locate(tool) {
                    info!(tool, manager, path = %path.display(), "installed");
                    return Ok(path);
                }
                attempts.push(format!("{manager}: installed but still not on PATH"));
            }
            Err(e) => attempts.push(format!("{manager}: {e}")),
        }
    }

    Err(PreflightError::ToolUnavailable {
        tool: tool.to_string(),
        attempts,
    })
}
