//! Process Command Executor Adapter
//!
//! Implements `CommandExecutor` with `std::process`. Commands carrying a
//! prompt script are run under `expect`, which answers the prompts on a
//! pseudo terminal and propagates the child's exit status.

use std::process::{Command, Output, Stdio};

use tracing::{debug, error, info};

use crate::domain::ExecutionError;
use crate::ports::outbound::{CommandExecutor, CommandLine};

/// Program used to drive interactive prompts.
pub const EXPECT_PROGRAM: &str = "expect";

/// Runs commands as child processes, blocking until they exit.
#[derive(Clone, Debug)]
pub struct ProcessCommandExecutor {
    expect_program: String,
    log_output: bool,
}

impl ProcessCommandExecutor {
    /// Create an executor using `expect` from `PATH`.
    pub fn new() -> Self {
        Self {
            expect_program: EXPECT_PROGRAM.to_string(),
            log_output: false,
        }
    }

    /// Use a specific `expect` binary.
    pub fn with_expect_program(mut self, program: impl Into<String>) -> Self {
        self.expect_program = program.into();
        self
    }

    /// Log captured output of every command at debug level.
    pub fn with_output_logging(mut self, enabled: bool) -> Self {
        self.log_output = enabled;
        self
    }

    fn spawn(&self, command: &CommandLine) -> std::io::Result<Output> {
        let mut process = if command.is_scripted() {
            let mut process = Command::new(&self.expect_program);
            process.arg("-c").arg(render_expect_script(command));
            process
        } else {
            let mut process = Command::new(command.program());
            process.args(command.arguments());
            process
        };
        process.stdin(Stdio::null()).output()
    }
}

impl Default for ProcessCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor for ProcessCommandExecutor {
    fn execute(&self, command: &CommandLine) -> Result<String, ExecutionError> {
        let rendered = command.to_string();
        info!(command = %rendered, scripted = command.is_scripted(), "executing");

        let output = self.spawn(command).map_err(|e| ExecutionError::Spawn {
            command: rendered.clone(),
            reason: e.to_string(),
        })?;
        let combined = combined_output(&output);

        if self.log_output && !combined.is_empty() {
            debug!(command = %rendered, output = %combined, "command output");
        }

        if !output.status.success() {
            error!(
                command = %rendered,
                code = ?output.status.code(),
                output = %combined,
                "command failed"
            );
            return Err(ExecutionError::Failed {
                command: rendered,
                code: output.status.code(),
                output: combined,
            });
        }
        Ok(combined)
    }
}

/// Stdout followed by stderr, trimmed.
fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text.trim().to_string()
}

/// Render the `expect` program for a scripted command.
pub fn render_expect_script(command: &CommandLine) -> String {
    let mut spawn = String::from("spawn -noecho ");
    spawn.push_str(&tcl_quote(command.program()));
    for arg in command.arguments() {
        spawn.push(' ');
        spawn.push_str(&tcl_quote(arg));
    }

    let mut lines = vec!["set timeout -1".to_string(), spawn];
    for prompt in command.prompts() {
        lines.push(format!("expect -exact {}", tcl_quote(&prompt.expect)));
        lines.push(format!("send -- \"{}\\r\"", tcl_escape(&prompt.send)));
    }
    lines.push("expect eof".to_string());
    lines.push("catch wait result".to_string());
    lines.push("exit [lindex $result 3]".to_string());
    lines.join("\n")
}

/// Double-quoted Tcl word with substitutions disabled.
fn tcl_quote(word: &str) -> String {
    format!("\"{}\"", tcl_escape(word))
}

fn tcl_escape(word: &str) -> String {
    let mut escaped = String::with_capacity(word.len());
    for c in word.chars() {
        if matches!(c, '\\' | '"' | '$' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
