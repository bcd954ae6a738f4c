//! # Outbound Ports
//!
//! Traits for the pipeline's external dependencies: running node commands
//! and reading/writing structured documents.

use std::fmt;
use std::path::Path;

use parking_lot::Mutex;

use crate::domain::{Document, DocumentFormat, ExecutionError, MergeError};

/// One scripted interaction: wait for `expect`, then type `send`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptResponse {
    /// Literal prompt substring to wait for.
    pub expect: String,
    /// Line sent once the prompt appears.
    pub send: String,
}

/// A process invocation: program, arguments and an optional prompt script.
///
/// Arguments are kept as a vector, never joined into a shell string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
    prompts: Vec<PromptResponse>,
}

impl CommandLine {
    /// Start a command for `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a prompt/response pair.
    pub fn prompt(mut self, expect: impl Into<String>, send: impl Into<String>) -> Self {
        self.prompts.push(PromptResponse {
            expect: expect.into(),
            send: send.into(),
        });
        self
    }

    /// Program name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments.
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Prompt script, empty for direct commands.
    pub fn prompts(&self) -> &[PromptResponse] {
        &self.prompts
    }

    /// Whether the command needs prompt scripting.
    pub fn is_scripted(&self) -> bool {
        !self.prompts.is_empty()
    }

    /// Value following `flag` in the argument list.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|idx| self.args.get(idx + 1))
            .map(String::as_str)
    }
}

/// Shell-quoted rendering, for logs and error messages.
impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:@,=+%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Command executor - outbound port.
///
/// Returns combined stdout and stderr with surrounding whitespace trimmed.
pub trait CommandExecutor: Send + Sync {
    /// Run a command to completion.
    fn execute(&self, command: &CommandLine) -> Result<String, ExecutionError>;
}

impl<T: CommandExecutor + ?Sized> CommandExecutor for &T {
    fn execute(&self, command: &CommandLine) -> Result<String, ExecutionError> {
        (**self).execute(command)
    }
}

/// Structured document store - outbound port.
pub trait DocumentStore: Send + Sync {
    /// Load a document from `path`.
    fn load(&self, path: &Path, format: DocumentFormat) -> Result<Document, MergeError>;

    /// Write `document` to `path`, replacing the file.
    fn save(
        &self,
        path: &Path,
        format: DocumentFormat,
        document: &Document,
    ) -> Result<(), MergeError>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for &T {
    fn load(&self, path: &Path, format: DocumentFormat) -> Result<Document, MergeError> {
        (**self).load(path, format)
    }

    fn save(
        &self,
        path: &Path,
        format: DocumentFormat,
        document: &Document,
    ) -> Result<(), MergeError> {
        (**self).save(path, format, document)
    }
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock executor that records every call and answers from a script.
#[derive(Debug, Default)]
pub struct MockCommandExecutor {
    calls: Mutex<Vec<CommandLine>>,
    outputs: Vec<(String, String)>,
    failures: Vec<String>,
}

impl MockCommandExecutor {
    /// Executor answering every command with empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands whose rendering contains `needle` with `output`.
    pub fn with_output(mut self, needle: impl Into<String>, output: impl Into<String>) -> Self {
        self.outputs.push((needle.into(), output.into()));
        self
    }

    /// Fail commands whose rendering contains `needle`.
    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.failures.push(needle.into());
        self
    }

    /// Commands received so far.
    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().clone()
    }

    /// Number of commands received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl CommandExecutor for MockCommandExecutor {
    fn execute(&self, command: &CommandLine) -> Result<String, ExecutionError> {
        self.calls.lock().push(command.clone());
        let rendered = command.to_string();

        if self.failures.iter().any(|needle| rendered.contains(needle)) {
            return Err(ExecutionError::Failed {
                command: rendered,
                code: Some(1),
                output: "Mock failure".to_string(),
            });
        }

        Ok(self
            .outputs
            .iter()
            .find(|(needle, _)| rendered.contains(needle))
            .map(|(_, output)| output.trim().to_string())
            .unwrap_or_default())
    }
}
