//! # Domain Errors
//!
//! Error taxonomy of the bootstrap pipeline. Every error is fatal: nothing is
//! retried, the first failure ends the run.

use std::path::PathBuf;

use thiserror::Error;

use super::value_objects::{DocumentFormat, PipelineStage, ProvisionStep, ValidatorField};

/// Declaration-level invariant violation. Raised before any command runs.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No validators declared.
    #[error("validators must not be empty")]
    EmptyValidatorSet,

    /// No accounts declared.
    #[error("accounts must not be empty")]
    EmptyAccountSet,

    /// More validators than accounts.
    #[error("validator count {validators} is greater than account count {accounts}")]
    ValidatorExceedsAccounts {
        /// Number of validators
        validators: usize,
        /// Number of accounts
        accounts: usize,
    },

    /// Validator name matches no account.
    #[error("validator [{name}] has no matching account")]
    UnmatchedValidatorAccount {
        /// Validator name
        name: String,
    },

    /// A required validator field is empty or absent.
    #[error("validator [{validator}] {field} is empty")]
    MissingField {
        /// Validator name
        validator: String,
        /// Missing field
        field: ValidatorField,
    },

    /// Account has no coins.
    #[error("account [{name}] coins are empty")]
    EmptyAccountBalance {
        /// Account name
        name: String,
    },

    /// Two accounts share a name.
    #[error("account [{name}] is declared more than once")]
    DuplicateAccount {
        /// Account name
        name: String,
    },

    /// Two validators share a name.
    #[error("validator [{name}] is declared more than once")]
    DuplicateValidator {
        /// Validator name
        name: String,
    },

    /// A validator home path could not be expanded.
    #[error("validator [{validator}] home `{path}` cannot be expanded: {source}")]
    UnresolvedHome {
        /// Validator name
        validator: String,
        /// Home path as declared
        path: String,
        /// Why expansion failed
        source: HomeExpansionError,
    },
}

/// Home path expansion failure.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HomeExpansionError {
    /// The path starts with `~` but the user's home directory is unknown.
    #[error("home directory of the current user is unknown")]
    NoHomeDirectory,

    /// The path references an environment variable that is not set.
    #[error("environment variable `{name}` is not set")]
    UnsetVariable {
        /// Variable name
        name: String,
    },
}

/// External command or native file operation failure.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The process could not be started.
    #[error("failed to start `{command}`: {reason}")]
    Spawn {
        /// Rendered command line
        command: String,
        /// OS error
        reason: String,
    },

    /// The process exited unsuccessfully.
    #[error("`{command}` exited with {}: {output}", exit_label(.code))]
    Failed {
        /// Rendered command line
        command: String,
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
        /// Trimmed stdout and stderr
        output: String,
    },

    /// A filesystem operation on a node home failed.
    #[error("failed to {operation} {}: {reason}", .path.display())]
    Io {
        /// What was being done
        operation: &'static str,
        /// Path involved
        path: PathBuf,
        /// OS error
        reason: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

impl ExecutionError {
    /// Build an [`ExecutionError::Io`] from an `std::io::Error`.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

/// Structured document could not be loaded, decoded or written.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MergeError {
    /// File could not be read.
    #[error("failed to read {}: {reason}", .path.display())]
    Read {
        /// Document path
        path: PathBuf,
        /// OS error
        reason: String,
    },

    /// File content is not a valid document of the declared format.
    #[error("malformed {format} document {}: {reason}", .path.display())]
    Decode {
        /// Document path
        path: PathBuf,
        /// Declared format
        format: DocumentFormat,
        /// Codec error
        reason: String,
    },

    /// Document cannot be expressed in the declared format.
    #[error("cannot encode {} as {format}: {reason}", .path.display())]
    Encode {
        /// Document path
        path: PathBuf,
        /// Declared format
        format: DocumentFormat,
        /// Codec error
        reason: String,
    },

    /// File could not be written.
    #[error("failed to write {}: {reason}", .path.display())]
    Write {
        /// Document path
        path: PathBuf,
        /// OS error
        reason: String,
    },
}

/// Peer table bookkeeping inconsistency. Indicates a provisioning bug.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// A declared validator has no recorded peer descriptor.
    #[error("no peer descriptor recorded for validator [{validator}]")]
    PeerNotFound {
        /// Validator name
        validator: String,
    },
}

/// Network declaration file could not be loaded.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DeclarationError {
    /// File could not be read.
    #[error("failed to read declaration {}: {reason}", .path.display())]
    Read {
        /// Declaration path
        path: PathBuf,
        /// OS error
        reason: String,
    },

    /// File is not a valid declaration.
    #[error("malformed declaration {}: {reason}", .path.display())]
    Parse {
        /// Declaration path
        path: PathBuf,
        /// YAML error
        reason: String,
    },
}

/// Umbrella error returned by the orchestrator.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Declaration could not be loaded.
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    /// Declaration violates an invariant.
    #[error("invalid network declaration: {0}")]
    Validation(#[from] ValidationError),

    /// A provisioning step failed.
    #[error("validator [{validator}] {step} failed: {source}")]
    Provision {
        /// Validator being provisioned
        validator: String,
        /// Step that failed
        step: ProvisionStep,
        /// Underlying failure
        source: ExecutionError,
    },

    /// A document merge failed.
    #[error("validator [{validator}] {stage} failed: {source}")]
    Merge {
        /// Validator whose document failed
        validator: String,
        /// Merge stage
        stage: PipelineStage,
        /// Underlying failure
        source: MergeError,
    },

    /// Genesis synchronization failed.
    #[error("validator [{validator}] {stage} failed: {source}")]
    Sync {
        /// Validator receiving the genesis
        validator: String,
        /// Stage
        stage: PipelineStage,
        /// Underlying failure
        source: ExecutionError,
    },

    /// Peer table inconsistency.
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// Orchestrator attempted an out-of-order stage transition.
    #[error("pipeline cannot move from {from} to {to}")]
    InvalidTransition {
        /// Current stage
        from: PipelineStage,
        /// Requested stage
        to: PipelineStage,
    },
}

impl BootstrapError {
    /// Validator the error is attributed to, if any.
    pub fn validator(&self) -> Option<&str> {
        match self {
            Self::Provision { validator, .. }
            | Self::Merge { validator, .. }
            | Self::Sync { validator, .. } => Some(validator),
            Self::Topology(TopologyError::PeerNotFound { validator }) => Some(validator),
            _ => None,
        }
    }
}
