//! # Chain Bootstrap
//!
//! Brings up a local multi-validator network for a Cosmos-SDK style node
//! binary from a single declaration file.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Validate the declared accounts and validators before touching disk
//! - Provision every validator home through the node binary
//! - Compute the full-mesh `persistent_peers` topology
//! - Deep-merge overrides into `app.toml`, `config.toml` and `genesis.json`
//! - Distribute the root genesis to every validator
//!
//! ## Module Structure
//!
//! ```text
//! chain-bootstrap/
//! ├── domain/          # Document model, declaration, options, errors
//! ├── algorithms/      # Merge, topology, address parsing
//! ├── ports/           # NetworkBootstrapApi, CommandExecutor, DocumentStore
//! ├── adapters/        # Process executor, file store, declaration loader
//! └── service/         # Provisioner and pipeline orchestrator
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    ensure_expect, load_declaration, parse_declaration, FileDocumentStore, PreflightError,
    ProcessCommandExecutor,
};
pub use algorithms::{assemble_persistent_peers, merge, merge_into};
pub use domain::{
    validate, BootstrapError, BootstrapOptions, BootstrapReport, Document, DocumentFormat,
    KeyringBackend, NetworkDeclaration, PeerDescriptor, PipelineStage, PipelineState, Value,
};
pub use ports::{CommandExecutor, CommandLine, DocumentStore, NetworkBootstrapApi};
pub use service::{BootstrapOrchestrator, NodeProvisioner, StageMonitor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
