//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits against the local machine: child
//! processes, files on disk and the YAML declaration.

pub mod declaration_loader;
pub mod document_store;
pub mod preflight;
pub mod process_executor;

pub use declaration_loader::{load_declaration, parse_declaration};
pub use document_store::FileDocumentStore;
pub use preflight::{ensure_expect, PreflightError};
pub use process_executor::ProcessCommandExecutor;
