//! # Inbound Ports
//!
//! API trait defining what the bootstrap pipeline can do.

use std::path::Path;

use crate::domain::{BootstrapError, BootstrapReport, NetworkDeclaration, PipelineState};

/// Network bootstrap API - inbound port.
pub trait NetworkBootstrapApi {
    /// Bootstrap from a YAML declaration file.
    fn bootstrap_file(&mut self, path: &Path) -> Result<BootstrapReport, BootstrapError>;

    /// Bootstrap from an already parsed declaration.
    fn bootstrap(
        &mut self,
        declaration: NetworkDeclaration,
    ) -> Result<BootstrapReport, BootstrapError>;

    /// State reached by the last run.
    fn state(&self) -> &PipelineState;
}
