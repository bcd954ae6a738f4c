//! # Stage Monitor
//!
//! Shared view of the pipeline state for observers outside the run, such as
//! a signal handler reporting where an interrupted run stopped.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::PipelineState;

/// Cloneable handle on the state of one orchestrator.
#[derive(Clone, Debug)]
pub struct StageMonitor {
    state: Arc<RwLock<PipelineState>>,
}

impl Default for StageMonitor {
    fn default() -> Self {
        Self {
            state: Arc::new(RwLock::new(PipelineState::Idle)),
        }
    }
}

impl StageMonitor {
    /// Monitor starting in `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current state.
    pub fn current(&self) -> PipelineState {
        self.state.read().clone()
    }

    pub(crate) fn record(&self, state: &PipelineState) {
        *self.state.write() = state.clone();
    }
}
