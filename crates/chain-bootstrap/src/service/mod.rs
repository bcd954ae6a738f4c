//! # Bootstrap Service
//!
//! The pipeline implementing `NetworkBootstrapApi`.
//!
//! ## Architecture
//!
//! 1. `ChainCommandBuilder` renders every node sub-command
//! 2. `NodeHome` owns the on-disk layout of a validator home
//! 3. `NodeProvisioner` runs the per-validator sequence
//! 4. `BootstrapOrchestrator` sequences the stages and merges documents
//! 5. `StageMonitor` publishes the current stage to other threads
//!
//! External effects go through the `CommandExecutor` and `DocumentStore`
//! ports; only home directory copies use the filesystem directly.

pub mod command_builder;
pub mod home;
pub mod monitor;
pub mod orchestrator;
pub mod provisioner;

pub use command_builder::ChainCommandBuilder;
pub use home::NodeHome;
pub use monitor::StageMonitor;
pub use orchestrator::{BootstrapOrchestrator, PERSISTENT_PEERS_PATH};
pub use provisioner::NodeProvisioner;
