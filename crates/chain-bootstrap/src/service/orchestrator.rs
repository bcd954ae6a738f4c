//! # Bootstrap Orchestrator
//!
//! Top-level pipeline. Stages run strictly in order:
//!
//! ```text
//! ParseAndValidate → ProvisionNodes → MergeAppConfig → MergeNetworkConfig
//!                  → MergeGenesis → SyncGenesis → Done
//! ```
//!
//! The first error moves the pipeline to `Failed` and is returned as is.
//! Nothing is retried or rolled back; re-running is safe because every
//! validator home is reset at the start of provisioning.

use std::path::Path;

use bootstrap_telemetry::stage_span;
use tracing::{error, info};

use super::command_builder::ChainCommandBuilder;
use super::home::NodeHome;
use super::monitor::StageMonitor;
use super::provisioner::NodeProvisioner;
use crate::adapters::declaration_loader::load_declaration;
use crate::algorithms::{assemble_persistent_peers, merge};
use crate::domain::{
    validate, BootstrapError, BootstrapOptions, BootstrapReport, Document, DocumentFormat,
    NetworkDeclaration, PeerTable, PipelineStage, PipelineState, RootInfo,
};
use crate::ports::inbound::NetworkBootstrapApi;
use crate::ports::outbound::{CommandExecutor, DocumentStore};

/// Key receiving the computed peer list in `config.toml`.
pub const PERSISTENT_PEERS_PATH: &str = "p2p.persistent_peers";

/// Drives a whole bootstrap run.
pub struct BootstrapOrchestrator<E: CommandExecutor, S: DocumentStore> {
    options: BootstrapOptions,
    executor: E,
    store: S,
    state: PipelineState,
    stage: PipelineStage,
    monitor: StageMonitor,
}

impl<E: CommandExecutor, S: DocumentStore> BootstrapOrchestrator<E, S> {
    /// Create an orchestrator.
    pub fn new(options: BootstrapOptions, executor: E, store: S) -> Self {
        Self {
            options,
            executor,
            store,
            state: PipelineState::Idle,
            stage: PipelineStage::ParseAndValidate,
            monitor: StageMonitor::new(),
        }
    }

    /// Handle that follows this orchestrator's state from other threads.
    pub fn monitor(&self) -> StageMonitor {
        self.monitor.clone()
    }

    fn set_state(&mut self, state: PipelineState) {
        self.monitor.record(&state);
        self.state = state;
    }

    /// Run options.
    pub fn options(&self) -> &BootstrapOptions {
        &self.options
    }

    /// Command executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run the pipeline on the declaration file named in the options.
    pub fn run(&mut self) -> Result<BootstrapReport, BootstrapError> {
        let path = self.options.config_path.clone();
        self.bootstrap_file(&path)
    }

    fn execute<L>(&mut self, load: L) -> Result<BootstrapReport, BootstrapError>
    where
        L: FnOnce() -> Result<NetworkDeclaration, BootstrapError>,
    {
        self.set_state(PipelineState::Idle);
        self.stage = PipelineStage::ParseAndValidate;
        match self.run_stages(load) {
            Ok(report) => Ok(report),
            Err(err) => {
                error!(stage = %self.stage, error = %err, "bootstrap failed");
                self.set_state(PipelineState::Failed {
                    stage: self.stage,
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn run_stages<L>(&mut self, load: L) -> Result<BootstrapReport, BootstrapError>
    where
        L: FnOnce() -> Result<NetworkDeclaration, BootstrapError>,
    {
        self.enter(PipelineStage::ParseAndValidate)?;
        let declaration = load()?;
        self.pipeline(declaration)
    }

    /// Move to `next`, refusing anything but the immediate successor.
    fn enter(&mut self, next: PipelineStage) -> Result<(), BootstrapError> {
        let allowed = match self.state {
            PipelineState::Idle => next == PipelineStage::ParseAndValidate,
            PipelineState::Running(current) => current.can_transition_to(next),
            PipelineState::Done | PipelineState::Failed { .. } => false,
        };
        if !allowed {
            return Err(BootstrapError::InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        self.stage = next;
        self.set_state(if next.is_terminal() {
            PipelineState::Done
        } else {
            PipelineState::Running(next)
        });
        Ok(())
    }

    fn pipeline(
        &mut self,
        declaration: NetworkDeclaration,
    ) -> Result<BootstrapReport, BootstrapError> {
        let mut declaration = declaration;
        let root = {
            let _stage = stage_span!(PipelineStage::ParseAndValidate.as_str()).entered();
            validate(&mut declaration)?
        };
        let chain_id = self.options.effective_chain_id(&declaration);
        let order = declaration.validator_names();
        info!(
            chain_id = %chain_id,
            root = %root.name,
            validators = order.len(),
            "declaration validated"
        );

        self.enter(PipelineStage::ProvisionNodes)?;
        let commands = ChainCommandBuilder::new(&self.options, chain_id.clone());
        let peers = self.provision_nodes(&declaration, &commands, &root, &order)?;
        let root_home = NodeHome::new(&root.home);

        self.enter(PipelineStage::MergeAppConfig)?;
        {
            let _stage = stage_span!(PipelineStage::MergeAppConfig.as_str()).entered();
            for validator in &declaration.validators {
                let home = NodeHome::new(validator.home_path());
                self.merge_file(
                    &validator.name,
                    &home.app_config(),
                    DocumentFormat::Toml,
                    Document::new(),
                    validator.app.clone(),
                )?;
            }
        }

        self.enter(PipelineStage::MergeNetworkConfig)?;
        {
            let _stage = stage_span!(PipelineStage::MergeNetworkConfig.as_str()).entered();
            for validator in &declaration.validators {
                let home = NodeHome::new(validator.home_path());
                let persistent_peers = peers
                    .get(&validator.name)
                    .map(|peer| peer.persistent_peers_value())
                    .unwrap_or_default();
                let mut injected = Document::new();
                injected.set_path(PERSISTENT_PEERS_PATH, persistent_peers);
                self.merge_file(
                    &validator.name,
                    &home.node_config(),
                    DocumentFormat::Toml,
                    injected,
                    validator.config.clone(),
                )?;
            }
        }

        // Non-root genesis copies are overwritten by the sync below, so only
        // the root copy is merged.
        self.enter(PipelineStage::MergeGenesis)?;
        {
            let _stage = stage_span!(PipelineStage::MergeGenesis.as_str()).entered();
            self.merge_file(
                &root.name,
                &root_home.genesis(),
                DocumentFormat::Json,
                Document::new(),
                declaration.genesis.clone(),
            )?;
        }

        self.enter(PipelineStage::SyncGenesis)?;
        {
            let _stage = stage_span!(PipelineStage::SyncGenesis.as_str()).entered();
            for validator in declaration.validators.iter().filter(|v| v.name != root.name) {
                NodeHome::new(validator.home_path())
                    .copy_genesis_from(&root_home)
                    .map_err(|source| BootstrapError::Sync {
                        validator: validator.name.clone(),
                        stage: PipelineStage::SyncGenesis,
                        source,
                    })?;
            }
        }

        self.enter(PipelineStage::Done)?;
        let report = BootstrapReport {
            chain_id,
            root,
            peers: peers.ordered(&order),
        };
        info!(peers = report.peers.len(), "network bootstrapped");
        Ok(report)
    }

    fn provision_nodes(
        &self,
        declaration: &NetworkDeclaration,
        commands: &ChainCommandBuilder,
        root: &RootInfo,
        order: &[String],
    ) -> Result<PeerTable, BootstrapError> {
        let _stage = stage_span!(
            PipelineStage::ProvisionNodes.as_str(),
            validators = declaration.validators.len()
        )
        .entered();

        let mut provisioner = NodeProvisioner::new(&self.executor, commands, root.clone());
        let mut peers = PeerTable::new();
        for validator in &declaration.validators {
            let balances = declaration.account_balances(&validator.name);
            peers.insert(provisioner.provision(validator, &balances)?);
        }
        provisioner.finalize()?;

        assemble_persistent_peers(order, &mut peers)?;
        Ok(peers)
    }

    /// Load `path`, merge `injected` then `overrides` into it, write it back.
    ///
    /// `overrides` is applied last so user values win over injected ones.
    fn merge_file(
        &self,
        validator: &str,
        path: &Path,
        format: DocumentFormat,
        injected: Document,
        overrides: Document,
    ) -> Result<(), BootstrapError> {
        let stage = self.stage;
        let tag = |source| BootstrapError::Merge {
            validator: validator.to_string(),
            stage,
            source,
        };
        let base = self.store.load(path, format).map_err(tag)?;
        let merged = merge(merge(base, injected), overrides);
        self.store.save(path, format, &merged).map_err(tag)?;
        info!(validator, path = %path.display(), "document merged");
        Ok(())
    }
}

impl<E: CommandExecutor, S: DocumentStore> NetworkBootstrapApi for BootstrapOrchestrator<E, S> {
    fn bootstrap_file(&mut self, path: &Path) -> Result<BootstrapReport, BootstrapError> {
        self.execute(|| load_declaration(path).map_err(BootstrapError::from))
    }

    fn bootstrap(
        &mut self,
        declaration: NetworkDeclaration,
    ) -> Result<BootstrapReport, BootstrapError> {
        self.execute(|| Ok(declaration))
    }

    fn state(&self) -> &PipelineState {
        &self.state
    }
}
