//! Per-validator provisioning.
//!
//! Drives the node binary through the sequence that yields an initialized
//! home, a key in the root keyring, genesis accounts, a gentx and the node
//! identity. The root validator must be provisioned first: its keyring and
//! pending gentx directory anchor every other validator.

use tracing::{debug, info, info_span};

use super::command_builder::ChainCommandBuilder;
use super::home::NodeHome;
use crate::algorithms::{format_peer_address, parse_p2p_port};
use crate::domain::{
    BootstrapError, ExecutionError, PeerDescriptor, ProvisionStep, RootInfo, ValidatorSpec,
};
use crate::ports::outbound::{CommandExecutor, CommandLine};

/// Runs provisioning commands for one pipeline run.
pub struct NodeProvisioner<'a, E: CommandExecutor> {
    executor: E,
    commands: &'a ChainCommandBuilder,
    root: RootInfo,
    root_home: NodeHome,
    keyring_initialized: bool,
}

impl<'a, E: CommandExecutor> NodeProvisioner<'a, E> {
    /// Create a provisioner anchored at `root`.
    pub fn new(executor: E, commands: &'a ChainCommandBuilder, root: RootInfo) -> Self {
        let root_home = NodeHome::new(&root.home);
        Self {
            executor,
            commands,
            root,
            root_home,
            keyring_initialized: false,
        }
    }

    /// Home of the root validator.
    pub fn root_home(&self) -> &NodeHome {
        &self.root_home
    }

    /// Provision one validator and return its peer descriptor.
    ///
    /// `balances` is the comma-joined coin list of the validator's account.
    pub fn provision(
        &mut self,
        validator: &ValidatorSpec,
        balances: &str,
    ) -> Result<PeerDescriptor, BootstrapError> {
        let name = validator.name.as_str();
        let _span = info_span!("provision", validator = name).entered();
        let is_root = name == self.root.name;
        let home = NodeHome::new(validator.home_path());
        let p2p_port = parse_p2p_port(&validator.p2p_laddr());
        info!(home = %home.path().display(), is_root, "provisioning validator");

        home.reset().map_err(tag(name, ProvisionStep::ResetHome))?;

        if let Some(command) = self.commands.config_keyring_backend(home.path()) {
            self.run(name, ProvisionStep::ConfigureClient, &command)?;
        }
        self.run(
            name,
            ProvisionStep::ConfigureClient,
            &self.commands.config_chain_id(home.path()),
        )?;

        self.run(
            name,
            ProvisionStep::InitChain,
            &self.commands.init(&validator.moniker(), home.path()),
        )?;

        let first_key = !self.keyring_initialized;
        self.run(
            name,
            ProvisionStep::AddKey,
            &self.commands.keys_add(name, self.root_home.path(), first_key),
        )?;
        self.keyring_initialized = true;

        if !is_root {
            home.share_keyring_from(&self.root_home, self.commands.keyring_backend())
                .map_err(tag(name, ProvisionStep::ShareKeyring))?;
        }

        self.run(
            name,
            ProvisionStep::AddGenesisAccount,
            &self
                .commands
                .add_genesis_account(name, balances, self.root_home.path()),
        )?;
        if !is_root {
            self.run(
                name,
                ProvisionStep::AddGenesisAccount,
                &self.commands.add_genesis_account(name, balances, home.path()),
            )?;
        }

        self.run(
            name,
            ProvisionStep::GenerateGentx,
            &self.commands.gentx(
                name,
                &validator.bonded,
                &validator.ip,
                p2p_port,
                home.path(),
            ),
        )?;
        self.run(
            name,
            ProvisionStep::CollectGentxs,
            &self.commands.collect_gentxs(home.path()),
        )?;

        if !is_root {
            let forwarded = home
                .forward_gentxs_to(&self.root_home)
                .map_err(tag(name, ProvisionStep::ForwardGentx))?;
            debug!(count = forwarded.len(), "gentx forwarded to root");
        }

        let node_id = self.run(
            name,
            ProvisionStep::QueryNodeId,
            &self.commands.show_node_id(home.path()),
        )?;
        let peer_address = format_peer_address(&node_id, &validator.ip, p2p_port);
        info!(peer = %peer_address, "validator provisioned");
        Ok(PeerDescriptor::new(name, peer_address))
    }

    /// Collect every forwarded gentx into the root genesis and validate it.
    pub fn finalize(&self) -> Result<(), BootstrapError> {
        let root = self.root.name.as_str();
        let _span = info_span!("finalize", validator = root).entered();
        self.run(
            root,
            ProvisionStep::CollectGentxs,
            &self.commands.collect_gentxs(self.root_home.path()),
        )?;
        self.run(
            root,
            ProvisionStep::ValidateGenesis,
            &self.commands.validate_genesis(self.root_home.path()),
        )?;
        info!("root genesis validated");
        Ok(())
    }

    fn run(
        &self,
        validator: &str,
        step: ProvisionStep,
        command: &CommandLine,
    ) -> Result<String, BootstrapError> {
        debug!(%step, "running step");
        self.executor.execute(command).map_err(tag(validator, step))
    }
}

fn tag(validator: &str, step: ProvisionStep) -> impl FnOnce(ExecutionError) -> BootstrapError + '_ {
    move |source| BootstrapError::Provision {
        validator: validator.to_string(),
        step,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BootstrapOptions, Document, KeyringBackend};
    use crate::ports::outbound::MockCommandExecutor;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    /// Mock that also drops a gentx file the way the node binary would.
    struct GentxWriter(MockCommandExecutor);

    impl CommandExecutor for GentxWriter {
        fn execute(&self, command: &CommandLine) -> Result<String, ExecutionError> {
            if command.arguments().first().map(String::as_str) == Some("gentx") {
                if let Some(home) = command.flag_value("--home") {
                    let dir = NodeHome::new(home).gentx_dir();
                    fs::create_dir_all(&dir).unwrap();
                    fs::write(dir.join(format!("gentx-{}.json", command.arguments()[1])), "{}")
                        .unwrap();
                }
            }
            self.0.execute(command)
        }
    }

    fn validator(name: &str, base: &Path) -> ValidatorSpec {
        let mut config = Document::new();
        config.set_path("moniker", name);
        config.set_path("p2p.laddr", "tcp://0.0.0.0:36656");
        ValidatorSpec {
            name: name.into(),
            bonded: "10stake".into(),
            home: base.join(name).to_string_lossy().into_owned(),
            ip: "10.0.0.1".into(),
            app: Document::new(),
            config,
        }
    }

    fn builder(backend: KeyringBackend) -> ChainCommandBuilder {
        let options = BootstrapOptions {
            keyring_backend: backend,
            ..BootstrapOptions::default()
        };
        ChainCommandBuilder::new(&options, "demo-1")
    }

    fn root_info(root: &ValidatorSpec) -> RootInfo {
        RootInfo {
            name: root.name.clone(),
            home: root.home_path(),
        }
    }

    fn subcommands(calls: &[CommandLine]) -> Vec<String> {
        calls
            .iter()
            .map(|c| c.arguments().first().cloned().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_root_sequence() {
        let dir = tempdir().unwrap();
        let exec = GentxWriter(MockCommandExecutor::new().with_output("show-node-id", "nodeA\n"));
        let commands = builder(KeyringBackend::Test);
        let root = validator("a", dir.path());
        let mut provisioner = NodeProvisioner::new(&exec, &commands, root_info(&root));

        let peer = provisioner.provision(&root, "100stake").unwrap();
        assert_eq!(peer.peer_address, "nodeA@10.0.0.1:36656");
        assert_eq!(
            subcommands(&exec.0.calls()),
            vec![
                "config",
                "config",
                "init",
                "keys",
                "add-genesis-account",
                "gentx",
                "collect-gentxs",
                "tendermint"
            ]
        );
    }

    #[test]
    fn test_non_root_registers_on_both_homes_and_forwards_gentx() {
        let dir = tempdir().unwrap();
        let exec = GentxWriter(MockCommandExecutor::new().with_output("show-node-id", "nodeB"));
        let commands = builder(KeyringBackend::File);
        let root = validator("a", dir.path());
        let other = validator("b", dir.path());
        let mut provisioner = NodeProvisioner::new(&exec, &commands, root_info(&root));
        provisioner.provision(&root, "1stake").unwrap();
        let calls_before = exec.0.call_count();

        provisioner.provision(&other, "2stake").unwrap();

        let calls = exec.0.calls()[calls_before..].to_vec();
        let genesis_homes: Vec<String> = calls
            .iter()
            .filter(|c| c.arguments().first().map(String::as_str) == Some("add-genesis-account"))
            .map(|c| c.flag_value("--home").unwrap_or_default().to_string())
            .collect();
        assert_eq!(genesis_homes, vec![root.home.clone(), other.home.clone()]);

        let root_home = NodeHome::new(root.home_path());
        assert!(root_home.gentx_dir().join("gentx-a.json").is_file());
        assert!(root_home.gentx_dir().join("gentx-b.json").is_file());
        assert!(NodeHome::new(other.home_path())
            .keyring_dir(KeyringBackend::File)
            .is_dir());
    }

    #[test]
    fn test_only_first_key_confirms_passphrase() {
        let dir = tempdir().unwrap();
        let exec = GentxWriter(MockCommandExecutor::new());
        let commands = builder(KeyringBackend::File);
        let root = validator("a", dir.path());
        let other = validator("b", dir.path());
        let mut provisioner = NodeProvisioner::new(&exec, &commands, root_info(&root));
        provisioner.provision(&root, "1stake").unwrap();
        provisioner.provision(&other, "1stake").unwrap();

        let key_adds: Vec<_> = exec
            .0
            .calls()
            .into_iter()
            .filter(|c| c.arguments().first().map(String::as_str) == Some("keys"))
            .collect();
        assert_eq!(key_adds.len(), 2);
        assert_eq!(key_adds[0].prompts().len(), 2);
        assert_eq!(key_adds[1].prompts().len(), 1);
        assert_eq!(key_adds[1].flag_value("--home"), Some(root.home.as_str()));
    }

    #[test]
    fn test_failure_carries_step_and_validator() {
        let dir = tempdir().unwrap();
        let mock = MockCommandExecutor::new().failing_on(" init ");
        let commands = builder(KeyringBackend::Test);
        let root = validator("a", dir.path());
        let mut provisioner = NodeProvisioner::new(&mock, &commands, root_info(&root));
        let err = provisioner.provision(&root, "1stake").unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Provision { ref validator, step: ProvisionStep::InitChain, .. } if validator == "a"
        ));
        assert_eq!(mock.call_count(), 3);
    }

    #[test]
    fn test_missing_gentx_dir_fails_forwarding() {
        let dir = tempdir().unwrap();
        let mock = MockCommandExecutor::new();
        let commands = builder(KeyringBackend::Test);
        let root = validator("a", dir.path());
        let other = validator("b", dir.path());
        let mut provisioner = NodeProvisioner::new(&mock, &commands, root_info(&root));
        provisioner.provision(&root, "1stake").unwrap();
        let err = provisioner.provision(&other, "1stake").unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Provision { step: ProvisionStep::ForwardGentx, .. }
        ));
    }

    #[test]
    fn test_finalize_runs_on_root_home() {
        let mock = MockCommandExecutor::new();
        let commands = builder(KeyringBackend::Test);
        let info = RootInfo {
            name: "a".into(),
            home: "/net/a".into(),
        };
        let provisioner = NodeProvisioner::new(&mock, &commands, info);
        provisioner.finalize().unwrap();
        let rendered: Vec<String> = mock.calls().iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "simd collect-gentxs --home /net/a",
                "simd validate-genesis --home /net/a"
            ]
        );
    }
}
