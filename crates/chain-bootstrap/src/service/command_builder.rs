//! Node command construction.
//!
//! Every node sub-command the pipeline runs is built here, with prompt
//! scripts attached when the keyring backend asks for a passphrase.

use std::path::Path;

use crate::domain::{
    BootstrapOptions, KeyringBackend, PASSPHRASE_CONFIRM_PROMPT, PASSPHRASE_PROMPT,
};
use crate::ports::outbound::CommandLine;

/// Builds node binary invocations for one run.
#[derive(Clone, Debug)]
pub struct ChainCommandBuilder {
    node_binary: String,
    chain_id: String,
    default_denom: Option<String>,
    key_phrase: String,
    keyring_backend: KeyringBackend,
}

impl ChainCommandBuilder {
    /// Builder for `options`, using `chain_id` for every command.
    pub fn new(options: &BootstrapOptions, chain_id: impl Into<String>) -> Self {
        Self {
            node_binary: options.node_binary.clone(),
            chain_id: chain_id.into(),
            default_denom: options
                .default_denom
                .clone()
                .filter(|denom| !denom.trim().is_empty()),
            key_phrase: options.key_phrase.clone(),
            keyring_backend: options.keyring_backend,
        }
    }

    /// Chain id passed to `init` and `gentx`.
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Keyring backend in use.
    pub fn keyring_backend(&self) -> KeyringBackend {
        self.keyring_backend
    }

    fn node(&self) -> CommandLine {
        CommandLine::new(&self.node_binary)
    }

    fn with_passphrase(&self, command: CommandLine) -> CommandLine {
        if self.keyring_backend.requires_passphrase() {
            command.prompt(PASSPHRASE_PROMPT, &self.key_phrase)
        } else {
            command
        }
    }

    /// `config keyring-backend`, `None` when the backend is the node default.
    pub fn config_keyring_backend(&self, home: &Path) -> Option<CommandLine> {
        self.keyring_backend.requires_client_config().then(|| {
            self.node()
                .args(["config", "keyring-backend", self.keyring_backend.as_str()])
                .arg("--home")
                .arg(path_arg(home))
        })
    }

    /// `config chain-id`.
    pub fn config_chain_id(&self, home: &Path) -> CommandLine {
        self.node()
            .args(["config", "chain-id", self.chain_id.as_str()])
            .arg("--home")
            .arg(path_arg(home))
    }

    /// `init <moniker>`.
    pub fn init(&self, moniker: &str, home: &Path) -> CommandLine {
        let command = self
            .node()
            .args(["init", moniker, "--chain-id", self.chain_id.as_str()])
            .arg("--home")
            .arg(path_arg(home));
        match &self.default_denom {
            Some(denom) => command.args(["--default-denom", denom.as_str()]),
            None => command,
        }
    }

    /// `keys add <name>` into the root keyring.
    ///
    /// `first_key` adds the confirmation prompt printed when the keyring is
    /// created.
    pub fn keys_add(&self, name: &str, root_home: &Path, first_key: bool) -> CommandLine {
        let command = self
            .node()
            .args(["keys", "add", name])
            .arg("--home")
            .arg(path_arg(root_home))
            .args(["--keyring-backend", self.keyring_backend.as_str()]);
        let command = self.with_passphrase(command);
        if first_key && self.keyring_backend.requires_passphrase() {
            command.prompt(PASSPHRASE_CONFIRM_PROMPT, &self.key_phrase)
        } else {
            command
        }
    }

    /// `add-genesis-account <name> <coins>`.
    pub fn add_genesis_account(&self, name: &str, coins: &str, home: &Path) -> CommandLine {
        self.with_passphrase(
            self.node()
                .args(["add-genesis-account", name, coins])
                .arg("--home")
                .arg(path_arg(home))
                .args(["--keyring-backend", self.keyring_backend.as_str()]),
        )
    }

    /// `gentx <name> <bonded>`.
    pub fn gentx(&self, name: &str, bonded: &str, ip: &str, p2p_port: u16, home: &Path) -> CommandLine {
        self.with_passphrase(
            self.node()
                .args(["gentx", name, bonded, "--chain-id", self.chain_id.as_str()])
                .args(["--ip", ip])
                .arg("--p2p-port")
                .arg(p2p_port.to_string())
                .arg("--home")
                .arg(path_arg(home))
                .args(["--keyring-backend", self.keyring_backend.as_str()]),
        )
    }

    /// `collect-gentxs`.
    pub fn collect_gentxs(&self, home: &Path) -> CommandLine {
        self.node().arg("collect-gentxs").arg("--home").arg(path_arg(home))
    }

    /// `validate-genesis`.
    pub fn validate_genesis(&self, home: &Path) -> CommandLine {
        self.node().arg("validate-genesis").arg("--home").arg(path_arg(home))
    }

    /// `tendermint show-node-id`.
    pub fn show_node_id(&self, home: &Path) -> CommandLine {
        self.node()
            .args(["tendermint", "show-node-id"])
            .arg("--home")
            .arg(path_arg(home))
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(backend: KeyringBackend) -> ChainCommandBuilder {
        let options = BootstrapOptions {
            keyring_backend: backend,
            default_denom: Some("ustake".into()),
            ..BootstrapOptions::default()
        };
        ChainCommandBuilder::new(&options, "demo-1")
    }

    #[test]
    fn test_init_with_default_denom() {
        let cmd = builder(KeyringBackend::Test).init("node0", Path::new("/h/0"));
        assert_eq!(
            cmd.to_string(),
            "simd init node0 --chain-id demo-1 --home /h/0 --default-denom ustake"
        );
    }

    #[test]
    fn test_keys_add_prompts_for_file_backend() {
        let b = builder(KeyringBackend::File);
        let first = b.keys_add("a", Path::new("/h/0"), true);
        assert_eq!(first.prompts().len(), 2);
        assert_eq!(first.prompts()[1].expect, PASSPHRASE_CONFIRM_PROMPT);
        let later = b.keys_add("b", Path::new("/h/0"), false);
        assert_eq!(later.prompts().len(), 1);
        assert_eq!(later.prompts()[0].send, "88888888");
    }

    #[test]
    fn test_test_backend_never_prompts() {
        let b = builder(KeyringBackend::Test);
        assert!(!b.keys_add("a", Path::new("/h"), true).is_scripted());
        assert!(!b.gentx("a", "1stake", "1.2.3.4", 26656, Path::new("/h")).is_scripted());
    }

    #[test]
    fn test_os_backend_skips_client_config() {
        assert!(builder(KeyringBackend::Os)
            .config_keyring_backend(Path::new("/h"))
            .is_none());
        let cmd = builder(KeyringBackend::File)
            .config_keyring_backend(Path::new("/h"))
            .unwrap();
        assert_eq!(cmd.to_string(), "simd config keyring-backend file --home /h");
    }

    #[test]
    fn test_gentx_arguments() {
        let cmd = builder(KeyringBackend::Test).gentx("a", "5stake", "10.0.0.1", 36656, Path::new("/h"));
        assert_eq!(
            cmd.to_string(),
            "simd gentx a 5stake --chain-id demo-1 --ip 10.0.0.1 --p2p-port 36656 --home /h --keyring-backend test"
        );
    }
}
