//! # Domain Entities
//!
//! The network declaration and the records produced while bootstrapping it.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::document::{Document, Value};
use super::value_objects::{KeyringBackend, ValidatorField};

/// Default declaration file.
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";
/// Default node binary.
pub const DEFAULT_NODE_BINARY: &str = "simd";
/// Default staking denom.
pub const DEFAULT_DENOM: &str = "stake";
/// Default chain id.
pub const DEFAULT_CHAIN_ID: &str = "localnet-1";
/// Default keyring passphrase.
pub const DEFAULT_KEY_PHRASE: &str = "88888888";

/// Parsed network declaration: accounts, validators and genesis overrides.
///
/// Unknown top-level keys are ignored.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct NetworkDeclaration {
    /// Genesis accounts, unique by name.
    #[serde(default)]
    pub accounts: Vec<AccountSpec>,
    /// Validators. The first one is the root validator.
    #[serde(default)]
    pub validators: Vec<ValidatorSpec>,
    /// Fragment merged into the final genesis document.
    #[serde(default)]
    pub genesis: Document,
}

impl NetworkDeclaration {
    /// The root validator, if any validator is declared.
    pub fn root(&self) -> Option<&ValidatorSpec> {
        self.validators.first()
    }

    /// Look up an account by name.
    pub fn account(&self, name: &str) -> Option<&AccountSpec> {
        self.accounts.iter().find(|account| account.name == name)
    }

    /// Comma-joined coin list of an account, empty for an unknown name.
    pub fn account_balances(&self, name: &str) -> String {
        self.account(name)
            .map(AccountSpec::balances)
            .unwrap_or_default()
    }

    /// Non-empty `chain_id` carried by the genesis overrides.
    pub fn genesis_chain_id(&self) -> Option<&str> {
        self.genesis
            .get_str("chain_id")
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Validator names in declaration order.
    pub fn validator_names(&self) -> Vec<String> {
        self.validators.iter().map(|v| v.name.clone()).collect()
    }
}

/// A funded genesis account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSpec {
    /// Key name, unique across accounts.
    #[serde(default)]
    pub name: String,
    /// Coin amounts such as `1000stake`.
    #[serde(default)]
    pub coins: Vec<String>,
}

impl AccountSpec {
    /// Coins joined the way `add-genesis-account` expects them.
    pub fn balances(&self) -> String {
        self.coins.join(",")
    }
}

/// One validator node of the network.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ValidatorSpec {
    /// Validator name, matches an account name.
    #[serde(default)]
    pub name: String,
    /// Amount bonded by the genesis transaction.
    #[serde(default)]
    pub bonded: String,
    /// Node home directory.
    #[serde(default)]
    pub home: String,
    /// Externally reachable IP.
    #[serde(default)]
    pub ip: String,
    /// Overrides for `app.toml`.
    #[serde(default)]
    pub app: Document,
    /// Overrides for `config.toml`.
    #[serde(default)]
    pub config: Document,
}

impl ValidatorSpec {
    /// Text value of a required field, `None` when absent or blank.
    pub fn field(&self, field: ValidatorField) -> Option<String> {
        let text = match field {
            ValidatorField::Ip => Some(self.ip.clone()),
            ValidatorField::Home => Some(self.home.clone()),
            ValidatorField::BondedStake => Some(self.bonded.clone()),
            ValidatorField::P2pAddress => self.config_text("p2p.laddr"),
            ValidatorField::RpcAddress => self.config_text("rpc.laddr"),
            ValidatorField::Moniker => self.config_text("moniker"),
            ValidatorField::CommitTimeout => self.config_text("consensus.timeout_commit"),
        };
        text.filter(|t| !t.trim().is_empty())
    }

    fn config_text(&self, path: &str) -> Option<String> {
        self.config.get_path(path).and_then(Value::as_text)
    }

    /// `config.p2p.laddr`, empty when absent.
    pub fn p2p_laddr(&self) -> String {
        self.field(ValidatorField::P2pAddress).unwrap_or_default()
    }

    /// `config.moniker`, empty when absent.
    pub fn moniker(&self) -> String {
        self.field(ValidatorField::Moniker).unwrap_or_default()
    }

    /// Home directory as a path.
    pub fn home_path(&self) -> PathBuf {
        PathBuf::from(&self.home)
    }
}

/// Name and resolved home of the root validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RootInfo {
    /// Root validator name.
    pub name: String,
    /// Expanded home directory.
    pub home: PathBuf,
}

/// Network identity of a provisioned validator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PeerDescriptor {
    /// Validator name.
    pub name: String,
    /// `node_id@ip:port`.
    pub peer_address: String,
    /// Addresses of every other validator, in declaration order.
    pub persistent_peers: Vec<String>,
}

impl PeerDescriptor {
    /// Create a descriptor with no peers yet.
    pub fn new(name: impl Into<String>, peer_address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            peer_address: peer_address.into(),
            persistent_peers: Vec::new(),
        }
    }

    /// Value written to `p2p.persistent_peers`.
    pub fn persistent_peers_value(&self) -> String {
        self.persistent_peers.join(",")
    }
}

/// Peer descriptors keyed by validator name, owned by the orchestrator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeerTable {
    peers: BTreeMap<String, PeerDescriptor>,
}

impl PeerTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a descriptor, replacing any previous one for the same name.
    pub fn insert(&mut self, descriptor: PeerDescriptor) {
        self.peers.insert(descriptor.name.clone(), descriptor);
    }

    /// Look up a descriptor.
    pub fn get(&self, name: &str) -> Option<&PeerDescriptor> {
        self.peers.get(name)
    }

    /// Look up a descriptor mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut PeerDescriptor> {
        self.peers.get_mut(name)
    }

    /// Number of recorded descriptors.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// True when nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Clone out the descriptors of `names`, skipping unknown ones.
    pub fn ordered(&self, names: &[String]) -> Vec<PeerDescriptor> {
        names
            .iter()
            .filter_map(|name| self.peers.get(name).cloned())
            .collect()
    }
}

/// Summary of a successful run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    /// Chain id written into every genesis.
    pub chain_id: String,
    /// Root validator.
    pub root: RootInfo,
    /// Peers in declaration order.
    pub peers: Vec<PeerDescriptor>,
}

/// Run options, filled from the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootstrapOptions {
    /// Network declaration file.
    pub config_path: PathBuf,
    /// Log command output.
    pub debug: bool,
    /// Node binary name or path.
    pub node_binary: String,
    /// Passed to `init --default-denom` when set.
    pub default_denom: Option<String>,
    /// Chain id, unless the declaration's genesis carries one.
    pub chain_id: String,
    /// Keyring passphrase answered to prompts.
    pub key_phrase: String,
    /// Keyring backend.
    pub keyring_backend: KeyringBackend,
}

impl BootstrapOptions {
    /// Chain id to use for `declaration`: `genesis.chain_id` wins when set.
    pub fn effective_chain_id(&self, declaration: &NetworkDeclaration) -> String {
        declaration
            .genesis_chain_id()
            .map_or_else(|| self.chain_id.clone(), str::to_string)
    }
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            debug: false,
            node_binary: DEFAULT_NODE_BINARY.to_string(),
            default_denom: Some(DEFAULT_DENOM.to_string()),
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            key_phrase: DEFAULT_KEY_PHRASE.to_string(),
            keyring_backend: KeyringBackend::File,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declaration() -> NetworkDeclaration {
        serde_yaml::from_str(
            r#"
accounts:
  - name: a
    coins: ["100stake"]
  - name: b
    coins: ["5stake", "7token"]
validators:
  - name: a
    bonded: 50stake
    home: /tmp/a
    ip: 127.0.0.1
    config:
      moniker: a
      consensus: { timeout_commit: 1s }
      p2p: { laddr: "tcp://0.0.0.0:26656" }
      rpc: { laddr: "tcp://0.0.0.0:26657" }
genesis:
  chain_id: " demo-1 "
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_account_balances() {
        let decl = declaration();
        assert_eq!(decl.account_balances("a"), "100stake");
        assert_eq!(decl.account_balances("b"), "5stake,7token");
        assert_eq!(decl.account_balances("nobody"), "");
    }

    #[test]
    fn test_required_fields_read_by_path() {
        let decl = declaration();
        let root = decl.root().unwrap();
        assert_eq!(root.p2p_laddr(), "tcp://0.0.0.0:26656");
        assert_eq!(root.moniker(), "a");
        assert_eq!(
            root.field(ValidatorField::CommitTimeout).as_deref(),
            Some("1s")
        );
        assert!(root.app.is_empty());
    }

    #[test]
    fn test_genesis_chain_id_trimmed() {
        assert_eq!(declaration().genesis_chain_id(), Some("demo-1"));
        assert_eq!(NetworkDeclaration::default().genesis_chain_id(), None);
    }

    #[test]
    fn test_genesis_chain_id_overrides_option() {
        let options = BootstrapOptions::default();
        assert_eq!(options.effective_chain_id(&declaration()), "demo-1");
        assert_eq!(
            options.effective_chain_id(&NetworkDeclaration::default()),
            DEFAULT_CHAIN_ID
        );
    }

    #[test]
    fn test_blank_field_is_missing() {
        let spec = ValidatorSpec {
            ip: "  ".into(),
            ..Default::default()
        };
        assert!(spec.field(ValidatorField::Ip).is_none());
        assert!(spec.field(ValidatorField::Moniker).is_none());
    }

    #[test]
    fn test_peer_table_ordered() {
        let mut table = PeerTable::new();
        table.insert(PeerDescriptor::new("z", "1@z:1"));
        table.insert(PeerDescriptor::new("a", "2@a:1"));
        let names = vec!["z".to_string(), "a".to_string(), "missing".to_string()];
        let ordered = table.ordered(&names);
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0].name, "z");
    }
}
