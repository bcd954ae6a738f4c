//! # Domain Value Objects
//!
//! Small immutable types shared by the pipeline: keyring backends, document
//! formats, pipeline stages and provisioning steps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default P2P port used when a listen address cannot be parsed.
pub const DEFAULT_P2P_PORT: u16 = 26656;

/// Prompt printed by the node binary before reading the keyring passphrase.
pub const PASSPHRASE_PROMPT: &str = "Enter keyring passphrase";

/// Confirmation prompt printed the first time a keyring is created.
pub const PASSPHRASE_CONFIRM_PROMPT: &str = "Re-enter keyring passphrase";

/// Keyring storage backend passed to the node binary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyringBackend {
    /// OS native credential store. Node default.
    Os,
    /// Encrypted files under the home directory.
    #[default]
    File,
    /// KDE wallet.
    Kwallet,
    /// `pass` password store.
    Pass,
    /// Unencrypted files, for testing.
    Test,
    /// In-memory, lost when the process exits.
    Memory,
}

impl KeyringBackend {
    /// All backends, in declaration order.
    pub const ALL: [KeyringBackend; 6] = [
        Self::Os,
        Self::File,
        Self::Kwallet,
        Self::Pass,
        Self::Test,
        Self::Memory,
    ];

    /// Name understood by the node binary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Os => "os",
            Self::File => "file",
            Self::Kwallet => "kwallet",
            Self::Pass => "pass",
            Self::Test => "test",
            Self::Memory => "memory",
        }
    }

    /// Whether key operations ask for a passphrase on stdin.
    pub fn requires_passphrase(&self) -> bool {
        !matches!(self, Self::Test | Self::Memory)
    }

    /// Whether the backend must be written into the node client config.
    ///
    /// `os` is what the node falls back to, so nothing needs configuring.
    pub fn requires_client_config(&self) -> bool {
        !matches!(self, Self::Os)
    }

    /// Directory name of the keyring inside a node home.
    pub fn dir_name(&self) -> String {
        format!("keyring-{}", self.as_str())
    }
}

impl fmt::Display for KeyringBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown keyring backend name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown keyring backend `{0}` (expected one of os, file, kwallet, pass, test, memory)")]
pub struct UnknownKeyringBackend(pub String);

impl FromStr for KeyringBackend {
    type Err = UnknownKeyringBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|backend| backend.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownKeyringBackend(s.to_string()))
    }
}

/// Serialization format of a structured document on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// TOML (`app.toml`, `config.toml`).
    Toml,
    /// JSON (`genesis.json`).
    Json,
    /// YAML (network declaration).
    Yaml,
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Toml => "toml",
            Self::Json => "json",
            Self::Yaml => "yaml",
        })
    }
}

/// Stage of the bootstrap pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    /// Load the declaration and check its invariants.
    #[default]
    ParseAndValidate,
    /// Run the per-validator provisioning sequence.
    ProvisionNodes,
    /// Merge `app.toml` overrides.
    MergeAppConfig,
    /// Merge `config.toml` overrides and persistent peers.
    MergeNetworkConfig,
    /// Merge genesis overrides into the root genesis.
    MergeGenesis,
    /// Copy the root genesis to every other validator.
    SyncGenesis,
    /// Pipeline finished.
    Done,
}

impl PipelineStage {
    /// Stage that follows this one, `None` once done.
    pub fn next(&self) -> Option<PipelineStage> {
        match self {
            Self::ParseAndValidate => Some(Self::ProvisionNodes),
            Self::ProvisionNodes => Some(Self::MergeAppConfig),
            Self::MergeAppConfig => Some(Self::MergeNetworkConfig),
            Self::MergeNetworkConfig => Some(Self::MergeGenesis),
            Self::MergeGenesis => Some(Self::SyncGenesis),
            Self::SyncGenesis => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Check if transition is valid. Only the immediate successor is allowed.
    pub fn can_transition_to(&self, next: PipelineStage) -> bool {
        self.next() == Some(next)
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Snake case name used in logs and errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseAndValidate => "parse_and_validate",
            Self::ProvisionNodes => "provision_nodes",
            Self::MergeAppConfig => "merge_app_config",
            Self::MergeNetworkConfig => "merge_network_config",
            Self::MergeGenesis => "merge_genesis",
            Self::SyncGenesis => "sync_genesis",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable state of a pipeline run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing has run yet.
    Idle,
    /// Currently executing the given stage.
    Running(PipelineStage),
    /// All stages completed.
    Done,
    /// Aborted. No stage is re-entered after this.
    Failed {
        /// Stage that raised the error.
        stage: PipelineStage,
        /// Rendered error.
        reason: String,
    },
}

impl PipelineState {
    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed { .. })
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Running(stage) => write!(f, "running {stage}"),
            Self::Done => f.write_str("done"),
            Self::Failed { stage, .. } => write!(f, "failed in {stage}"),
        }
    }
}

/// One step of the per-validator provisioning sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProvisionStep {
    /// Wipe and recreate the home directory.
    ResetHome,
    /// Write keyring backend and chain id into the client config.
    ConfigureClient,
    /// `init`.
    InitChain,
    /// `keys add` into the root keyring.
    AddKey,
    /// Copy the root keyring into a non-root home.
    ShareKeyring,
    /// `add-genesis-account`.
    AddGenesisAccount,
    /// `gentx`.
    GenerateGentx,
    /// `collect-gentxs`.
    CollectGentxs,
    /// Copy the gentx into the root pending directory.
    ForwardGentx,
    /// `tendermint show-node-id`.
    QueryNodeId,
    /// `validate-genesis` on the root.
    ValidateGenesis,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ResetHome => "reset home",
            Self::ConfigureClient => "configure client",
            Self::InitChain => "init chain",
            Self::AddKey => "add key",
            Self::ShareKeyring => "share keyring",
            Self::AddGenesisAccount => "add genesis account",
            Self::GenerateGentx => "generate gentx",
            Self::CollectGentxs => "collect gentxs",
            Self::ForwardGentx => "forward gentx",
            Self::QueryNodeId => "query node id",
            Self::ValidateGenesis => "validate genesis",
        })
    }
}

/// Required validator field, reported by [`crate::domain::ValidationError::MissingField`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValidatorField {
    /// `ip`.
    Ip,
    /// `home`.
    Home,
    /// `config.p2p.laddr`.
    P2pAddress,
    /// `config.rpc.laddr`.
    RpcAddress,
    /// `config.moniker`.
    Moniker,
    /// `config.consensus.timeout_commit`.
    CommitTimeout,
    /// `bonded`.
    BondedStake,
}

impl ValidatorField {
    /// Path of the field inside the declaration.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Ip => "ip",
            Self::Home => "home",
            Self::P2pAddress => "config.p2p.laddr",
            Self::RpcAddress => "config.rpc.laddr",
            Self::Moniker => "config.moniker",
            Self::CommitTimeout => "config.consensus.timeout_commit",
            Self::BondedStake => "bonded",
        }
    }
}

impl fmt::Display for ValidatorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
