//! Node home directory layout and the file operations performed on it.
//!
//! ```text
//! <home>/
//! ├── config/
//! │   ├── app.toml
//! │   ├── config.toml
//! │   ├── genesis.json
//! │   └── gentx/          # pending genesis transactions
//! └── keyring-<backend>/
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::{ExecutionError, KeyringBackend};

/// Config subdirectory of a home.
pub const CONFIG_DIR: &str = "config";
/// Application config file.
pub const APP_CONFIG_FILE: &str = "app.toml";
/// Consensus and network config file.
pub const NODE_CONFIG_FILE: &str = "config.toml";
/// Genesis document.
pub const GENESIS_FILE: &str = "genesis.json";
/// Pending genesis transactions, under the config directory.
pub const GENTX_DIR: &str = "gentx";

/// A validator home directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeHome {
    root: PathBuf,
}

impl NodeHome {
    /// Wrap a home path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Home directory.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// `<home>/config`.
    pub fn config_dir(&self) -> PathBuf {
        self.root.join(CONFIG_DIR)
    }

    /// `<home>/config/app.toml`.
    pub fn app_config(&self) -> PathBuf {
        self.config_dir().join(APP_CONFIG_FILE)
    }

    /// `<home>/config/config.toml`.
    pub fn node_config(&self) -> PathBuf {
        self.config_dir().join(NODE_CONFIG_FILE)
    }

    /// `<home>/config/genesis.json`.
    pub fn genesis(&self) -> PathBuf {
        self.config_dir().join(GENESIS_FILE)
    }

    /// `<home>/config/gentx`.
    pub fn gentx_dir(&self) -> PathBuf {
        self.config_dir().join(GENTX_DIR)
    }

    /// `<home>/keyring-<backend>`.
    pub fn keyring_dir(&self, backend: KeyringBackend) -> PathBuf {
        self.root.join(backend.dir_name())
    }

    /// Remove the home and create it again, empty.
    pub fn reset(&self) -> Result<(), ExecutionError> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => debug!(home = %self.root.display(), "removed old home"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(ExecutionError::io("remove", &self.root, e)),
        }
        fs::create_dir_all(&self.root).map_err(|e| ExecutionError::io("create", &self.root, e))
    }

    /// Copy the keyring of `source` into this home.
    ///
    /// The keyring directory is created even when `source` has none, which
    /// happens for backends that keep keys outside the home.
    pub fn share_keyring_from(
        &self,
        source: &NodeHome,
        backend: KeyringBackend,
    ) -> Result<(), ExecutionError> {
        let from = source.keyring_dir(backend);
        let to = self.keyring_dir(backend);
        fs::create_dir_all(&to).map_err(|e| ExecutionError::io("create", &to, e))?;
        if from.is_dir() {
            copy_dir_all(&from, &to)?;
        }
        Ok(())
    }

    /// Copy every `*.json` gentx of this home into the pending directory of
    /// `root`. Returns the copied destinations.
    pub fn forward_gentxs_to(&self, root: &NodeHome) -> Result<Vec<PathBuf>, ExecutionError> {
        let from = self.gentx_dir();
        let to = root.gentx_dir();
        fs::create_dir_all(&to).map_err(|e| ExecutionError::io("create", &to, e))?;

        let entries = fs::read_dir(&from).map_err(|e| ExecutionError::io("read", &from, e))?;
        let mut copied = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ExecutionError::io("read", &from, e))?.path();
            let is_json = path.extension().is_some_and(|ext| ext == "json");
            let Some(name) = path.file_name() else {
                continue;
            };
            if !is_json || !path.is_file() {
                continue;
            }
            let target = to.join(name);
            fs::copy(&path, &target).map_err(|e| ExecutionError::io("copy", &path, e))?;
            copied.push(target);
        }
        copied.sort();
        Ok(copied)
    }

    /// Overwrite this home's genesis with the one of `source`.
    pub fn copy_genesis_from(&self, source: &NodeHome) -> Result<(), ExecutionError> {
        let from = source.genesis();
        let to = self.genesis();
        fs::create_dir_all(self.config_dir())
            .map_err(|e| ExecutionError::io("create", self.config_dir(), e))?;
        fs::copy(&from, &to).map_err(|e| ExecutionError::io("copy", &from, e))?;
        Ok(())
    }
}

fn copy_dir_all(from: &Path, to: &Path) -> Result<(), ExecutionError> {
    fs::create_dir_all(to).map_err(|e| ExecutionError::io("create", to, e))?;
    let entries = fs::read_dir(from).map_err(|e| ExecutionError::io("read", from, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ExecutionError::io("read", from, e))?;
        let path = entry.path();
        let target = to.join(entry.file_name());
        if path.is_dir() {
            copy_dir_all(&path, &target)?;
        } else {
            fs::copy(&path, &target).map_err(|e| ExecutionError::io("copy", &path, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_layout() {
        let home = NodeHome::new("/h");
        assert_eq!(home.app_config(), PathBuf::from("/h/config/app.toml"));
        assert_eq!(home.node_config(), PathBuf::from("/h/config/config.toml"));
        assert_eq!(home.genesis(), PathBuf::from("/h/config/genesis.json"));
        assert_eq!(home.gentx_dir(), PathBuf::from("/h/config/gentx"));
        assert_eq!(
            home.keyring_dir(KeyringBackend::Test),
            PathBuf::from("/h/keyring-test")
        );
    }

    #[test]
    fn test_reset_wipes_contents() {
        let dir = tempdir().unwrap();
        let home = NodeHome::new(dir.path().join("node"));
        home.reset().unwrap();
        fs::write(home.path().join("stale"), "x").unwrap();
        home.reset().unwrap();
        assert!(home.path().is_dir());
        assert_eq!(fs::read_dir(home.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_share_keyring_copies_tree() {
        let dir = tempdir().unwrap();
        let root = NodeHome::new(dir.path().join("root"));
        let other = NodeHome::new(dir.path().join("other"));
        let keyring = root.keyring_dir(KeyringBackend::File);
        fs::create_dir_all(keyring.join("nested")).unwrap();
        fs::write(keyring.join("alice.info"), "k").unwrap();
        fs::write(keyring.join("nested").join("x"), "y").unwrap();

        other.share_keyring_from(&root, KeyringBackend::File).unwrap();
        let copied = other.keyring_dir(KeyringBackend::File);
        assert_eq!(fs::read_to_string(copied.join("alice.info")).unwrap(), "k");
        assert!(copied.join("nested").join("x").is_file());
    }

    #[test]
    fn test_share_keyring_without_source_creates_empty_dir() {
        let dir = tempdir().unwrap();
        let root = NodeHome::new(dir.path().join("root"));
        let other = NodeHome::new(dir.path().join("other"));
        other.share_keyring_from(&root, KeyringBackend::Memory).unwrap();
        assert!(other.keyring_dir(KeyringBackend::Memory).is_dir());
    }

    #[test]
    fn test_forward_gentxs_only_json() {
        let dir = tempdir().unwrap();
        let root = NodeHome::new(dir.path().join("root"));
        let node = NodeHome::new(dir.path().join("node"));
        fs::create_dir_all(node.gentx_dir()).unwrap();
        fs::write(node.gentx_dir().join("gentx-1.json"), "{}").unwrap();
        fs::write(node.gentx_dir().join("notes.txt"), "-").unwrap();

        let copied = node.forward_gentxs_to(&root).unwrap();
        assert_eq!(copied, vec![root.gentx_dir().join("gentx-1.json")]);
        assert!(!root.gentx_dir().join("notes.txt").exists());
    }

    #[test]
    fn test_forward_gentxs_missing_dir_is_io_error() {
        let dir = tempdir().unwrap();
        let root = NodeHome::new(dir.path().join("root"));
        let node = NodeHome::new(dir.path().join("node"));
        let err = node.forward_gentxs_to(&root).unwrap_err();
        assert!(matches!(err, ExecutionError::Io { operation: "read", .. }));
    }

    #[test]
    fn test_copy_genesis() {
        let dir = tempdir().unwrap();
        let root = NodeHome::new(dir.path().join("root"));
        let node = NodeHome::new(dir.path().join("node"));
        fs::create_dir_all(root.config_dir()).unwrap();
        fs::write(root.genesis(), r#"{"chain_id":"x"}"#).unwrap();
        node.copy_genesis_from(&root).unwrap();
        assert_eq!(fs::read(node.genesis()).unwrap(), fs::read(root.genesis()).unwrap());
    }
}
