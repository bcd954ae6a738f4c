//! Declaration Loader Adapter
//!
//! Reads the YAML network declaration.
//!
//! # File Format
//!
//! ```yaml
//! accounts:
//!   - name: alice
//!     coins: ["100000000stake"]
//! validators:
//!   - name: alice
//!     bonded: 50000000stake
//!     home: ~/.localnet/alice
//!     ip: 127.0.0.1
//!     app: { minimum-gas-prices: "0stake" }
//!     config:
//!       moniker: alice
//!       consensus: { timeout_commit: 1s }
//!       rpc: { laddr: "tcp://0.0.0.0:26657" }
//!       p2p: { laddr: "tcp://0.0.0.0:26656" }
//! genesis:
//!   chain_id: localnet-1
//! ```

use std::fs;
use std::path::Path;

use crate::domain::{DeclarationError, NetworkDeclaration};

/// Load a declaration from a YAML file.
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed.
pub fn load_declaration(path: &Path) -> Result<NetworkDeclaration, DeclarationError> {
    let content = fs::read_to_string(path).map_err(|e| DeclarationError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_declaration(&content, path)
}

/// Parse declaration YAML. `origin` is only used in errors.
pub fn parse_declaration(
    content: &str,
    origin: &Path,
) -> Result<NetworkDeclaration, DeclarationError> {
    if content.trim().is_empty() {
        return Ok(NetworkDeclaration::default());
    }
    serde_yaml::from_str(content).map_err(|e| DeclarationError::Parse {
        path: origin.to_path_buf(),
        reason: e.to_string(),
    })
}
