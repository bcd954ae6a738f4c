//! Shared helpers: a fake node binary that produces the files a real one
//! would, so the pipeline can run end to end inside a temp directory.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use chain_bootstrap::domain::ExecutionError;
use chain_bootstrap::ports::{CommandExecutor, CommandLine};
use chain_bootstrap::service::NodeHome;
use parking_lot::Mutex;

/// Initial `app.toml` written by `init`.
pub const INIT_APP_TOML: &str = r#"minimum-gas-prices = ""
pruning = "default"

[api]
enable = false
address = "tcp://0.0.0.0:1317"
"#;

/// Initial `config.toml` written by `init`.
pub const INIT_NODE_TOML: &str = r#"proxy_app = "tcp://127.0.0.1:26658"

[p2p]
laddr = "tcp://0.0.0.0:26656"
persistent_peers = ""
max_num_inbound_peers = 40

[consensus]
timeout_commit = "5s"
"#;

/// Fake node binary.
#[derive(Default)]
pub struct FakeNode {
    calls: Mutex<Vec<CommandLine>>,
}

impl FakeNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Node id reported for `home`: `node-<dir name>`.
    pub fn node_id(home: &Path) -> String {
        let name = home
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("node-{name}")
    }
}

impl CommandExecutor for FakeNode {
    fn execute(&self, command: &CommandLine) -> Result<String, ExecutionError> {
        self.calls.lock().push(command.clone());
        let args = command.arguments();
        let Some(home) = command.flag_value("--home").map(NodeHome::new) else {
            return Ok(String::new());
        };

        match args.first().map(String::as_str) {
            Some("init") => {
                let chain_id = command.flag_value("--chain-id").unwrap_or_default();
                write(&home.app_config(), INIT_APP_TOML)?;
                write(&home.node_config(), INIT_NODE_TOML)?;
                write(&home.genesis(), &genesis(chain_id, &[]))?;
            }
            Some("gentx") => {
                let name = &args[1];
                let body = format!(r#"{{"validator":"{name}","bonded":"{}"}}"#, args[2]);
                write(&home.gentx_dir().join(format!("gentx-{name}.json")), &body)?;
            }
            Some("collect-gentxs") => {
                let mut gentxs: Vec<String> = fs::read_dir(home.gentx_dir())
                    .map(|entries| {
                        entries
                            .filter_map(Result::ok)
                            .map(|e| e.file_name().to_string_lossy().into_owned())
                            .collect()
                    })
                    .unwrap_or_default();
                gentxs.sort();
                let current = fs::read_to_string(home.genesis())
                    .map_err(|e| ExecutionError::io("read", home.genesis(), e))?;
                let chain_id = serde_json::from_str::<serde_json::Value>(&current)
                    .ok()
                    .and_then(|v| v["chain_id"].as_str().map(str::to_string))
                    .unwrap_or_default();
                write(&home.genesis(), &genesis(&chain_id, &gentxs))?;
            }
            Some("tendermint") => return Ok(format!("{}\n", Self::node_id(home.path()))),
            _ => {}
        }
        Ok(String::new())
    }
}

fn genesis(chain_id: &str, gentxs: &[String]) -> String {
    let doc = serde_json::json!({
        "chain_id": chain_id,
        "genesis_time": "2024-01-01T00:00:00Z",
        "app_state": {
            "genutil": { "gen_txs": gentxs },
            "staking": { "params": { "bond_denom": "stake", "max_validators": 100 } },
        },
    });
    serde_json::to_string_pretty(&doc).unwrap_or_default()
}

fn write(path: &Path, content: &str) -> Result<(), ExecutionError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ExecutionError::io("create", parent, e))?;
    }
    fs::write(path, content).map_err(|e| ExecutionError::io("write", path, e))
}

/// Declaration YAML for `names`, homes under `base`, with one override per
/// document kind.
pub fn declaration_yaml(base: &Path, names: &[&str]) -> String {
    let mut yaml = String::from("accounts:\n");
    for name in names {
        yaml.push_str(&format!(
            "  - name: {name}\n    coins: [\"1000stake\", \"5token\"]\n"
        ));
    }
    yaml.push_str("validators:\n");
    for (idx, name) in names.iter().enumerate() {
        let home: PathBuf = base.join(name);
        let port = 26656 + idx * 10;
        yaml.push_str(&format!(
            r#"  - name: {name}
    bonded: 500stake
    home: {home}
    ip: 10.0.0.{ip}
    app:
      api: {{ enable: true }}
    config:
      moniker: {name}
      consensus: {{ timeout_commit: 1s }}
      p2p: {{ laddr: "tcp://0.0.0.0:{port}" }}
      rpc: {{ laddr: "tcp://0.0.0.0:{rpc}" }}
"#,
            home = home.display(),
            ip = idx + 1,
            rpc = port + 1,
        ));
    }
    yaml.push_str(
        r#"genesis:
  chain_id: e2e-1
  app_state:
    staking:
      params:
        unbonding_time: 60s
"#,
    );
    yaml
}
