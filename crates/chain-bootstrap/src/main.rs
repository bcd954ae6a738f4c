//! chain-bootstrap: bring up a local multi-validator network.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use bootstrap_telemetry::{init_telemetry, TelemetryConfig};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

use chain_bootstrap::adapters::{ensure_expect, FileDocumentStore, ProcessCommandExecutor};
use chain_bootstrap::domain::{
    BootstrapOptions, KeyringBackend, DEFAULT_CHAIN_ID, DEFAULT_CONFIG_PATH, DEFAULT_DENOM,
    DEFAULT_KEY_PHRASE, DEFAULT_NODE_BINARY,
};
use chain_bootstrap::{BootstrapOrchestrator, StageMonitor, VERSION};

/// Bootstrap a multi-validator network from a declaration file
#[derive(Parser, Debug)]
#[command(name = "chain-bootstrap", version = VERSION)]
#[command(about = "Provision validator homes, peers and genesis for a local network")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize every validator declared in the config file
    Init(InitArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    /// Network declaration file
    #[arg(short, long, env = "BOOTSTRAP_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log debug output, including captured command output
    #[arg(long, env = "BOOTSTRAP_DEBUG")]
    debug: bool,

    /// Node binary name or path
    #[arg(short = 'n', long, env = "BOOTSTRAP_NODE_CMD", default_value = DEFAULT_NODE_BINARY)]
    node_cmd: String,

    /// Denom passed to `init --default-denom` (empty to omit the flag)
    #[arg(short = 'd', long, env = "BOOTSTRAP_DEFAULT_DENOM", default_value = DEFAULT_DENOM)]
    default_denom: String,

    /// Chain id, unless the declaration's genesis sets one
    #[arg(long, env = "BOOTSTRAP_CHAIN_ID", default_value = DEFAULT_CHAIN_ID)]
    chain_id: String,

    /// Keyring passphrase
    #[arg(
        short = 'p',
        long,
        env = "BOOTSTRAP_KEY_PHRASE",
        default_value = DEFAULT_KEY_PHRASE,
        hide_env_values = true
    )]
    key_phrase: String,

    /// Keyring backend: os, file, kwallet, pass, test or memory
    #[arg(short = 'k', long, env = "BOOTSTRAP_KEYRING_BACKEND", default_value = "file")]
    keyring_backend: KeyringBackend,
}

impl From<InitArgs> for BootstrapOptions {
    fn from(args: InitArgs) -> Self {
        let denom = args.default_denom.trim();
        Self {
            config_path: args.config,
            debug: args.debug,
            node_binary: args.node_cmd,
            default_denom: (!denom.is_empty()).then(|| denom.to_string()),
            chain_id: args.chain_id,
            key_phrase: args.key_phrase,
            keyring_backend: args.keyring_backend,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let Command::Init(args) = cli.command;
    let options = BootstrapOptions::from(args);

    let telemetry = TelemetryConfig::from_env().with_debug(options.debug);
    if let Err(e) = init_telemetry(&telemetry) {
        eprintln!("Warning: {e}");
    }

    match run_init(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_init(options: BootstrapOptions) -> Result<()> {
    info!(
        version = VERSION,
        config = %options.config_path.display(),
        node = %options.node_binary,
        keyring_backend = %options.keyring_backend,
        "starting bootstrap"
    );

    let mut executor = ProcessCommandExecutor::new().with_output_logging(options.debug);
    if options.keyring_backend.requires_passphrase() {
        let expect = ensure_expect(&executor).context("preflight check failed")?;
        info!(path = %expect.display(), "prompt automation available");
        executor = executor.with_expect_program(expect.to_string_lossy());
    }

    let config_path = options.config_path.clone();
    let mut orchestrator = BootstrapOrchestrator::new(options, executor, FileDocumentStore::new());
    trap_interrupt(orchestrator.monitor())?;
    let report = orchestrator
        .run()
        .with_context(|| format!("bootstrap of {} failed", config_path.display()))?;

    for peer in &report.peers {
        info!(validator = %peer.name, peer = %peer.peer_address, "validator ready");
    }
    info!(
        chain_id = %report.chain_id,
        root = %report.root.name,
        root_home = %report.root.home.display(),
        "network ready"
    );
    Ok(())
}

/// On Ctrl+C, report where the run stopped and exit cleanly. Homes are left
/// as they are; the next run resets them.
fn trap_interrupt(monitor: StageMonitor) -> Result<()> {
    ctrlc::set_handler(move || {
        warn!(state = %monitor.current(), "interrupted, exiting");
        std::process::exit(0);
    })
    .context("failed to install interrupt handler")
}
