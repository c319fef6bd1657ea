//! Command-line and environment configuration.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Parser, Debug)]
#[command(name = "ledger-node")]
#[command(about = "A validator-signed ledger node", long_about = None)]
pub struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "LEDGER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Interface to bind
    #[arg(long, env = "LEDGER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Directory for the registry database and node key
    #[arg(short, long, env = "LEDGER_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Address other nodes reach this node on (defaults to host:port)
    #[arg(long, env = "LEDGER_ADVERTISE")]
    pub advertise: Option<String>,

    /// Existing node to join: its registry is copied and this node is
    /// announced to it as a non-validator
    #[arg(long, env = "LEDGER_JOIN")]
    pub join: Option<String>,

    /// Seconds to wait for a peer's chain
    #[arg(long, env = "LEDGER_PEER_TIMEOUT_SECS", default_value_t = 5)]
    pub peer_timeout_secs: u64,

    /// Log filter, e.g. `info` or `ledger_chain=debug`
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log: String,
}

/// Resolved node settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub advertise: String,
    pub join: Option<String>,
    pub peer_timeout: Duration,
    pub log: String,
}

impl NodeConfig {
    /// `host:port` to bind the listener on.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.data_dir.join("registry")
    }

    pub fn keys_dir(&self) -> PathBuf {
        self.data_dir.join("keys")
    }
}

impl From<Cli> for NodeConfig {
    fn from(cli: Cli) -> Self {
        let advertise = cli
            .advertise
            .unwrap_or_else(|| format!("{}:{}", cli.host, cli.port));

        Self {
            host: cli.host,
            port: cli.port,
            data_dir: cli.data_dir,
            advertise,
            join: cli.join,
            peer_timeout: Duration::from_secs(cli.peer_timeout_secs),
            log: cli.log,
        }
    }
}
