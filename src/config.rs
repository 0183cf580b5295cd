//! Keeper configuration - constructed by the binary, injected everywhere.
//!
//! The key-encryption passphrase lives here, supplied by the operator; it is
//! deliberately not a constant baked into the adapter.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct KeeperConfig {
    /// Ledger node JSON-RPC endpoint.
    pub rpc_url: String,
    /// Directory holding encrypted keyfiles. Must exist.
    pub wallet_dir: PathBuf,
    /// Path to the account -> address binding file. Must exist.
    pub account_path: PathBuf,
    /// Passphrase every generated key is encrypted under.
    pub passphrase: String,
    /// Per-request timeout for ledger RPCs.
    pub request_timeout: Duration,
    /// HTTP listen address for the keeper surface.
    pub listen: SocketAddr,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wallet-keeper");
        Self {
            rpc_url: "http://127.0.0.1:8545".into(),
            wallet_dir: data_dir.join("keystore"),
            account_path: data_dir.join("accounts.json"),
            passphrase: String::new(),
            request_timeout: Duration::from_secs(10),
            listen: ([127, 0, 0, 1], 7080).into(),
        }
    }
}

impl KeeperConfig {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            ..Default::default()
        }
    }

    pub fn with_wallet_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.wallet_dir = dir.into();
        self
    }

    pub fn with_account_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.account_path = path.into();
        self
    }

    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = passphrase.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_listen(mut self, listen: SocketAddr) -> Self {
        self.listen = listen;
        self
    }
}
