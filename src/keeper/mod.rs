//! The keeper capability contract
//!
//! One trait every ledger backend implements, UTXO-style or account-based.
//! A backend that cannot express an operation returns
//! `KeeperError::Unsupported` instead of pretending to succeed; callers can
//! treat heterogeneous chains uniformly and still learn which calls are
//! meaningless for a given backend.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keystore::KeystoreError;
use crate::ledger::TransportError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum KeeperError {
    #[error("account {0} does not exist")]
    NotFound(String),

    #[error("account {0} already exists")]
    AlreadyExists(String),

    #[error("{0} is not a valid operation for an account-based ledger")]
    Unsupported(&'static str),

    #[error("ledger transport: {0}")]
    Transport(#[from] TransportError),

    #[error("malformed ledger response: {0}")]
    Decode(String),

    #[error("keystore: {0}")]
    KeyGen(#[from] KeystoreError),

    #[error("address book: {0}")]
    Store(StoreError),
}

// Lift the store's typed miss/collision into the keeper taxonomy; everything
// else stays a store error.
impl From<StoreError> for KeeperError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(account) => KeeperError::NotFound(account),
            StoreError::AlreadyExists(account) => KeeperError::AlreadyExists(account),
            other => KeeperError::Store(other),
        }
    }
}

/// Caller-facing account summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account: String,
    pub balance: f64,
    pub addresses: Vec<String>,
}

/// One unspent transaction output, for backends that have a UTXO set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Unspent {
    pub txid: String,
    pub vout: u32,
    pub address: String,
    pub account: String,
    pub amount: f64,
    pub confirmations: u32,
}

/// Wallet service surface shared by all ledger backends.
#[async_trait]
pub trait WalletKeeper: Send + Sync {
    /// Liveness no-op.
    async fn ping(&self) -> Result<(), KeeperError>;

    /// Current chain height of the remote ledger.
    async fn block_height(&self) -> Result<i64, KeeperError>;

    /// Default address bound to `account`.
    async fn address(&self, account: &str) -> Result<String, KeeperError>;

    /// Create `account`: generate a key under the configured passphrase,
    /// bind its address, persist the directory.
    async fn create_account(&self, account: &str) -> Result<Account, KeeperError>;

    /// Account summary for `address`. Balance lookup is not implemented;
    /// this returns the empty record unconditionally.
    async fn account_info(&self, address: &str, min_conf: u32) -> Result<Account, KeeperError>;

    /// Fresh ad-hoc address per call. Unsupported on account-based ledgers,
    /// where an account keeps one address for life.
    async fn new_address(&self, account: &str) -> Result<String, KeeperError>;

    /// All addresses bound to `account`. Single-element today; the sequence
    /// return type leaves room for multi-address accounts.
    async fn addresses_by_account(&self, account: &str) -> Result<Vec<String>, KeeperError>;

    /// Per-account balances at `min_conf` confirmations. Unimplemented;
    /// always empty.
    async fn account_balances(&self, min_conf: u32) -> Result<HashMap<String, f64>, KeeperError>;

    /// Stub: accepted, performs no ledger action.
    async fn send_to_address(&self, address: &str, amount: f64) -> Result<(), KeeperError>;

    /// Stub: accepted, performs no ledger action.
    async fn send_from(&self, account: &str, address: &str, amount: f64)
        -> Result<(), KeeperError>;

    /// Unspent outputs at `min_conf`. Account-based ledgers have no UTXO
    /// set, so this is always unsupported here.
    async fn list_unspent(&self, min_conf: u32) -> Result<Vec<Unspent>, KeeperError>;

    /// Stub: reports success without moving anything.
    async fn move_balance(&self, from: &str, to: &str, amount: f64) -> Result<bool, KeeperError>;
}
