//! Account-based ledger adapter
//!
//! Answers the keeper surface over an account-model chain. The chain keeps
//! balances per address and has no account namespace, so the adapter owns a
//! name -> address directory (`AddressBook`) and consults it on every call.
//! UTXO-only operations are reported as unsupported rather than faked.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::config::KeeperConfig;
use crate::keeper::{Account, KeeperError, Unspent, WalletKeeper};
use crate::keystore::{DiskKeystore, KeyProvider};
use crate::ledger::{self, HttpTransport, LedgerTransport};
use crate::store::AddressBook;

pub struct EthKeeper {
    book: AddressBook,
    keys: Box<dyn KeyProvider>,
    transport: Box<dyn LedgerTransport>,
    passphrase: String,
}

impl EthKeeper {
    /// Construct from config: load the address book, open the keystore and
    /// the RPC transport. Any failure is fatal; the keeper never serves with
    /// partial state.
    pub fn open(config: &KeeperConfig) -> Result<Self, KeeperError> {
        let book = AddressBook::open(&config.account_path)?;
        let keys = DiskKeystore::open(&config.wallet_dir)?;
        let transport = HttpTransport::new(&config.rpc_url, config.request_timeout)?;
        info!(
            accounts = book.len(),
            path = %config.account_path.display(),
            "address book loaded"
        );
        Ok(Self::with_parts(
            book,
            Box::new(keys),
            Box::new(transport),
            config.passphrase.clone(),
        ))
    }

    /// Composition seam for tests and alternative collaborators.
    pub fn with_parts(
        book: AddressBook,
        keys: Box<dyn KeyProvider>,
        transport: Box<dyn LedgerTransport>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            book,
            keys,
            transport,
            passphrase: passphrase.into(),
        }
    }
}

#[async_trait]
impl WalletKeeper for EthKeeper {
    async fn ping(&self) -> Result<(), KeeperError> {
        Ok(())
    }

    async fn block_height(&self) -> Result<i64, KeeperError> {
        let raw = self.transport.call("eth_blockNumber", json!([])).await?;
        let quantity = raw
            .as_str()
            .ok_or_else(|| KeeperError::Decode(raw.to_string()))?;
        ledger::decode_quantity(quantity).map_err(|e| KeeperError::Decode(e.to_string()))
    }

    async fn address(&self, account: &str) -> Result<String, KeeperError> {
        Ok(self.book.lookup(account)?)
    }

    async fn create_account(&self, account: &str) -> Result<Account, KeeperError> {
        // Tolerant probe: any lookup failure means "not bound yet". The
        // authoritative collision check happens inside insert, under the
        // book's write lock.
        if self.book.lookup(account).is_ok() {
            return Err(KeeperError::AlreadyExists(account.to_string()));
        }

        let address = self.keys.generate(&self.passphrase)?;
        self.book.insert(account, &address)?;
        info!(account, address = %address, "account created");

        Ok(Account {
            account: account.to_string(),
            balance: 0.0,
            addresses: vec![address],
        })
    }

    async fn account_info(&self, address: &str, min_conf: u32) -> Result<Account, KeeperError> {
        let _ = (address, min_conf);
        Ok(Account::default())
    }

    async fn new_address(&self, account: &str) -> Result<String, KeeperError> {
        let _ = account;
        Err(KeeperError::Unsupported("getnewaddress"))
    }

    async fn addresses_by_account(&self, account: &str) -> Result<Vec<String>, KeeperError> {
        Ok(vec![self.book.lookup(account)?])
    }

    async fn account_balances(&self, min_conf: u32) -> Result<HashMap<String, f64>, KeeperError> {
        let _ = min_conf;
        Ok(HashMap::new())
    }

    async fn send_to_address(&self, address: &str, amount: f64) -> Result<(), KeeperError> {
        warn!(address, amount, "send_to_address is a stub; no ledger action performed");
        Ok(())
    }

    // TODO: validate the account and check its balance before this is wired
    // into a real transfer path.
    async fn send_from(
        &self,
        account: &str,
        address: &str,
        amount: f64,
    ) -> Result<(), KeeperError> {
        warn!(account, address, amount, "send_from is a stub; no ledger action performed");
        Ok(())
    }

    async fn list_unspent(&self, min_conf: u32) -> Result<Vec<Unspent>, KeeperError> {
        let _ = min_conf;
        Err(KeeperError::Unsupported("listunspent"))
    }

    async fn move_balance(&self, from: &str, to: &str, amount: f64) -> Result<bool, KeeperError> {
        warn!(from, to, amount, "move is a stub; no balance was moved");
        Ok(true)
    }
}
