//! wallet-keeper: one wallet surface over heterogeneous ledgers.
//!
//! Upstream callers speak a UTXO-style wallet vocabulary. This crate adapts
//! that vocabulary to an account-based ledger: calls with a natural
//! translation are delegated, calls with none fail explicitly with
//! `Unsupported` instead of faking success.
//!
//! # Architecture
//!
//! ```text
//! EthKeeper (WalletKeeper trait)
//!     │
//!     ├── AddressBook ──── accounts.json (atomic rewrite per mutation)
//!     │     account -> address directory, RwLock'd
//!     │
//!     ├── DiskKeystore ─── <address>.json keyfiles
//!     │     ed25519 keygen, pbkdf2 + AES-GCM under a passphrase
//!     │
//!     └── HttpTransport ── ledger node JSON-RPC
//!           chain-height queries, per-request timeout
//! ```
//!
//! # Operations
//!
//! | Operation | Behavior on an account-based ledger |
//! |-----------|-------------------------------------|
//! | `ping` | always ok |
//! | `block_height` | RPC `eth_blockNumber`, hex quantity -> i64 |
//! | `address` | directory lookup |
//! | `create_account` | keygen + bind + persist |
//! | `account_info` | empty record (balance lookup unimplemented) |
//! | `new_address` | unsupported |
//! | `addresses_by_account` | single-element list |
//! | `account_balances` | empty map (unimplemented) |
//! | `send_to_address` / `send_from` / `move_balance` | accepted stubs, warn-logged |
//! | `list_unspent` | unsupported (no UTXO set) |

pub mod config;
pub mod eth;
pub mod keeper;
pub mod keystore;
pub mod ledger;
pub mod logging;
pub mod runtime;
pub mod server;
pub mod store;

pub use config::KeeperConfig;
pub use eth::EthKeeper;
pub use keeper::{Account, KeeperError, Unspent, WalletKeeper};
pub use keystore::{DiskKeystore, KeyProvider, KeystoreError};
pub use ledger::{HttpTransport, LedgerTransport, TransportError};
pub use server::{create_router, create_router_with_name};
pub use store::{AddressBook, StoreError};
