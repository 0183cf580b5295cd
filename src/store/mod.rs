//! Address book - durable account -> address directory
//!
//! The account-based ledger has no account namespace of its own, so the
//! keeper maintains the mapping itself: one JSON document read wholesale at
//! startup and rewritten wholesale on every mutation. The in-memory map is
//! the serving copy; the file is the source of truth across restarts.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("address book io: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} is not a regular file")]
    NotAFile(PathBuf),

    #[error("malformed address book: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("account {0} does not exist")]
    NotFound(String),

    #[error("account {0} already exists")]
    AlreadyExists(String),

    #[error("binding for {account} rolled back, address book not persisted: {source}")]
    Persist {
        account: String,
        source: std::io::Error,
    },
}

/// Account -> address directory backed by a JSON file.
///
/// Inserts hold the write lock across the existence check, the mutation and
/// the flush, so two concurrent creates for one name cannot both win and the
/// file never lags behind a successful insert. Lookups take the read lock.
#[derive(Debug)]
pub struct AddressBook {
    path: PathBuf,
    bindings: RwLock<BTreeMap<String, String>>,
}

impl AddressBook {
    /// Load the directory from `path`. Construction is the only load point;
    /// the file must exist and parse or the keeper refuses to start.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let meta = fs::metadata(&path)?;
        if !meta.is_file() {
            return Err(StoreError::NotAFile(path));
        }
        let raw = fs::read_to_string(&path)?;
        let bindings: BTreeMap<String, String> = serde_json::from_str(&raw)?;
        Ok(Self {
            path,
            bindings: RwLock::new(bindings),
        })
    }

    /// Bound address for `account`, exact match.
    pub fn lookup(&self, account: &str) -> Result<String, StoreError> {
        self.read()
            .get(account)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(account.to_string()))
    }

    /// Bind `account` to `address` and flush the whole map to disk.
    ///
    /// If the flush fails the binding is removed again before the error is
    /// returned, so memory and disk stay reconciled and a retry is not
    /// shadowed by a phantom entry.
    pub fn insert(&self, account: &str, address: &str) -> Result<(), StoreError> {
        let mut bindings = self.write();
        if bindings.contains_key(account) {
            return Err(StoreError::AlreadyExists(account.to_string()));
        }
        bindings.insert(account.to_string(), address.to_string());
        if let Err(source) = Self::flush(&self.path, &bindings) {
            bindings.remove(account);
            return Err(StoreError::Persist {
                account: account.to_string(),
                source,
            });
        }
        Ok(())
    }

    /// Rewrite the backing file from the current map. Safe to call
    /// repeatedly; output is byte-stable between mutations.
    pub fn persist(&self) -> Result<(), StoreError> {
        Self::flush(&self.path, &self.read()).map_err(StoreError::Io)
    }

    /// All bound account names, sorted.
    pub fn accounts(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // Serialize the whole map and atomically replace the backing file, so a
    // crash mid-write never truncates the directory. BTreeMap ordering keeps
    // repeated flushes byte-identical.
    fn flush(path: &Path, bindings: &BTreeMap<String, String>) -> Result<(), std::io::Error> {
        let doc = serde_json::to_vec_pretty(bindings).map_err(std::io::Error::from)?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&doc)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, String>> {
        self.bindings.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, String>> {
        self.bindings.write().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed(dir: &TempDir, entries: &[(&str, &str)]) -> PathBuf {
        let map: BTreeMap<&str, &str> = entries.iter().cloned().collect();
        let path = dir.path().join("accounts.json");
        fs::write(&path, serde_json::to_vec(&map).unwrap()).unwrap();
        path
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = AddressBook::open(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }

    #[test]
    fn open_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = AddressBook::open(dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::NotAFile(_)));
    }

    #[test]
    fn open_malformed_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.json");
        fs::write(&path, b"not json").unwrap();
        let err = AddressBook::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
    }

    #[test]
    fn lookup_hits_and_misses() {
        let dir = TempDir::new().unwrap();
        let path = seed(&dir, &[("alice", "0xABC")]);
        let book = AddressBook::open(&path).unwrap();

        assert_eq!(book.lookup("alice").unwrap(), "0xABC");
        assert!(matches!(
            book.lookup("bob").unwrap_err(),
            StoreError::NotFound(name) if name == "bob"
        ));
    }

    #[test]
    fn insert_persists_and_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = seed(&dir, &[("alice", "0xABC")]);
        let book = AddressBook::open(&path).unwrap();

        book.insert("bob", "0xDEF").unwrap();

        let reopened = AddressBook::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert!(!reopened.is_empty());
        assert_eq!(reopened.accounts(), vec!["alice", "bob"]);
        assert_eq!(reopened.lookup("alice").unwrap(), "0xABC");
        assert_eq!(reopened.lookup("bob").unwrap(), "0xDEF");
    }

    #[test]
    fn insert_duplicate_leaves_binding_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = seed(&dir, &[("alice", "0xABC")]);
        let book = AddressBook::open(&path).unwrap();

        let err = book.insert("alice", "0xOTHER").unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(name) if name == "alice"));
        assert_eq!(book.lookup("alice").unwrap(), "0xABC");
    }

    #[test]
    fn persist_is_byte_stable() {
        let dir = TempDir::new().unwrap();
        let path = seed(&dir, &[("b", "0x2"), ("a", "0x1")]);
        let book = AddressBook::open(&path).unwrap();

        book.persist().unwrap();
        let first = fs::read(&path).unwrap();
        book.persist().unwrap();
        let second = fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn failed_flush_rolls_back_the_binding() {
        let dir = TempDir::new().unwrap();
        let path = seed(&dir, &[("alice", "0xABC")]);
        let book = AddressBook::open(&path).unwrap();

        // Remove the backing directory so the temp-file write cannot land.
        fs::remove_dir_all(dir.path()).unwrap();

        let err = book.insert("bob", "0xDEF").unwrap_err();
        assert!(matches!(err, StoreError::Persist { account, .. } if account == "bob"));
        assert!(matches!(book.lookup("bob").unwrap_err(), StoreError::NotFound(_)));
    }
}
