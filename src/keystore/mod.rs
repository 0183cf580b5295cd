//! Encrypted on-disk keystore
//!
//! Generates ed25519 keypairs and stores each secret encrypted under a
//! passphrase: pbkdf2-sha256 key derivation, AES-256-GCM, nonce prepended to
//! the ciphertext. One JSON keyfile per derived address.

use std::fs;
use std::path::PathBuf;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use chrono::Utc;
use ed25519_dalek::SigningKey;
use hmac::Hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

const PBKDF2_ROUNDS: u32 = 100_000;

#[derive(Debug, Error)]
pub enum KeystoreError {
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("keystore io: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed keyfile: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("no keyfile for {0}")]
    UnknownAddress(String),

    #[error("key encryption failed")]
    Encrypt,

    #[error("key decryption failed (wrong passphrase?)")]
    Decrypt,
}

/// Key generation seam. The keeper only ever asks for "a new key under this
/// passphrase, give me the derived address".
pub trait KeyProvider: Send + Sync {
    fn generate(&self, passphrase: &str) -> Result<String, KeystoreError>;
}

#[derive(Serialize, Deserialize)]
struct KeyFile {
    address: String,
    salt: String,
    ciphertext: String,
    created_at: String,
}

/// Directory of encrypted keyfiles, one per address.
#[derive(Debug)]
pub struct DiskKeystore {
    dir: PathBuf,
}

impl DiskKeystore {
    /// The directory must already exist; a missing or non-directory path is
    /// a startup error, not something to silently create.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, KeystoreError> {
        let dir = dir.into();
        let meta = fs::metadata(&dir)?;
        if !meta.is_dir() {
            return Err(KeystoreError::NotADirectory(dir));
        }
        Ok(Self { dir })
    }

    /// Decrypt the stored secret for `address` back into a signing key.
    pub fn unlock(&self, address: &str, passphrase: &str) -> Result<SigningKey, KeystoreError> {
        let path = self.keyfile_path(address);
        let raw =
            fs::read_to_string(path).map_err(|_| KeystoreError::UnknownAddress(address.to_string()))?;
        let keyfile: KeyFile = serde_json::from_str(&raw)?;
        let salt = hex::decode(&keyfile.salt).map_err(|_| KeystoreError::Decrypt)?;
        let ciphertext = hex::decode(&keyfile.ciphertext).map_err(|_| KeystoreError::Decrypt)?;
        let secret = decrypt(&ciphertext, passphrase, &salt)?;
        let bytes: [u8; 32] = secret.as_slice().try_into().map_err(|_| KeystoreError::Decrypt)?;
        Ok(SigningKey::from_bytes(&bytes))
    }

    fn keyfile_path(&self, address: &str) -> PathBuf {
        self.dir.join(format!("{address}.json"))
    }
}

impl KeyProvider for DiskKeystore {
    fn generate(&self, passphrase: &str) -> Result<String, KeystoreError> {
        let signing = SigningKey::generate(&mut OsRng);
        let address = derive_address(&signing);

        let mut salt = [0u8; 16];
        OsRng.fill_bytes(&mut salt);
        let ciphertext = encrypt(signing.to_bytes().as_slice(), passphrase, &salt)?;

        let keyfile = KeyFile {
            address: address.clone(),
            salt: hex::encode(salt),
            ciphertext: hex::encode(ciphertext),
            created_at: Utc::now().to_rfc3339(),
        };
        fs::write(self.keyfile_path(&address), serde_json::to_vec_pretty(&keyfile)?)?;
        Ok(address)
    }
}

/// Ledger address for a public key: `0x` + last 20 bytes of sha256(pubkey).
fn derive_address(key: &SigningKey) -> String {
    let digest = Sha256::digest(key.verifying_key().as_bytes());
    format!("0x{}", hex::encode(&digest[12..]))
}

fn derive_cipher_key(passphrase: &str, salt: &[u8]) -> [u8; 32] {
    use pbkdf2::pbkdf2;
    let mut key = [0u8; 32];
    pbkdf2::<Hmac<Sha256>>(passphrase.as_bytes(), salt, PBKDF2_ROUNDS, &mut key);
    key
}

fn encrypt(data: &[u8], passphrase: &str, salt: &[u8]) -> Result<Vec<u8>, KeystoreError> {
    let key = derive_cipher_key(passphrase, salt);
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| KeystoreError::Encrypt)?;

    let nonce_bytes: [u8; 12] = rand::random();
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher.encrypt(nonce, data).map_err(|_| KeystoreError::Encrypt)?;

    let mut out = nonce_bytes.to_vec();
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn decrypt(encrypted: &[u8], passphrase: &str, salt: &[u8]) -> Result<Vec<u8>, KeystoreError> {
    if encrypted.len() < 12 {
        return Err(KeystoreError::Decrypt);
    }
    let key = derive_cipher_key(passphrase, salt);
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| KeystoreError::Decrypt)?;
    let nonce = Nonce::from_slice(&encrypted[..12]);
    cipher
        .decrypt(nonce, &encrypted[12..])
        .map_err(|_| KeystoreError::Decrypt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_requires_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, b"x").unwrap();

        assert!(matches!(
            DiskKeystore::open(&file).unwrap_err(),
            KeystoreError::NotADirectory(_)
        ));
        assert!(matches!(
            DiskKeystore::open(dir.path().join("missing")).unwrap_err(),
            KeystoreError::Io(_)
        ));
    }

    #[test]
    fn generate_writes_a_keyfile() {
        let dir = TempDir::new().unwrap();
        let store = DiskKeystore::open(dir.path()).unwrap();

        let address = store.generate("hunter2 hunter2").unwrap();
        assert!(address.starts_with("0x"));
        assert_eq!(address.len(), 42);
        assert!(dir.path().join(format!("{address}.json")).is_file());
    }

    #[test]
    fn unlock_round_trips_the_secret() {
        let dir = TempDir::new().unwrap();
        let store = DiskKeystore::open(dir.path()).unwrap();

        let address = store.generate("hunter2 hunter2").unwrap();
        let key = store.unlock(&address, "hunter2 hunter2").unwrap();
        assert_eq!(derive_address(&key), address);
    }

    #[test]
    fn unlock_with_wrong_passphrase_fails() {
        let dir = TempDir::new().unwrap();
        let store = DiskKeystore::open(dir.path()).unwrap();

        let address = store.generate("hunter2 hunter2").unwrap();
        assert!(matches!(
            store.unlock(&address, "wrong").unwrap_err(),
            KeystoreError::Decrypt
        ));
        assert!(matches!(
            store.unlock("0xnope", "hunter2 hunter2").unwrap_err(),
            KeystoreError::UnknownAddress(_)
        ));
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let data = b"thirty-two bytes of key material";
        let encrypted = encrypt(data, "pass", b"salty-salt-salty").unwrap();
        let decrypted = decrypt(&encrypted, "pass", b"salty-salt-salty").unwrap();
        assert_eq!(data.as_slice(), decrypted.as_slice());
    }
}
