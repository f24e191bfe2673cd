//! Storage for the ads-platform bearer token.
//!
//! The OS keyring is preferred; when it is unavailable (or disabled with
//! `ADSCOPE_DISABLE_KEYRING=1`) the token is kept ChaCha20-Poly1305 encrypted under
//! `<app root>/secrets`.

use std::path::{Path, PathBuf};

use crate::app_dirs;

const KEYRING_SERVICE: &str = "adscope";
const KEYRING_KEY: &str = "adscope_platform_token";
const TOKEN_FILE: &str = "platform_token.bin";
const KEY_FILE: &str = "platform_token.key";
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    /// Keyring or randomness source could not be used.
    #[error("Token store unavailable: {0}")]
    Unavailable(String),
    /// Reading or writing the fallback files failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Encryption or decryption failed.
    #[error("Crypto error: {0}")]
    Crypto(String),
    /// Fallback files exist but are malformed.
    #[error("Decode error: {0}")]
    Decode(String),
    /// The application directory could not be prepared.
    #[error("App dir error: {0}")]
    AppDir(#[from] app_dirs::AppDirError),
}

#[derive(Clone, Debug)]
pub struct TokenStore {
    fallback_dir: PathBuf,
}

impl TokenStore {
    /// Open the store rooted in the application directory.
    pub fn new() -> Result<Self, TokenStoreError> {
        Self::with_fallback_dir(app_dirs::secrets_dir()?)
    }

    /// Open the store with an explicit fallback directory.
    pub fn with_fallback_dir(fallback_dir: PathBuf) -> Result<Self, TokenStoreError> {
        std::fs::create_dir_all(&fallback_dir)?;
        Ok(Self { fallback_dir })
    }

    pub fn get(&self) -> Result<Option<String>, TokenStoreError> {
        if let Some(token) = self.keyring_get() {
            return Ok(Some(token));
        }
        self.fallback_get()
    }

    /// Persist `token`; blank tokens are ignored.
    pub fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(());
        }
        if self.keyring_set(token).is_ok() {
            self.fallback_delete();
            return Ok(());
        }
        self.fallback_set(token)
    }

    pub fn delete(&self) {
        if !keyring_disabled()
            && let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, KEYRING_KEY)
        {
            let _ = entry.delete_credential();
        }
        self.fallback_delete();
    }

    fn keyring_get(&self) -> Option<String> {
        if keyring_disabled() {
            return None;
        }
        let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_KEY).ok()?;
        match entry.get_password() {
            Ok(token) => Some(token),
            Err(keyring::Error::NoEntry) => None,
            Err(err) => {
                tracing::debug!("Keyring read failed: {err}");
                None
            }
        }
    }

    fn keyring_set(&self, token: &str) -> Result<(), TokenStoreError> {
        if keyring_disabled() {
            return Err(TokenStoreError::Unavailable("keyring disabled".into()));
        }
        keyring::Entry::new(KEYRING_SERVICE, KEYRING_KEY)
            .and_then(|entry| entry.set_password(token))
            .map_err(|err| TokenStoreError::Unavailable(err.to_string()))
    }

    fn token_path(&self) -> PathBuf {
        self.fallback_dir.join(TOKEN_FILE)
    }

    fn key_path(&self) -> PathBuf {
        self.fallback_dir.join(KEY_FILE)
    }

    fn fallback_get(&self) -> Result<Option<String>, TokenStoreError> {
        let token_path = self.token_path();
        if !token_path.exists() {
            return Ok(None);
        }
        let data = std::fs::read(token_path)?;
        if data.len() < NONCE_LEN {
            return Err(TokenStoreError::Decode("token file too short".into()));
        }
        let key = std::fs::read(self.key_path())?;
        if key.len() != KEY_LEN {
            return Err(TokenStoreError::Decode("token key invalid".into()));
        }
        let (nonce, ciphertext) = data.split_at(NONCE_LEN);
        let plaintext = decrypt(&key, nonce, ciphertext)?;
        String::from_utf8(plaintext)
            .map(Some)
            .map_err(|err| TokenStoreError::Decode(err.to_string()))
    }

    fn fallback_set(&self, token: &str) -> Result<(), TokenStoreError> {
        let key_path = self.key_path();
        let key = if key_path.exists() {
            std::fs::read(&key_path)?
        } else {
            let key = random_bytes(KEY_LEN)?;
            write_private_file(&key_path, &key)?;
            key
        };
        if key.len() != KEY_LEN {
            return Err(TokenStoreError::Decode("token key invalid".into()));
        }
        let nonce = random_bytes(NONCE_LEN)?;
        let mut payload = nonce.clone();
        payload.extend_from_slice(&encrypt(&key, &nonce, token.as_bytes())?);
        write_private_file(&self.token_path(), &payload)
    }

    fn fallback_delete(&self) {
        let _ = std::fs::remove_file(self.token_path());
        let _ = std::fs::remove_file(self.key_path());
    }
}

fn keyring_disabled() -> bool {
    std::env::var("ADSCOPE_DISABLE_KEYRING")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn random_bytes(len: usize) -> Result<Vec<u8>, TokenStoreError> {
    use rand::TryRngCore;
    let mut out = vec![0u8; len];
    rand::rngs::OsRng
        .try_fill_bytes(&mut out)
        .map_err(|err| TokenStoreError::Unavailable(err.to_string()))?;
    Ok(out)
}

fn write_private_file(path: &Path, bytes: &[u8]) -> Result<(), TokenStoreError> {
    std::fs::write(path, bytes)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

fn encrypt(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, TokenStoreError> {
    use chacha20poly1305::aead::{Aead, KeyInit};
    let cipher = chacha20poly1305::ChaCha20Poly1305::new_from_slice(key)
        .map_err(|err| TokenStoreError::Crypto(err.to_string()))?;
    cipher
        .encrypt(chacha20poly1305::Nonce::from_slice(nonce), plaintext)
        .map_err(|err| TokenStoreError::Crypto(err.to_string()))
}

fn decrypt(key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, TokenStoreError> {
    use chacha20poly1305::aead::{Aead, KeyInit};
    let cipher = chacha20poly1305::ChaCha20Poly1305::new_from_slice(key)
        .map_err(|err| TokenStoreError::Crypto(err.to_string()))?;
    cipher
        .decrypt(chacha20poly1305::Nonce::from_slice(nonce), ciphertext)
        .map_err(|err| TokenStoreError::Crypto(err.to_string()))
}
