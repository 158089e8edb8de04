//! Session context: who is shopping, read from an external token store.
//!
//! The engine never writes the store. Login and registration live
//! elsewhere and persist `token`, `username` and `balance` keys; this module
//! only reads them. A missing `token` key is the normal "not logged in"
//! state, not an error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Store key holding the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Store key holding the display name of the logged-in user.
pub const USERNAME_KEY: &str = "username";
/// Store key holding the wallet balance of the logged-in user.
pub const BALANCE_KEY: &str = "balance";

/// Errors reading a token store.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// The store file exists but could not be read.
    #[error("Failed to read token store {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The store file is not a JSON object.
    #[error("Malformed token store {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Opaque bearer token issued by the backend on login.
///
/// Never parsed. `Debug` output is redacted.
#[derive(Clone)]
pub struct AuthToken(SecretString);

impl AuthToken {
    /// Wrap a raw token value.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for building the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

/// Read-only key-value persistence holding session data.
pub trait TokenStore {
    /// Look up `key`; `None` when absent.
    fn get(&self, key: &str) -> Option<String>;
}

/// In-memory token store.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    values: HashMap<String, String>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding only a token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.insert(TOKEN_KEY, token);
        store
    }

    /// Set `key` to `value`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Token store backed by a JSON object file.
///
/// ```json
/// {"token": "eyJhbGciOi...", "username": "crio.do", "balance": 5000}
/// ```
///
/// The file is read once at construction; non-string values are kept in
/// their JSON text form. A missing file is an empty store.
#[derive(Debug, Clone, Default)]
pub struct FileTokenStore {
    values: HashMap<String, String>,
}

impl FileTokenStore {
    /// Load the store from `path`.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or is not a JSON
    /// object.
    pub fn load(path: &Path) -> Result<Self, TokenStoreError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Token store not found, treating as empty");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(TokenStoreError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&contents)
            .map_err(|source| TokenStoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let values = raw
            .into_iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some((key, s)),
                other => Some((key, other.to_string())),
            })
            .collect();

        Ok(Self { values })
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Explicit session state handed to the components that need it.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Bearer token; `None` means not logged in.
    pub token: Option<AuthToken>,
    /// Display name of the logged-in user.
    pub username: Option<String>,
    /// Wallet balance of the logged-in user.
    pub balance: Option<u64>,
}

impl SessionContext {
    /// A session with no logged-in user.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A session holding only a token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(AuthToken::new(token)),
            ..Self::default()
        }
    }

    /// Read the session from a token store.
    ///
    /// Empty token values count as absent. An unparsable balance is ignored.
    pub fn from_store(store: &impl TokenStore) -> Self {
        let token = store
            .get(TOKEN_KEY)
            .filter(|t| !t.trim().is_empty())
            .map(AuthToken::new);
        let username = store.get(USERNAME_KEY).filter(|u| !u.is_empty());
        let balance = store
            .get(BALANCE_KEY)
            .and_then(|b| b.trim().parse::<u64>().ok());

        Self {
            token,
            username,
            balance,
        }
    }

    /// Whether a user is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}
