//! Durable token storage.
//!
//! Persists the serialization allow-list — `{access_token, refresh_token}`
//! and nothing else — under a namespaced key per session domain. The staff
//! and portal domains use distinct namespaces and never see each other's
//! state. Profile data and in-progress MFA state are never written here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::types::TokenPair;

/// Namespace for the staff session domain.
pub const STAFF_NAMESPACE: &str = "staff";

/// Namespace for the client-portal session domain.
pub const PORTAL_NAMESPACE: &str = "portal";

/// The durable subset of a session.
///
/// This type *is* the allow-list: adding a field here widens what survives
/// a reload, so it deliberately mirrors [`TokenPair`] and nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTokens {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<&TokenPair> for StoredTokens {
    fn from(pair: &TokenPair) -> Self {
        Self {
            access_token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
        }
    }
}

impl From<StoredTokens> for TokenPair {
    fn from(stored: StoredTokens) -> Self {
        Self {
            access_token: stored.access_token,
            refresh_token: stored.refresh_token,
        }
    }
}

/// Trait for durable token storage backends.
///
/// The session store calls these at exactly one point each: `save` on every
/// token swap, `load` at bootstrap, `clear` on logout. Last-writer-wins;
/// no cross-process coordination is attempted.
pub trait TokenStorage: Send + Sync + std::fmt::Debug {
    /// Load the stored pair for a namespace, if any.
    fn load(&self, namespace: &str) -> Result<Option<StoredTokens>>;

    /// Overwrite the stored pair for a namespace.
    fn save(&self, namespace: &str, tokens: &StoredTokens) -> Result<()>;

    /// Remove any stored pair for a namespace.
    fn clear(&self, namespace: &str) -> Result<()>;
}

// ============================================================================
// FileTokenStorage
// ============================================================================

/// File-based token storage for production use.
///
/// One JSON file per namespace under the data directory.
#[derive(Debug)]
pub struct FileTokenStorage {
    dir: PathBuf,
}

impl FileTokenStorage {
    /// Create storage rooted at the given data directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create storage under the platform data directory (`<data>/docket`).
    pub fn default_location() -> Result<Self> {
        let base = dirs::data_dir()
            .ok_or_else(|| AuthError::Storage("No platform data directory".to_string()))?;
        Ok(Self::new(base.join("docket")))
    }

    fn token_path(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{namespace}-tokens.json"))
    }

    /// Directory holding the token files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self, namespace: &str) -> Result<Option<StoredTokens>> {
        let path = self.token_path(namespace);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| AuthError::Storage(format!("Failed to read token file: {}", e)))?;

        let tokens: StoredTokens = serde_json::from_str(&content)
            .map_err(|e| AuthError::Serialization(format!("Failed to parse token file: {}", e)))?;

        Ok(Some(tokens))
    }

    fn save(&self, namespace: &str, tokens: &StoredTokens) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| AuthError::Storage(format!("Failed to create token directory: {}", e)))?;

        let json = serde_json::to_string_pretty(tokens)
            .map_err(|e| AuthError::Serialization(format!("Failed to serialize tokens: {}", e)))?;

        let path = self.token_path(namespace);
        std::fs::write(&path, json)
            .map_err(|e| AuthError::Storage(format!("Failed to write token file: {}", e)))?;

        tracing::debug!(namespace, "Tokens saved to {}", path.display());
        Ok(())
    }

    fn clear(&self, namespace: &str) -> Result<()> {
        let path = self.token_path(namespace);
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| AuthError::Storage(format!("Failed to delete token file: {}", e)))?;
        }
        Ok(())
    }
}

// ============================================================================
// MemoryTokenStorage (for testing)
// ============================================================================

/// In-memory token storage for tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    slots: Mutex<HashMap<String, StoredTokens>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self, namespace: &str) -> Result<Option<StoredTokens>> {
        Ok(self.slots.lock().get(namespace).cloned())
    }

    fn save(&self, namespace: &str, tokens: &StoredTokens) -> Result<()> {
        self.slots
            .lock()
            .insert(namespace.to_string(), tokens.clone());
        Ok(())
    }

    fn clear(&self, namespace: &str) -> Result<()> {
        self.slots.lock().remove(namespace);
        Ok(())
    }
}
