//! Session state and token lifecycle.
//!
//! [`SessionStore`] owns the current token pair and the authenticated-user
//! snapshot for one session domain. It is read by every in-flight request
//! and mutated by the login flow and the 401 refresh path, so all state
//! lives behind a single lock: readers observe either the old pair or the
//! new pair, never a mix.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::storage::{StoredTokens, TokenStorage};
use crate::types::{Profile, TokenPair};

#[derive(Debug, Clone, Default)]
struct SessionState {
    tokens: Option<TokenPair>,
    user: Option<Profile>,
}

/// A consistent read of the session, taken under one lock acquisition.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    pub user: Option<Profile>,
}

/// Session store for one session domain (staff or portal).
///
/// `is_authenticated` is derived from token presence, never stored: a
/// session with tokens and no user yet is valid (the profile is fetched
/// right after token issuance and re-fetched after every reload).
#[derive(Debug)]
pub struct SessionStore {
    namespace: String,
    state: RwLock<SessionState>,
    storage: Arc<dyn TokenStorage>,
}

impl SessionStore {
    /// Create an empty session store over the given storage backend.
    pub fn new(namespace: impl Into<String>, storage: Arc<dyn TokenStorage>) -> Self {
        Self {
            namespace: namespace.into(),
            state: RwLock::new(SessionState::default()),
            storage,
        }
    }

    /// Storage namespace for this session domain.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Seed the in-memory session from durable storage.
    ///
    /// Returns `true` when a stored pair was restored. The user profile is
    /// never persisted; the caller must re-fetch it before rendering
    /// protected content.
    pub fn bootstrap(&self) -> Result<bool> {
        let stored = self.storage.load(&self.namespace)?;
        match stored {
            Some(tokens) => {
                let mut state = self.state.write();
                state.tokens = Some(tokens.into());
                state.user = None;
                tracing::debug!(namespace = %self.namespace, "Session restored from storage");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Whether the session currently holds tokens.
    pub fn is_authenticated(&self) -> bool {
        self.state.read().tokens.is_some()
    }

    /// Current access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.state
            .read()
            .tokens
            .as_ref()
            .map(|t| t.access_token.clone())
    }

    /// Current refresh token, if any.
    pub fn refresh_token(&self) -> Option<String> {
        self.state
            .read()
            .tokens
            .as_ref()
            .map(|t| t.refresh_token.clone())
    }

    /// Current user profile, if fetched.
    pub fn user(&self) -> Option<Profile> {
        self.state.read().user.clone()
    }

    /// Consistent view of the session for UI code.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read();
        SessionSnapshot {
            is_authenticated: state.tokens.is_some(),
            user: state.user.clone(),
        }
    }

    /// Atomically replace the token pair and persist the durable subset.
    ///
    /// The write lock is held across the storage save so the in-memory and
    /// durable states cannot interleave with a concurrent swap.
    pub fn set_tokens(&self, pair: TokenPair) -> Result<()> {
        let stored = StoredTokens::from(&pair);
        let mut state = self.state.write();
        state.tokens = Some(pair);
        self.storage.save(&self.namespace, &stored)?;
        tracing::debug!(namespace = %self.namespace, "Token pair updated");
        Ok(())
    }

    /// Record the fetched user profile. Independent of token state.
    pub fn set_user(&self, profile: Profile) {
        self.state.write().user = Some(profile);
    }

    /// Reset every field and clear durable storage.
    ///
    /// Idempotent and callable from any state; concurrent readers see the
    /// session either fully populated or fully empty.
    pub fn logout(&self) -> Result<()> {
        {
            let mut state = self.state.write();
            *state = SessionState::default();
            self.storage.clear(&self.namespace)?;
        }
        tracing::debug!(namespace = %self.namespace, "Session cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryTokenStorage, STAFF_NAMESPACE};

    fn store() -> SessionStore {
        SessionStore::new(STAFF_NAMESPACE, Arc::new(MemoryTokenStorage::new()))
    }

    fn profile() -> Profile {
        Profile {
            id: "u-1".to_string(),
            email: "partner@firm.test".to_string(),
            display_name: "Pat Partner".to_string(),
            role: "attorney".to_string(),
        }
    }

    #[test]
    fn test_starts_empty() {
        let store = store();
        assert!(!store.is_authenticated());
        assert!(store.access_token().is_none());
        assert!(store.user().is_none());
    }

    #[test]
    fn test_set_tokens_marks_authenticated() {
        let store = store();
        store.set_tokens(TokenPair::new("a1", "r1")).unwrap();

        assert!(store.is_authenticated());
        assert_eq!(store.access_token().as_deref(), Some("a1"));
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));
        // Valid session with no user yet.
        assert!(store.user().is_none());
    }

    #[test]
    fn test_logout_is_total_and_idempotent() {
        let store = store();
        store.set_tokens(TokenPair::new("a1", "r1")).unwrap();
        store.set_user(profile());

        store.logout().unwrap();
        store.logout().unwrap();

        let snapshot = store.snapshot();
        assert!(!snapshot.is_authenticated);
        assert!(snapshot.user.is_none());
        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());
    }

    #[test]
    fn test_logout_from_empty_state() {
        let store = store();
        store.logout().unwrap();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_bootstrap_restores_tokens_but_not_user() {
        let storage = Arc::new(MemoryTokenStorage::new());

        let first = SessionStore::new(STAFF_NAMESPACE, storage.clone());
        first.set_tokens(TokenPair::new("a1", "r1")).unwrap();
        first.set_user(profile());

        let second = SessionStore::new(STAFF_NAMESPACE, storage);
        assert!(second.bootstrap().unwrap());
        assert!(second.is_authenticated());
        assert_eq!(second.access_token().as_deref(), Some("a1"));
        // The profile must be re-derived, never restored.
        assert!(second.user().is_none());
    }

    #[test]
    fn test_bootstrap_with_no_stored_session() {
        let store = store();
        assert!(!store.bootstrap().unwrap());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_logout_clears_durable_storage() {
        let storage = Arc::new(MemoryTokenStorage::new());

        let first = SessionStore::new(STAFF_NAMESPACE, storage.clone());
        first.set_tokens(TokenPair::new("a1", "r1")).unwrap();
        first.logout().unwrap();

        let second = SessionStore::new(STAFF_NAMESPACE, storage);
        assert!(!second.bootstrap().unwrap());
    }

    #[test]
    fn test_token_swap_is_never_observed_mixed() {
        let store = Arc::new(store());
        store.set_tokens(TokenPair::new("a-old", "r-old")).unwrap();

        let reader = {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    let state = store.state.read();
                    if let Some(pair) = state.tokens.as_ref() {
                        let generation = pair.access_token.split('-').nth(1).unwrap();
                        assert!(pair.refresh_token.ends_with(generation));
                    }
                }
            })
        };

        for i in 0..100 {
            store
                .set_tokens(TokenPair::new(format!("a-{i}"), format!("r-{i}")))
                .unwrap();
        }
        reader.join().unwrap();
    }
}
