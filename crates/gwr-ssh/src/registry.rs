//! Session registry
//!
//! Maps opaque identifiers to live sessions. The registry is a plain
//! object owned by the boundary layer, never a process-wide singleton,
//! and does no automatic expiry: reaping leaked sessions is the owner's
//! job. Only structural mutation (insert/remove) is guarded; entries are
//! single-caller by contract.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::session::RemoteSession;

pub type SessionHandle = Arc<AsyncMutex<RemoteSession>>;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `id`, creating a disconnected one on first
    /// use. Exactly one session exists per identifier at a time.
    pub fn get_or_create(&self, id: &str) -> SessionHandle {
        let mut sessions = self.sessions.lock();
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(id, "session created");
                Arc::new(AsyncMutex::new(RemoteSession::new(id)))
            })
            .clone()
    }

    /// Drop the registry's handle for `id`, returning it so the owner can
    /// disconnect it cleanly.
    pub fn remove(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.lock().remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_session_per_identifier() {
        let registry = SessionRegistry::new();
        let a = registry.get_or_create("browser-1");
        let b = registry.get_or_create("browser-1");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_releases_entry() {
        let registry = SessionRegistry::new();
        registry.get_or_create("x");
        assert!(registry.remove("x").is_some());
        assert!(registry.remove("x").is_none());
        assert!(registry.is_empty());

        // A fresh identifier gets a fresh session
        let c = registry.get_or_create("x");
        assert_eq!(registry.len(), 1);
        drop(c);
    }
}
