//! Server-side session store.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use super::Principal;

/// Opaque session tokens mapped to principals.
///
/// Sessions live until logout or process exit.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Principal>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session, returning its token.
    pub fn issue(&self, principal: Principal) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.lock().insert(token.clone(), principal);
        token
    }

    pub fn lookup(&self, token: &str) -> Option<Principal> {
        self.lock().get(token).copied()
    }

    /// End a session. Returns false if the token was not live.
    pub fn revoke(&self, token: &str) -> bool {
        self.lock().remove(token).is_some()
    }

    /// Drop every session held by a user.
    pub fn revoke_user(&self, user_id: i64) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, p| p.user_id != user_id);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Principal>> {
        // A poisoned map still holds valid entries.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
