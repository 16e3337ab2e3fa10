use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::info;

use crate::id::new_uuid_v4;
use crate::routes::Route;

/// The signed-in user as resolved from a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserIdentity {
    pub user_id: String,
    pub email: String,
}

trait SessionStore: Send + Sync {
    fn get(&self, token: &str) -> Option<UserIdentity>;
    fn put(&self, token: &str, identity: UserIdentity);
    fn remove(&self, token: &str) -> bool;
}

#[derive(Default)]
struct MemorySessions {
    data: Mutex<HashMap<String, UserIdentity>>,
}

impl SessionStore for MemorySessions {
    fn get(&self, token: &str) -> Option<UserIdentity> {
        self.data
            .lock()
            .map(|map| map.get(token).cloned())
            .unwrap_or_default()
    }

    fn put(&self, token: &str, identity: UserIdentity) {
        if let Ok(mut map) = self.data.lock() {
            map.insert(token.to_string(), identity);
        }
    }

    fn remove(&self, token: &str) -> bool {
        self.data
            .lock()
            .map(|mut map| map.remove(token).is_some())
            .unwrap_or(false)
    }
}

/// Cloneable handle over the session store. Authentication itself lives
/// outside this crate; tokens are issued here once a user is verified.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<dyn SessionStore + Send + Sync>,
}

impl SessionHandle {
    pub fn in_memory() -> Self {
        SessionHandle {
            inner: Arc::new(MemorySessions::default()),
        }
    }

    /// Mint an opaque token for a verified user and register it.
    pub fn issue(&self, user_id: &str, email: &str) -> String {
        let token = new_uuid_v4();
        self.inner.put(
            &token,
            UserIdentity {
                user_id: user_id.to_string(),
                email: email.to_string(),
            },
        );
        token
    }

    pub fn current_user(&self, token: &str) -> Option<UserIdentity> {
        self.inner.get(token)
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.inner.remove(token)
    }
}

/// Resolve the token or bounce to the login screen. An absent or revoked
/// session is a redirect, not an error.
pub fn require_user(sessions: &SessionHandle, token: &str) -> Result<UserIdentity, Route> {
    sessions.current_user(token).ok_or(Route::Login)
}

/// Drop the session and send the user to the login screen. Revoking an
/// already-dead token still lands on login.
pub fn sign_out(sessions: &SessionHandle, token: &str) -> Route {
    let revoked = sessions.revoke(token);
    info!(target: "ladle", event = "session_signed_out", revoked);
    Route::Login
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_resolve() {
        let sessions = SessionHandle::in_memory();
        let token = sessions.issue("u-1", "cook@example.com");
        let user = sessions.current_user(&token).expect("session resolves");
        assert_eq!(user.user_id, "u-1");
        assert_eq!(user.email, "cook@example.com");
    }

    #[test]
    fn unknown_token_resolves_to_none() {
        let sessions = SessionHandle::in_memory();
        assert!(sessions.current_user("nope").is_none());
    }

    #[test]
    fn revoke_is_idempotent() {
        let sessions = SessionHandle::in_memory();
        let token = sessions.issue("u-1", "cook@example.com");
        assert!(sessions.revoke(&token));
        assert!(!sessions.revoke(&token));
        assert!(sessions.current_user(&token).is_none());
    }
}
