//! Authentication collaborator
//!
//! The SDK never manages sessions itself; it only asks who is signed in.

use std::sync::RwLock;

/// Source of the signed-in user's id.
pub trait Authenticator: Send + Sync {
    /// Current user id, `None` when signed out
    fn current_user_id(&self) -> Option<String>;
}

/// Session holder that the embedding app signs in and out.
#[derive(Debug, Default)]
pub struct SessionAuthenticator {
    user_id: RwLock<Option<String>>,
}

impl SessionAuthenticator {
    /// Start signed out
    pub fn new() -> Self {
        Self::default()
    }

    /// Start signed in as `user_id`
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: RwLock::new(Some(user_id.into())),
        }
    }

    pub fn sign_in(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        tracing::debug!(%user_id, "signed in");
        *self.user_id.write().unwrap_or_else(|e| e.into_inner()) = Some(user_id);
    }

    pub fn sign_out(&self) {
        tracing::debug!("signed out");
        *self.user_id.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl Authenticator for SessionAuthenticator {
    fn current_user_id(&self) -> Option<String> {
        self.user_id
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
