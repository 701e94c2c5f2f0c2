// Callbacks the session flow invokes with framework-owned objects.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::db::models::User;
use crate::error::Result;
use crate::session::AuthSession;

/// Invoked after a session has been established for `user`; returns the
/// session that is handed back to the caller.
///
/// An error aborts the session fetch.
#[async_trait]
pub trait SessionCallback: Send + Sync + fmt::Debug {
    async fn session(&self, session: AuthSession, user: &User) -> Result<AuthSession>;
}

/// Registered callbacks.
#[derive(Clone, Default)]
pub struct Callbacks {
    pub session: Option<Arc<dyn SessionCallback>>,
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("session", &self.session.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl Callbacks {
    /// Layer `overlay` over `self`: a hook set on the overlay replaces ours.
    pub fn merge(&self, overlay: &Callbacks) -> Callbacks {
        Callbacks {
            session: overlay.session.clone().or_else(|| self.session.clone()),
        }
    }

    /// Run the session callback, or return the session unchanged.
    pub async fn run_session(&self, session: AuthSession, user: &User) -> Result<AuthSession> {
        match &self.session {
            Some(callback) => callback.session(session, user).await,
            None => Ok(session),
        }
    }
}
