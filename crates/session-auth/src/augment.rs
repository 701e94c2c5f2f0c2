// Session augmenter — stamps the user id and the latest session token onto
// the session handed back by the session flow.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use session_auth_core::db::adapter::{SortBy, WhereClause};
use session_auth_core::db::models::SESSION_MODEL;
use session_auth_core::error::{AuthError, Result};
use session_auth_core::{Adapter, AuthSession, SessionCallback, SessionRecord, User};

/// Session callback that exposes the user's id and the token of their most
/// recently expiring session as `accessToken`.
///
/// A user with no session record is an error; no fallback token is issued.
#[derive(Debug, Clone)]
pub struct LatestSessionToken {
    adapter: Arc<dyn Adapter>,
}

impl LatestSessionToken {
    pub fn new(adapter: Arc<dyn Adapter>) -> Self {
        Self { adapter }
    }
}

#[async_trait]
impl SessionCallback for LatestSessionToken {
    async fn session(&self, mut session: AuthSession, user: &User) -> Result<AuthSession> {
        if let Some(session_user) = session.user.as_mut() {
            session_user.id = Some(user.id.clone());
        }

        let row = self
            .adapter
            .find_first_or_throw(
                SESSION_MODEL,
                &[WhereClause::eq("userId", user.id.as_str())],
                Some(SortBy::desc("expires")),
            )
            .await?;
        let record: SessionRecord = serde_json::from_value(row).map_err(|e| {
            AuthError::Database(format!("malformed session record for user {}: {e}", user.id))
        })?;

        debug!(user_id = %user.id, session_id = %record.id, "attached latest session token");
        session.access_token = Some(record.session_token);
        Ok(session)
    }
}
