// The session object returned to callers of the session fetch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::User;

/// Public view of the signed-in user carried inside a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Authenticated-user context handed to session callbacks and returned to
/// route handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
    pub expires: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Extra fields added by callbacks.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AuthSession {
    /// Default session shape: the user's public profile, without id or token.
    pub fn for_user(user: &User, expires: DateTime<Utc>) -> Self {
        Self {
            user: Some(SessionUser {
                id: None,
                name: user.name.clone(),
                email: user.email.clone(),
                image: user.image.clone(),
            }),
            expires,
            access_token: None,
            extra: serde_json::Map::new(),
        }
    }

    /// A session with no user sub-object.
    pub fn anonymous(expires: DateTime<Utc>) -> Self {
        Self {
            user: None,
            expires,
            access_token: None,
            extra: serde_json::Map::new(),
        }
    }
}
