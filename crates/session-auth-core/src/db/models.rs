// Persisted models, using the field names of the Prisma auth schema
// (`user`, `session`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Model name of the user table.
pub const USER_MODEL: &str = "user";
/// Model name of the session table.
pub const SESSION_MODEL: &str = "session";

/// User record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
            email_verified: None,
            image: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into().to_lowercase());
        self
    }
}

/// Session record: one row per issued session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    /// Opaque token; also handed out as the session's access token.
    pub session_token: String,
    pub user_id: String,
    pub expires: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    #[test]
    fn test_session_record_camel_case() {
        let expires = DateTime::parse_from_rfc3339("2030-01-01T00:00:00Z").unwrap().to_utc();
        let record = SessionRecord {
            id: "s1".into(),
            session_token: "tok".into(),
            user_id: "u1".into(),
            expires,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["sessionToken"], "tok");
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["expires"], "2030-01-01T00:00:00Z");
    }

    #[test]
    fn test_user_optional_fields() {
        let user: User = serde_json::from_value(serde_json::json!({"id": "u1"})).unwrap();
        assert_eq!(user, User::new("u1"));

        let user = User::new("u2").with_email("Alice@Example.com");
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        let record = SessionRecord {
            id: "s1".into(),
            session_token: "tok".into(),
            user_id: "u1".into(),
            expires: now - TimeDelta::seconds(1),
        };
        assert!(record.is_expired(now));
        assert!(!record.is_expired(now - TimeDelta::seconds(5)));
    }
}
