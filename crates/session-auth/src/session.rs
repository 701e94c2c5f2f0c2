// Server-side session fetch.
//
// Reads the session token off the request, loads the session and its user
// through the adapter, extends the session on a sliding window and runs the
// session callback over the result.

use chrono::Utc;
use http::HeaderMap;
use serde_json::json;
use tracing::{debug, error};

use session_auth_core::db::adapter::WhereClause;
use session_auth_core::db::models::{SESSION_MODEL, USER_MODEL};
use session_auth_core::error::{AuthError, Result};
use session_auth_core::options::SessionStrategy;
use session_auth_core::{AuthOptions, AuthSession, SessionRecord, User};

use crate::cookies::{append_set_cookie, extract_session_token, CookieAttributes};

/// Fetch the session for the request carrying `headers`.
///
/// Returns `Ok(None)` when there is no token, or when the token does not
/// map to a live session and user. Cookie updates (refresh or removal) are
/// appended to `res`. Errors from the session callback propagate.
pub async fn get_server_session(
    options: &AuthOptions,
    headers: &HeaderMap,
    res: &mut HeaderMap,
) -> Result<Option<AuthSession>> {
    if options.settings.session.strategy == SessionStrategy::Jwt {
        return Err(AuthError::Config(
            "server session fetch requires the database session strategy".into(),
        ));
    }

    let cookie_name = options.session_cookie_name();
    let secure = options.settings.use_secure_cookies;
    let Some(token) = extract_session_token(headers, &cookie_name) else {
        return Ok(None);
    };

    let adapter = &options.adapter;
    let by_token = [WhereClause::eq("sessionToken", token.as_str())];

    let Some(row) = adapter.find_one(SESSION_MODEL, &by_token).await? else {
        debug!("no session for token");
        append_set_cookie(res, &cookie_name, &CookieAttributes::expired(secure));
        return Ok(None);
    };
    let mut record: SessionRecord = serde_json::from_value(row)
        .map_err(|e| AuthError::Database(format!("malformed session record: {e}")))?;

    let now = Utc::now();
    if record.is_expired(now) {
        debug!(session_id = %record.id, "session expired");
        adapter.delete(SESSION_MODEL, &by_token).await?;
        append_set_cookie(res, &cookie_name, &CookieAttributes::expired(secure));
        return Ok(None);
    }

    let Some(user_row) = adapter
        .find_one(USER_MODEL, &[WhereClause::eq("id", record.user_id.as_str())])
        .await?
    else {
        debug!(user_id = %record.user_id, "session user missing");
        return Ok(None);
    };
    let user: User = serde_json::from_value(user_row)
        .map_err(|e| AuthError::Database(format!("malformed user record: {e}")))?;

    // Sliding window: extend once `update_age` has elapsed since the last extension.
    let ages = &options.settings.session;
    let (Some(max_age), Some(update_age)) = (ages.max_age_delta(), ages.update_age_delta()) else {
        return Err(AuthError::Config("session.maxAge or session.updateAge out of range".into()));
    };
    let due = record
        .expires
        .checked_sub_signed(max_age)
        .and_then(|t| t.checked_add_signed(update_age));
    let (Some(due), Some(extended)) = (due, now.checked_add_signed(max_age)) else {
        return Err(AuthError::Config(format!(
            "session lifetime of {}s overflows the supported date range",
            ages.max_age
        )));
    };
    if due <= now {
        adapter
            .update(SESSION_MODEL, &by_token, json!({ "expires": extended.to_rfc3339() }))
            .await?;
        record.expires = extended;
        append_set_cookie(
            res,
            &cookie_name,
            &CookieAttributes::session(token.as_str(), max_age.num_seconds(), secure),
        );
        debug!(session_id = %record.id, "session extended");
    }

    let session = AuthSession::for_user(&user, record.expires);
    match options.callbacks.run_session(session, &user).await {
        Ok(session) => Ok(Some(session)),
        Err(e) => {
            error!(user_id = %user.id, error = %e, "session callback failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Duration;
    use http::header::{COOKIE, SET_COOKIE};
    use http::HeaderValue;

    use session_auth_core::{Adapter, OptionsLayer, SessionCallback};
    use session_auth_memory::MemoryAdapter;

    use super::*;
    use crate::augment::LatestSessionToken;

    async fn seed(memory: &MemoryAdapter, token: &str, expires: chrono::DateTime<Utc>) {
        memory
            .create(USER_MODEL, json!({"id": "u1", "name": "Ada", "email": "ada@example.com"}))
            .await
            .unwrap();
        memory
            .create(
                SESSION_MODEL,
                json!({"sessionToken": token, "userId": "u1", "expires": expires.to_rfc3339()}),
            )
            .await
            .unwrap();
    }

    fn options(memory: &MemoryAdapter, layer: OptionsLayer) -> AuthOptions {
        let adapter: Arc<dyn Adapter> = Arc::new(memory.clone());
        let callback = Arc::new(LatestSessionToken::new(adapter.clone()));
        AuthOptions::from_layer(layer.session_callback(callback), adapter).unwrap()
    }

    /// An expiry that is not yet due for refresh.
    fn fresh() -> chrono::DateTime<Utc> {
        Utc::now() + Duration::days(29) + Duration::hours(12)
    }

    fn cookie(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static(value));
        headers
    }

    #[tokio::test]
    async fn test_no_token() {
        let memory = MemoryAdapter::new();
        let mut res = HeaderMap::new();
        let session = get_server_session(&options(&memory, OptionsLayer::new()), &HeaderMap::new(), &mut res)
            .await
            .unwrap();
        assert!(session.is_none());
        assert!(res.is_empty());
    }

    #[tokio::test]
    async fn test_valid_session_is_augmented() {
        let memory = MemoryAdapter::new();
        let expires = fresh();
        seed(&memory, "tok-1", expires).await;

        let mut res = HeaderMap::new();
        let session = get_server_session(
            &options(&memory, OptionsLayer::new()),
            &cookie("next-auth.session-token=tok-1"),
            &mut res,
        )
        .await
        .unwrap()
        .unwrap();

        let user = session.user.unwrap();
        assert_eq!(user.id.as_deref(), Some("u1"));
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
        assert_eq!(session.access_token.as_deref(), Some("tok-1"));
        // not yet due for refresh
        assert!(res.get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_unknown_token_clears_cookie() {
        let memory = MemoryAdapter::new();
        let mut res = HeaderMap::new();
        let session = get_server_session(
            &options(&memory, OptionsLayer::new()),
            &cookie("next-auth.session-token=missing"),
            &mut res,
        )
        .await
        .unwrap();

        assert!(session.is_none());
        let set_cookie = res.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.starts_with("next-auth.session-token=; Max-Age=0"));
    }

    #[tokio::test]
    async fn test_expired_session_is_deleted() {
        let memory = MemoryAdapter::new();
        seed(&memory, "old", Utc::now() - Duration::minutes(1)).await;

        let mut res = HeaderMap::new();
        let session = get_server_session(
            &options(&memory, OptionsLayer::new()),
            &cookie("next-auth.session-token=old"),
            &mut res,
        )
        .await
        .unwrap();

        assert!(session.is_none());
        assert_eq!(memory.model_count(SESSION_MODEL).await, 0);
        assert!(res.get(SET_COOKIE).is_some());
    }

    #[tokio::test]
    async fn test_sliding_window_refresh() {
        let memory = MemoryAdapter::new();
        // two days left of a 30 day session: past the one day update age
        let expires = Utc::now() + Duration::days(2);
        seed(&memory, "tok", expires).await;

        let mut res = HeaderMap::new();
        let session = get_server_session(
            &options(&memory, OptionsLayer::new().set("useSecureCookies", true)),
            &cookie("__Secure-next-auth.session-token=tok"),
            &mut res,
        )
        .await
        .unwrap()
        .unwrap();

        assert!(session.expires > expires + Duration::days(20));
        let set_cookie = res.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.starts_with("__Secure-next-auth.session-token=tok; Max-Age=2592000"));
        assert!(set_cookie.contains("Secure"));

        let stored = memory
            .find_one(SESSION_MODEL, &[WhereClause::eq("sessionToken", "tok")])
            .await
            .unwrap()
            .unwrap();
        let stored: SessionRecord = serde_json::from_value(stored).unwrap();
        assert_eq!(stored.expires.timestamp(), session.expires.timestamp());
    }

    #[tokio::test]
    async fn test_huge_max_age_is_config_error() {
        let memory = MemoryAdapter::new();
        seed(&memory, "tok", Utc::now() + Duration::days(2)).await;

        // bypasses the check in `from_layer`
        let mut options = options(&memory, OptionsLayer::new());
        options.settings.session.max_age = 10_000_000_000_000;

        let mut res = HeaderMap::new();
        let err = get_server_session(&options, &cookie("next-auth.session-token=tok"), &mut res)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
        assert!(res.is_empty());

        options.settings.session.max_age = u64::MAX;
        let err = get_server_session(&options, &cookie("next-auth.session-token=tok"), &mut res)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_user_yields_none() {
        let memory = MemoryAdapter::new();
        memory
            .create(
                SESSION_MODEL,
                json!({
                    "sessionToken": "orphan",
                    "userId": "ghost",
                    "expires": fresh().to_rfc3339(),
                }),
            )
            .await
            .unwrap();

        let mut res = HeaderMap::new();
        let session = get_server_session(
            &options(&memory, OptionsLayer::new()),
            &cookie("next-auth.session-token=orphan"),
            &mut res,
        )
        .await
        .unwrap();
        assert!(session.is_none());
    }

    #[derive(Debug)]
    struct Reject;

    #[async_trait]
    impl SessionCallback for Reject {
        async fn session(&self, _session: AuthSession, _user: &User) -> Result<AuthSession> {
            Err(AuthError::Callback("rejected".into()))
        }
    }

    #[tokio::test]
    async fn test_callback_error_propagates() {
        let memory = MemoryAdapter::new();
        seed(&memory, "tok", fresh()).await;

        let adapter: Arc<dyn Adapter> = Arc::new(memory.clone());
        let options = AuthOptions::from_layer(OptionsLayer::new().session_callback(Arc::new(Reject)), adapter).unwrap();

        let mut res = HeaderMap::new();
        let err = get_server_session(&options, &cookie("next-auth.session-token=tok"), &mut res)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Callback(_)));
    }

    #[tokio::test]
    async fn test_jwt_strategy_is_config_error() {
        let memory = MemoryAdapter::new();
        let mut res = HeaderMap::new();
        let err = get_server_session(
            &options(&memory, OptionsLayer::new().set("session.strategy", "jwt")),
            &HeaderMap::new(),
            &mut res,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
    }
}
