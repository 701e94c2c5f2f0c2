// Auth options — the layered configuration and its resolved, typed form.
//
// Options are built as `OptionsLayer`s (a JSON settings tree plus callbacks)
// and deep-merged; the merged tree is then deserialized into `AuthSettings`.
// Keeping layers untyped lets a variant override a single nested key without
// restating its siblings.

use std::fmt;
use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::callbacks::{Callbacks, SessionCallback};
use crate::db::adapter::Adapter;
use crate::error::{AuthError, Result};
use crate::merge::{deep_merge, set_path};

/// Default cookie name for the session token.
pub const SESSION_TOKEN_COOKIE: &str = "next-auth.session-token";

// ─── Options Layer ──────────────────────────────────────────────

/// One layer of options: the shared base, or a per-stage variant.
#[derive(Clone)]
pub struct OptionsLayer {
    settings: Value,
    callbacks: Callbacks,
}

impl Default for OptionsLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OptionsLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsLayer")
            .field("settings", &redact_secret(&self.settings))
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

impl OptionsLayer {
    /// An empty layer.
    pub fn new() -> Self {
        Self {
            settings: Value::Object(serde_json::Map::new()),
            callbacks: Callbacks::default(),
        }
    }

    /// A layer from a JSON settings object.
    pub fn from_settings(settings: Value) -> Result<Self> {
        if !settings.is_object() {
            warn!(settings = %settings, "rejected non-object options layer");
            return Err(AuthError::Config(format!(
                "options layer must be a JSON object, got {settings}"
            )));
        }
        Ok(Self {
            settings,
            callbacks: Callbacks::default(),
        })
    }

    /// Set a setting at a dotted path, e.g. `"session.maxAge"`.
    pub fn set(mut self, path: &str, value: impl Into<Value>) -> Self {
        set_path(&mut self.settings, path, value.into());
        self
    }

    /// Append a provider to this layer's provider list.
    pub fn provider(mut self, provider: ProviderOptions) -> Self {
        let id = provider.id.clone();
        let provider = match serde_json::to_value(provider) {
            Ok(provider) => provider,
            Err(e) => {
                warn!(provider = %id, error = %e, "provider dropped: not serializable");
                return self;
            }
        };
        match self.settings.get_mut("providers") {
            Some(Value::Array(list)) => list.push(provider),
            _ => set_path(&mut self.settings, "providers", Value::Array(vec![provider])),
        }
        self
    }

    /// Register the session callback.
    pub fn session_callback(mut self, callback: Arc<dyn SessionCallback>) -> Self {
        self.callbacks.session = Some(callback);
        self
    }

    pub fn settings(&self) -> &Value {
        &self.settings
    }

    pub fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }

    /// Layer `overlay` over `self`. Neither input is modified.
    pub fn merge(&self, overlay: &OptionsLayer) -> OptionsLayer {
        OptionsLayer {
            settings: deep_merge(&self.settings, &overlay.settings),
            callbacks: self.callbacks.merge(&overlay.callbacks),
        }
    }
}

fn redact_secret(settings: &Value) -> Value {
    let mut shown = settings.clone();
    if let Some(secret) = shown.get_mut("secret") {
        *secret = Value::String("[REDACTED]".into());
    }
    shown
}

// ─── Resolved Options ───────────────────────────────────────────

/// Fully resolved options for one request.
#[derive(Clone)]
pub struct AuthOptions {
    pub settings: AuthSettings,
    /// Persistence binding for users and sessions.
    pub adapter: Arc<dyn Adapter>,
    pub callbacks: Callbacks,
}

impl fmt::Debug for AuthOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthOptions")
            .field("settings", &self.settings)
            .field("adapter", &self.adapter)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

impl AuthOptions {
    /// Type a merged layer and attach the adapter.
    pub fn from_layer(layer: OptionsLayer, adapter: Arc<dyn Adapter>) -> Result<Self> {
        let settings: AuthSettings = serde_json::from_value(layer.settings).map_err(|e| {
            warn!(error = %e, "merged auth options do not type-check");
            AuthError::Config(format!("invalid auth options: {e}"))
        })?;
        settings.session.validate()?;
        Ok(Self {
            settings,
            adapter,
            callbacks: layer.callbacks,
        })
    }

    /// Name of the cookie carrying the session token.
    pub fn session_cookie_name(&self) -> String {
        if let Some(cookie) = &self.settings.cookies.session_token {
            return cookie.name.clone();
        }
        if self.settings.use_secure_cookies {
            format!("__Secure-{SESSION_TOKEN_COOKIE}")
        } else {
            SESSION_TOKEN_COOKIE.to_string()
        }
    }
}

/// The serializable part of the options.
///
/// Unrecognized keys are kept in `extra` so a layer may carry settings this
/// crate does not interpret (e.g. `theme`).
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSettings {
    /// Secret used to sign cookies and tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Canonical URL of the site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Path prefix of the auth routes (default: "/api/auth").
    #[serde(default = "default_base_path")]
    pub base_path: String,

    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub session: SessionOptions,

    #[serde(default)]
    pub pages: PagesOptions,

    #[serde(default)]
    pub providers: Vec<ProviderOptions>,

    /// Use `__Secure-` prefixed cookies.
    #[serde(default)]
    pub use_secure_cookies: bool,

    #[serde(default)]
    pub cookies: CookiesOptions,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

fn default_base_path() -> String {
    "/api/auth".to_string()
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            secret: None,
            url: None,
            base_path: default_base_path(),
            debug: false,
            session: SessionOptions::default(),
            pages: PagesOptions::default(),
            providers: Vec::new(),
            use_secure_cookies: false,
            cookies: CookiesOptions::default(),
            extra: serde_json::Map::new(),
        }
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("url", &self.url)
            .field("base_path", &self.base_path)
            .field("debug", &self.debug)
            .field("session", &self.session)
            .field("pages", &self.pages)
            .field("providers", &self.providers)
            .field("use_secure_cookies", &self.use_secure_cookies)
            .field("cookies", &self.cookies)
            .field("extra", &self.extra)
            .finish()
    }
}

impl AuthSettings {
    pub fn provider(&self, id: &str) -> Option<&ProviderOptions> {
        self.providers.iter().find(|p| p.id == id)
    }
}

// ─── Session Options ─────────────────────────────────────────────

/// Where sessions live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStrategy {
    #[default]
    Database,
    Jwt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOptions {
    #[serde(default)]
    pub strategy: SessionStrategy,

    /// Session lifetime in seconds (default: 30 days).
    #[serde(default = "default_max_age")]
    pub max_age: u64,

    /// How often the expiry is extended, in seconds (default: 1 day).
    #[serde(default = "default_update_age")]
    pub update_age: u64,
}

fn default_max_age() -> u64 {
    30 * 24 * 60 * 60
}

fn default_update_age() -> u64 {
    24 * 60 * 60
}

impl SessionOptions {
    /// `max_age` as a duration, when it fits chrono's range.
    pub fn max_age_delta(&self) -> Option<TimeDelta> {
        seconds(self.max_age)
    }

    /// `update_age` as a duration, when it fits chrono's range.
    pub fn update_age_delta(&self) -> Option<TimeDelta> {
        seconds(self.update_age)
    }

    /// Both ages must be representable, and a session created now must have
    /// a representable expiry.
    pub fn validate(&self) -> Result<()> {
        let expiry = self
            .max_age_delta()
            .and_then(|max_age| Utc::now().checked_add_signed(max_age));
        if expiry.is_none() {
            warn!(max_age = self.max_age, "session maxAge out of range");
            return Err(AuthError::Config(format!(
                "session.maxAge out of range: {}",
                self.max_age
            )));
        }
        if self.update_age_delta().is_none() {
            warn!(update_age = self.update_age, "session updateAge out of range");
            return Err(AuthError::Config(format!(
                "session.updateAge out of range: {}",
                self.update_age
            )));
        }
        Ok(())
    }
}

fn seconds(secs: u64) -> Option<TimeDelta> {
    i64::try_from(secs).ok().and_then(TimeDelta::try_seconds)
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            strategy: SessionStrategy::default(),
            max_age: default_max_age(),
            update_age: default_update_age(),
        }
    }
}

// ─── Pages ───────────────────────────────────────────────────────

/// Custom page paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagesOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_out: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_user: Option<String>,
}

// ─── Providers ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Oauth,
    Credentials,
    Email,
}

/// A sign-in provider entry.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOptions {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: ProviderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Provider-specific settings.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl fmt::Debug for ProviderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderOptions")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("extra", &self.extra)
            .finish()
    }
}

impl ProviderOptions {
    pub fn oauth(
        id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            kind: ProviderKind::Oauth,
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            extra: serde_json::Map::new(),
        }
    }

    pub fn credentials(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            kind: ProviderKind::Credentials,
            client_id: None,
            client_secret: None,
            extra: serde_json::Map::new(),
        }
    }
}

// ─── Cookies ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookiesOptions {
    /// Override for the session-token cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<CookieOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieOption {
    pub name: String,
    #[serde(default)]
    pub options: serde_json::Map<String, Value>,
}
