// Stage variants — the development and production option providers.

use std::sync::Arc;

use http::{HeaderMap, HeaderName, HeaderValue};
use tracing::warn;

use session_auth_core::error::{AuthError, Result};
use session_auth_core::options::{OptionsLayer, ProviderOptions};
use session_auth_core::Adapter;

use crate::request::RequestContext;
use crate::resolver::VariantOptions;

/// Response header naming the stage that served the request.
pub const STAGE_HEADER: &str = "x-auth-stage";

/// Provider list environment variable for production.
pub const PROVIDERS_ENV: &str = "AUTH_PROVIDERS";

// ─── Fixed ──────────────────────────────────────────────────────

/// A pre-built layer returned unchanged for every request.
#[derive(Debug, Clone, Default)]
pub struct FixedOptions(OptionsLayer);

impl FixedOptions {
    pub fn new(layer: OptionsLayer) -> Self {
        Self(layer)
    }

    pub fn layer(&self) -> &OptionsLayer {
        &self.0
    }
}

impl VariantOptions for FixedOptions {
    fn options(
        &self,
        _adapter: &Arc<dyn Adapter>,
        _req: &RequestContext<'_>,
        _res: &mut HeaderMap,
    ) -> Result<OptionsLayer> {
        Ok(self.0.clone())
    }
}

// ─── Development ────────────────────────────────────────────────

/// Options for local development.
///
/// Signs in through a single credentials provider, serves insecure cookies
/// and points `url` at whatever host the request came in on.
#[derive(Debug, Clone)]
pub struct LocalDevelopmentOptions {
    provider_id: String,
    provider_name: String,
}

impl Default for LocalDevelopmentOptions {
    fn default() -> Self {
        Self {
            provider_id: "local".into(),
            provider_name: "Local".into(),
        }
    }
}

impl LocalDevelopmentOptions {
    pub fn with_provider(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            provider_id: id.into(),
            provider_name: name.into(),
        }
    }
}

impl VariantOptions for LocalDevelopmentOptions {
    // The adapter is the shared one; credentials sign-in is handled elsewhere.
    fn options(
        &self,
        _adapter: &Arc<dyn Adapter>,
        req: &RequestContext<'_>,
        res: &mut HeaderMap,
    ) -> Result<OptionsLayer> {
        let mut layer = OptionsLayer::new()
            .set("debug", true)
            .set("useSecureCookies", false)
            .set("session.strategy", "database")
            .provider(ProviderOptions::credentials(
                self.provider_id.as_str(),
                self.provider_name.as_str(),
            ));

        if let Some(host) = req.host() {
            layer = layer.set("url", format!("http://{host}"));
        }

        res.insert(HeaderName::from_static(STAGE_HEADER), HeaderValue::from_static("development"));
        Ok(layer)
    }
}

// ─── Production ─────────────────────────────────────────────────

/// Production options read from the environment.
///
/// `AUTH_PROVIDERS` is a comma-separated list of OAuth provider ids; each
/// id reads `AUTH_{ID}_CLIENT_ID` and `AUTH_{ID}_CLIENT_SECRET`.
#[derive(Debug, Clone, Default)]
pub struct ProductionOptions {
    pub secret: Option<String>,
    pub url: Option<String>,
    pub providers: Vec<ProviderOptions>,
}

impl ProductionOptions {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret = non_empty("AUTH_SECRET").or_else(|| non_empty("NEXTAUTH_SECRET"));
        let url = non_empty("AUTH_URL").or_else(|| non_empty("NEXTAUTH_URL"));

        let mut providers = Vec::new();
        for id in non_empty(PROVIDERS_ENV)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            let prefix = format!("AUTH_{}", id.to_uppercase().replace('-', "_"));
            let client_id = non_empty(&format!("{prefix}_CLIENT_ID"))
                .ok_or_else(|| AuthError::Config(format!("{prefix}_CLIENT_ID is not set")))?;
            let client_secret = non_empty(&format!("{prefix}_CLIENT_SECRET"))
                .ok_or_else(|| AuthError::Config(format!("{prefix}_CLIENT_SECRET is not set")))?;
            providers.push(ProviderOptions::oauth(id, client_id, client_secret));
        }

        Ok(Self {
            secret,
            url,
            providers,
        })
    }

    /// The production layer: secure cookies, no debug output.
    pub fn into_layer(self) -> OptionsLayer {
        if self.secret.is_none() {
            warn!("no AUTH_SECRET set for production options");
        }

        let mut layer = OptionsLayer::new()
            .set("debug", false)
            .set("useSecureCookies", true);
        if let Some(secret) = self.secret {
            layer = layer.set("secret", secret);
        }
        if let Some(url) = self.url {
            layer = layer.set("url", url);
        }
        self.providers
            .into_iter()
            .fold(layer, |layer, provider| layer.provider(provider))
    }

    pub fn into_variant(self) -> FixedOptions {
        FixedOptions::new(self.into_layer())
    }
}
