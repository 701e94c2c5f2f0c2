// Option resolution — picks the variant for the deployment stage and layers
// it over the shared base.

use std::fmt;
use std::sync::Arc;

use http::HeaderMap;
use tracing::debug;

use session_auth_core::callbacks::SessionCallback;
use session_auth_core::env::DeploymentStage;
use session_auth_core::error::Result;
use session_auth_core::options::{AuthOptions, OptionsLayer};
use session_auth_core::Adapter;

use crate::augment::LatestSessionToken;
use crate::request::RequestContext;

/// Produces the stage-specific option layer for one request.
///
/// `res` holds headers to add to the outgoing response.
pub trait VariantOptions: Send + Sync + fmt::Debug {
    fn options(
        &self,
        adapter: &Arc<dyn Adapter>,
        req: &RequestContext<'_>,
        res: &mut HeaderMap,
    ) -> Result<OptionsLayer>;
}

/// Options common to every stage. Owns the adapter, so every resolved
/// configuration carries this exact adapter instance.
#[derive(Debug, Clone)]
pub struct SharedOptions {
    adapter: Arc<dyn Adapter>,
    layer: OptionsLayer,
}

impl SharedOptions {
    pub fn new(adapter: Arc<dyn Adapter>) -> Self {
        Self {
            adapter,
            layer: OptionsLayer::new(),
        }
    }

    /// Shared options with the session callback that stamps the user id and
    /// the latest session token onto every session.
    pub fn standard(adapter: Arc<dyn Adapter>) -> Self {
        let callback: Arc<dyn SessionCallback> = Arc::new(LatestSessionToken::new(adapter.clone()));
        Self::new(adapter).with_layer(OptionsLayer::new().session_callback(callback))
    }

    pub fn with_layer(mut self, layer: OptionsLayer) -> Self {
        self.layer = layer;
        self
    }

    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.adapter
    }

    pub fn layer(&self) -> &OptionsLayer {
        &self.layer
    }
}

/// Stage-keyed selector between the development and production variants.
#[derive(Debug, Clone)]
pub struct OptionResolver {
    stage: DeploymentStage,
    shared: SharedOptions,
    development: Arc<dyn VariantOptions>,
    production: Arc<dyn VariantOptions>,
}

impl OptionResolver {
    pub fn new(
        stage: DeploymentStage,
        shared: SharedOptions,
        development: Arc<dyn VariantOptions>,
        production: Arc<dyn VariantOptions>,
    ) -> Self {
        Self {
            stage,
            shared,
            development,
            production,
        }
    }

    pub fn stage(&self) -> DeploymentStage {
        self.stage
    }

    pub fn shared(&self) -> &SharedOptions {
        &self.shared
    }

    /// The variant strategy for the configured stage.
    pub fn strategy(&self) -> &dyn VariantOptions {
        match self.stage {
            DeploymentStage::Development => self.development.as_ref(),
            DeploymentStage::Preview | DeploymentStage::Production => self.production.as_ref(),
        }
    }

    /// Resolve the options for one request: `merge(shared, variant)`, with
    /// the variant winning on conflicting leaves.
    pub fn resolve(&self, req: &RequestContext<'_>, res: &mut HeaderMap) -> Result<AuthOptions> {
        let variant = self.strategy().options(self.shared.adapter(), req, res)?;
        let merged = self.shared.layer().merge(&variant);
        debug!(stage = %self.stage, path = %req.uri.path(), "resolved auth options");
        AuthOptions::from_layer(merged, self.shared.adapter().clone())
    }
}
