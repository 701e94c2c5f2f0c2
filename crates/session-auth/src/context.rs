// Auth context — the resolver plus the two request-facing entry points.
//
// Built once at startup and shared across request handlers as Arc<AuthContext>.

use std::sync::Arc;

use http::HeaderMap;
use tracing::info;

use session_auth_core::env::{detect_stage, DeploymentStage};
use session_auth_core::error::Result;
use session_auth_core::{Adapter, AuthOptions, AuthSession};

use crate::request::RequestContext;
use crate::resolver::{OptionResolver, SharedOptions};
use crate::session;
use crate::variants::{FixedOptions, LocalDevelopmentOptions, ProductionOptions};

/// Shared, fully-initialized auth state.
#[derive(Debug)]
pub struct AuthContext {
    resolver: OptionResolver,
}

impl AuthContext {
    pub fn new(resolver: OptionResolver) -> Arc<Self> {
        Arc::new(Self { resolver })
    }

    /// Context for the stage detected from the environment.
    ///
    /// Production options are read from the environment only when the stage
    /// is not development, so a local setup needs no provider credentials.
    pub fn from_env(adapter: Arc<dyn Adapter>) -> Result<Arc<Self>> {
        Self::for_stage(detect_stage(), adapter)
    }

    /// Context for an explicit stage, with the standard shared options.
    pub fn for_stage(stage: DeploymentStage, adapter: Arc<dyn Adapter>) -> Result<Arc<Self>> {
        let production = if stage.is_development() {
            FixedOptions::default()
        } else {
            ProductionOptions::from_env()?.into_variant()
        };

        info!(%stage, "initializing session auth");
        Ok(Self::new(OptionResolver::new(
            stage,
            SharedOptions::standard(adapter),
            Arc::new(LocalDevelopmentOptions::default()),
            Arc::new(production),
        )))
    }

    pub fn resolver(&self) -> &OptionResolver {
        &self.resolver
    }

    /// `(request, response) -> options`.
    pub fn auth_options(&self, req: &RequestContext<'_>, res: &mut HeaderMap) -> Result<AuthOptions> {
        self.resolver.resolve(req, res)
    }

    /// `(request, response) -> session`: resolve the options for this request
    /// and fetch its session.
    pub async fn get_server_session(
        &self,
        req: &RequestContext<'_>,
        res: &mut HeaderMap,
    ) -> Result<Option<AuthSession>> {
        let options = self.auth_options(req, res)?;
        session::get_server_session(&options, req.headers, res).await
    }
}
