//! Axum integration for session-auth.
//!
//! Mounts `GET {base_path}/session` and provides the [`ServerSession`]
//! extractor for page handlers.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use session_auth::{AuthContext, RequestContext};
use session_auth_core::{AuthError, AuthSession};

/// Default mount point for the auth routes.
pub const DEFAULT_BASE_PATH: &str = "/api/auth";

// ─── Error Handling ──────────────────────────────────────────────

/// An [`AuthError`] rendered as an HTTP response.
///
/// Body shape: `{"error": {"message", "code", "status"}}`.
#[derive(Debug)]
pub struct AuthErrorResponse(pub AuthError);

impl From<AuthError> for AuthErrorResponse {
    fn from(e: AuthError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AuthErrorResponse {
    fn into_response(self) -> Response {
        let api = self.0.to_api_error();
        let status = StatusCode::from_u16(api.status.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "auth request failed");
        }

        (status, Json(api.to_json())).into_response()
    }
}

// ─── Extractor ───────────────────────────────────────────────────

/// The session of the current request, fetched through the shared
/// [`AuthContext`].
///
/// `headers` holds what the session flow wants set on the response
/// (refreshed or cleared cookies, the stage marker); return it alongside the
/// handler's body to apply it.
#[derive(Debug)]
pub struct ServerSession {
    pub session: Option<AuthSession>,
    pub headers: HeaderMap,
}

impl<S> FromRequestParts<S> for ServerSession
where
    Arc<AuthContext>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthErrorResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = Arc::<AuthContext>::from_ref(state);
        let mut headers = HeaderMap::new();
        let session = ctx
            .get_server_session(&RequestContext::from_parts(parts), &mut headers)
            .await?;
        Ok(Self { session, headers })
    }
}

// ─── Router ──────────────────────────────────────────────────────

/// Main entry point for the Axum integration.
///
/// ```rust,ignore
/// let ctx = AuthContext::from_env(adapter)?;
/// let app = axum::Router::new().merge(SessionAuth::new(ctx).router());
/// ```
#[derive(Debug, Clone)]
pub struct SessionAuth {
    ctx: Arc<AuthContext>,
    base_path: String,
}

impl SessionAuth {
    pub fn new(ctx: Arc<AuthContext>) -> Self {
        Self {
            ctx,
            base_path: DEFAULT_BASE_PATH.to_string(),
        }
    }

    /// Mount the routes somewhere other than `/api/auth`.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn context(&self) -> &Arc<AuthContext> {
        &self.ctx
    }

    /// Build the router, nested under the base path.
    ///
    /// A base path of `/` or `""` mounts the routes at the root.
    pub fn router(&self) -> Router {
        let auth_routes = Router::new()
            .route("/session", get(handle_get_session))
            .with_state(self.ctx.clone());

        // axum panics when nesting at "/"
        let base_path = self.base_path.trim_matches('/');
        if base_path.is_empty() {
            return auth_routes;
        }
        Router::new().nest(&format!("/{base_path}"), auth_routes)
    }

    /// Build the router with a permissive CORS layer.
    pub fn router_with_cors(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        self.router().layer(cors)
    }
}

async fn handle_get_session(ServerSession { session, headers }: ServerSession) -> impl IntoResponse {
    (headers, Json(session))
}
