//! Option resolution and session augmentation through the public API.
//!
//! Covers: stage selection, shared adapter identity, production merge,
//! production options from environment variables, latest-token augmentation.

mod resolution {
    use std::collections::HashMap;
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use http::{HeaderMap, Request};
    use serde_json::json;

    use session_auth::{
        AuthContext, LocalDevelopmentOptions, OptionResolver, ProductionOptions, RequestContext,
        SharedOptions,
    };
    use session_auth_core::db::models::{SESSION_MODEL, USER_MODEL};
    use session_auth_core::env::stage_from_vars;
    use session_auth_core::{Adapter, DeploymentStage, OptionsLayer};
    use session_auth_memory::MemoryAdapter;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn resolver_for(vars: &[(&str, &str)], adapter: Arc<dyn Adapter>) -> OptionResolver {
        let lookup = env(vars);
        let stage = stage_from_vars(&lookup);
        let production = ProductionOptions::from_lookup(&lookup).unwrap().into_variant();
        OptionResolver::new(
            stage,
            SharedOptions::standard(adapter).with_layer(
                OptionsLayer::new()
                    .set("pages.signIn", "/login")
                    .set("theme.colorScheme", "light"),
            ),
            Arc::new(LocalDevelopmentOptions::default()),
            Arc::new(production),
        )
    }

    // ── Stage selection ─────────────────────────────────────────────

    #[test]
    fn development_stage_uses_request_host_and_shared_adapter() {
        let adapter: Arc<dyn Adapter> = Arc::new(MemoryAdapter::new());
        let resolver = resolver_for(&[("SESSION_AUTH_ENV", "development")], adapter.clone());
        assert_eq!(resolver.stage(), DeploymentStage::Development);

        let request = Request::get("/").header("host", "dev.local:8080").body(()).unwrap();
        let mut res = HeaderMap::new();
        let options = resolver.resolve(&RequestContext::from_request(&request), &mut res).unwrap();

        assert!(Arc::ptr_eq(&options.adapter, &adapter));
        assert_eq!(options.settings.url.as_deref(), Some("http://dev.local:8080"));
        assert_eq!(options.settings.pages.sign_in.as_deref(), Some("/login"));
        assert_eq!(options.settings.extra["theme"], json!({"colorScheme": "light"}));
    }

    #[test]
    fn production_stage_overrides_shared_scalars() {
        let adapter: Arc<dyn Adapter> = Arc::new(MemoryAdapter::new());
        let resolver = resolver_for(
            &[
                ("VERCEL_ENV", "production"),
                ("AUTH_SECRET", "prod-secret"),
                ("AUTH_URL", "https://app.example.com"),
                ("AUTH_PROVIDERS", "github"),
                ("AUTH_GITHUB_CLIENT_ID", "id"),
                ("AUTH_GITHUB_CLIENT_SECRET", "secret"),
            ],
            adapter.clone(),
        );
        assert_eq!(resolver.stage(), DeploymentStage::Production);

        let request = Request::get("/").header("host", "ignored.example").body(()).unwrap();
        let mut res = HeaderMap::new();
        let options = resolver.resolve(&RequestContext::from_request(&request), &mut res).unwrap();

        assert_eq!(options.settings.url.as_deref(), Some("https://app.example.com"));
        assert_eq!(options.settings.secret.as_deref(), Some("prod-secret"));
        assert!(options.settings.use_secure_cookies);
        assert!(options.settings.provider("github").is_some());
        assert_eq!(options.settings.pages.sign_in.as_deref(), Some("/login"));
        assert_eq!(options.session_cookie_name(), "__Secure-next-auth.session-token");
        assert!(Arc::ptr_eq(&options.adapter, &adapter));
        assert!(res.is_empty());
    }

    #[test]
    fn unset_stage_is_production() {
        let adapter: Arc<dyn Adapter> = Arc::new(MemoryAdapter::new());
        let resolver = resolver_for(&[], adapter);
        assert_eq!(resolver.stage(), DeploymentStage::Production);
        assert!(format!("{:?}", resolver.strategy()).contains("FixedOptions"));
    }

    // ── Augmentation ────────────────────────────────────────────────

    #[tokio::test]
    async fn server_session_carries_latest_token() {
        let memory = MemoryAdapter::new();
        memory
            .create(USER_MODEL, json!({"id": "u-9", "email": "grace@example.com"}))
            .await
            .unwrap();
        let t1 = Utc::now() + Duration::days(29) + Duration::hours(12);
        let t2 = t1 + Duration::hours(1);
        for (token, expires) in [("t2-token", t2), ("t1-token", t1)] {
            memory
                .create(
                    SESSION_MODEL,
                    json!({"sessionToken": token, "userId": "u-9", "expires": expires.to_rfc3339()}),
                )
                .await
                .unwrap();
        }

        let ctx = AuthContext::for_stage(DeploymentStage::Development, Arc::new(memory)).unwrap();
        let request = Request::get("/api/auth/session")
            .header("authorization", "Bearer t1-token")
            .body(())
            .unwrap();
        let mut res = HeaderMap::new();
        let session = ctx
            .get_server_session(&RequestContext::from_request(&request), &mut res)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(session.user.as_ref().unwrap().id.as_deref(), Some("u-9"));
        assert_eq!(session.access_token.as_deref(), Some("t2-token"));
        assert_eq!(session.expires.timestamp(), t1.timestamp());
    }
}
