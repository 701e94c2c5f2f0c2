// Deployment-stage detection and logger setup.

use std::fmt;
use std::sync::OnceLock;

/// Cached deployment stage for this process.
static STAGE: OnceLock<DeploymentStage> = OnceLock::new();

/// Variables consulted for the deployment stage, in priority order.
pub const STAGE_ENV_VARS: [&str; 4] = [
    "SESSION_AUTH_ENV",
    "VERCEL_ENV",
    "NEXT_PUBLIC_VERCEL_ENV",
    "RUST_ENV",
];

/// Which deployment the process is running in.
///
/// Only `Development` selects the per-request development options; every
/// other stage uses the fixed production options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentStage {
    Development,
    Preview,
    Production,
}

impl DeploymentStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Preview => "preview",
            Self::Production => "production",
        }
    }

    pub fn is_development(&self) -> bool {
        *self == Self::Development
    }
}

/// Exact, case-sensitive match: only `"development"` selects the
/// development options.
impl From<&str> for DeploymentStage {
    fn from(s: &str) -> Self {
        match s {
            "development" => Self::Development,
            "preview" => Self::Preview,
            _ => Self::Production,
        }
    }
}

impl fmt::Display for DeploymentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the stage from a variable lookup. The first variable in
/// [`STAGE_ENV_VARS`] that is set wins; none set means production.
pub fn stage_from_vars<F>(lookup: F) -> DeploymentStage
where
    F: Fn(&str) -> Option<String>,
{
    STAGE_ENV_VARS
        .iter()
        .find_map(|name| lookup(name))
        .map(|value| DeploymentStage::from(value.as_str()))
        .unwrap_or(DeploymentStage::Production)
}

/// Detect the deployment stage from the process environment.
/// Read once; later calls return the cached value.
pub fn detect_stage() -> DeploymentStage {
    *STAGE.get_or_init(|| stage_from_vars(|name| std::env::var(name).ok()))
}

/// Initialize the `tracing` subscriber.
/// `RUST_LOG` takes precedence; otherwise production logs at info and
/// every other stage at debug.
pub fn init_logger() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if detect_stage() == DeploymentStage::Production {
            EnvFilter::new("session_auth=info")
        } else {
            EnvFilter::new("session_auth=debug")
        }
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .try_init();
}
