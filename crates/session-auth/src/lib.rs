// session-auth — main library crate
//
// Wires the stage-aware option resolver, the session augmenter and the
// server-side session fetch together behind `AuthContext`.

pub mod augment;
pub mod context;
pub mod cookies;
pub mod request;
pub mod resolver;
pub mod session;
pub mod variants;

pub use augment::LatestSessionToken;
pub use context::AuthContext;
pub use request::RequestContext;
pub use resolver::{OptionResolver, SharedOptions, VariantOptions};
pub use session::get_server_session;
pub use variants::{FixedOptions, LocalDevelopmentOptions, ProductionOptions};
