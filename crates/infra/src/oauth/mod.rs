//! OAuth machinery: the loopback callback server used by the interactive
//! PKCE login flow, and the per-service [`tsic_core::ports::CredentialRefresher`]
//! implementations used for steady-state token refresh.

pub mod loopback;
pub mod refreshers;

pub use loopback::OAuthCallbackServer;
pub use refreshers::{AppInstallationRefresher, OAuthTokenRefresher};
